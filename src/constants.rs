//! Physical and mathematical constants in simulation code units.

/// Floating-point precision to use for constants.
#[allow(non_camel_case_types)]
pub type fcn = f64;

// Mathematical constants

pub const PI: fcn = std::f64::consts::PI;

// Physical constants

/// Speed of light in code units.
pub const C_CODE: fcn = 1.0;

/// Electron rest mass in units of the proton mass.
pub const M_ELECTRON: fcn = 5.446_300_222_286_791e-4;
/// Proton rest mass in units of the proton mass.
pub const M_PROTON: fcn = 1.0;
/// Lithium-7 rest mass in units of the proton mass.
pub const M_LI7: fcn = 7.0;
/// Beryllium-9 rest mass in units of the proton mass.
pub const M_BE9: fcn = 9.0;
/// Beryllium-10 rest mass in units of the proton mass.
pub const M_BE10: fcn = 10.0;
/// Boron-10 rest mass in units of the proton mass.
pub const M_B10: fcn = 10.0;
/// Boron-11 rest mass in units of the proton mass.
pub const M_B11: fcn = 11.0;
/// Carbon-12 rest mass in units of the proton mass.
pub const M_C12: fcn = 12.0;
/// Oxygen-16 rest mass in units of the proton mass.
pub const M_O16: fcn = 16.0;
