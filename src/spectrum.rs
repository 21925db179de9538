//! Reconstruction of piecewise power-law cosmic-ray spectra.
//!
//! Within each bin of a fixed logarithmic momentum grid the distribution
//! function is assumed to be a power law `f(p) = f_l*(p/p_l)^(-q)`. Given the
//! number density `n` and energy density `e` of a bin, the slope `q` follows
//! from the moment ratio `e/(n*T_l)`, where `T_l` is the kinetic energy at the
//! left bin edge, and the normalization `f_l` then follows from `n` and `q`.

pub mod boundary;
pub mod config;
pub mod detection;
pub mod engine;
pub mod grid;
pub mod power_law;
pub mod root_finding;
pub mod table;

use std::{fmt, io, str::FromStr};

/// Floating-point precision to use for spectrum reconstruction.
#[allow(non_camel_case_types)]
pub type fcr = f64;

/// Strategy for obtaining the spectral slope of a bin from its moment ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlopeSolvingMode {
    /// Solve for the slope with Newton-Raphson iteration in every call.
    RootFinding,
    /// Interpolate in a table of moment ratios precomputed for each bin.
    BinTable,
    /// Interpolate in a single slope table over the moment ratio axis,
    /// computed for a representative bin geometry.
    RatioTable,
}

impl SlopeSolvingMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RootFinding => "root_finding",
            Self::BinTable => "bin_table",
            Self::RatioTable => "ratio_table",
        }
    }
}

impl FromStr for SlopeSolvingMode {
    type Err = io::Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "root_finding" => Ok(Self::RootFinding),
            "bin_table" => Ok(Self::BinTable),
            "ratio_table" => Ok(Self::RatioTable),
            invalid => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Invalid slope solving mode {}\n\
                     Valid modes are: root_finding, bin_table, ratio_table",
                    invalid
                ),
            )),
        }
    }
}

impl fmt::Display for SlopeSolvingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
