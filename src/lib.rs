//! The `crspectrum` crate reconstructs piecewise power-law cosmic-ray spectra
//! from the binned number and energy density moments of a cosmic-ray
//! transport simulation.

pub mod constants;
pub mod io;
pub mod math;
pub mod species;
pub mod spectrum;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(not(feature = "for-testing"))]
#[macro_export]
macro_rules! exit_with_error {
    ($($print_arg:tt)*) => {{
        eprintln!($($print_arg)*);
        quit::with_code(1);
    }};
}

#[cfg(feature = "for-testing")]
#[macro_export]
macro_rules! exit_with_error {
    ($($print_arg:tt)*) => {{
        panic!($($print_arg)*);
    }};
}

#[macro_export]
macro_rules! exit_on_error {
    ($result:expr, $($print_arg:tt)*) => {
        match $result {
            Ok(value) => value,
            Err(err) => {
                $crate::exit_with_error!($($print_arg)*, err)
            }
        }
    };
}
