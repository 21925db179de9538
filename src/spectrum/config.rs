//! Configuration of spectrum reconstruction.

use super::{fcr, grid::MomentumGrid, SlopeSolvingMode};
use crate::{constants::C_CODE, io::utils, species::ParticleSpecies};
use lazy_static::lazy_static;
use regex::Regex;
use std::{
    io,
    path::{Path, PathBuf},
    str::FromStr,
};

lazy_static! {
    static ref PARAMETER_REGEX: Regex = Regex::new(r"(?m)^\s*([_\w]+)\s*=\s*(.+?)\s*$").unwrap();
}

/// Configuration parameters for spectrum reconstruction.
#[derive(Clone, Debug, PartialEq)]
pub struct SpectrumReconstructionConfig {
    /// Number of momentum bins (`ncrb`).
    pub n_bins: usize,
    /// Lowest interior edge of the momentum grid.
    pub p_min_fix: fcr,
    /// Highest interior edge of the momentum grid.
    pub p_max_fix: fcr,
    /// Lower edge of the first momentum bin.
    pub p_lo_init: fcr,
    /// Upper edge of the last momentum bin.
    pub p_up_init: fcr,
    /// Spectral slopes are confined to `[-q_big, q_big]`.
    pub q_big: fcr,
    /// Number of samples in the slope tables.
    pub arr_dim_q: usize,
    /// Energy density floor used at the spectrum cutoffs.
    pub e_small: fcr,
    /// Speed of light in code units.
    pub c: fcr,
    /// Species of the cosmic-ray particles, if any.
    pub species: Option<ParticleSpecies>,
    /// Whether to account for the rest mass of the particles.
    pub transrelativistic: bool,
    /// How to obtain the spectral slope of each bin.
    pub slope_mode: SlopeSolvingMode,
    /// Whether to replace the outermost bin edges with interpolated cutoffs.
    pub interpolate_cutoffs: bool,
    /// File to append diagnostics records to.
    pub diagnostics_file: PathBuf,
}

impl SpectrumReconstructionConfig {
    pub const DEFAULT_N_BINS: usize = 45;
    pub const DEFAULT_P_MIN_FIX: fcr = 1e-2;
    pub const DEFAULT_P_MAX_FIX: fcr = 1e2;
    pub const DEFAULT_P_LO_INIT: fcr = 1e-3;
    pub const DEFAULT_P_UP_INIT: fcr = 1e7;
    pub const DEFAULT_Q_BIG: fcr = 20.0;
    pub const DEFAULT_ARR_DIM_Q: usize = 1000;
    pub const DEFAULT_E_SMALL: fcr = 1e-6;
    pub const DEFAULT_C: fcr = C_CODE;
    pub const DEFAULT_TRANSRELATIVISTIC: bool = true;
    pub const DEFAULT_SLOPE_MODE: SlopeSolvingMode = SlopeSolvingMode::BinTable;
    pub const DEFAULT_INTERPOLATE_CUTOFFS: bool = false;
    pub const DEFAULT_DIAGNOSTICS_FILE: &str = "crs.dat";

    /// Names of all recognized parameters.
    pub const PARAMETER_NAMES: [&str; 14] = [
        "ncrb",
        "p_min_fix",
        "p_max_fix",
        "p_lo_init",
        "p_up_init",
        "q_big",
        "arr_dim_q",
        "e_small",
        "c",
        "species",
        "transrelativistic",
        "slope_mode",
        "interpolate_cutoffs",
        "diagnostics_file",
    ];

    /// Reads the parameter file at the given path and creates a configuration
    /// from its assignments, with defaults for parameters not present.
    pub fn from_param_file<P: AsRef<Path>>(param_file_path: P) -> io::Result<Self> {
        Self::from_param_text(&utils::read_text_file(param_file_path)?)
    }

    /// Creates a configuration from `name = value` assignments in the given
    /// text, with defaults for parameters not present.
    ///
    /// Fortran namelist group markers, `!` comments and `.true.`/`.false.`
    /// logicals are accepted. Unknown parameter names and values that can not
    /// be parsed into the type of the parameter give an error.
    pub fn from_param_text(text: &str) -> io::Result<Self> {
        let mut config = Self::default();
        for captures in PARAMETER_REGEX.captures_iter(text) {
            config.assign(&captures[1], strip_comment(&captures[2]))?;
        }
        Ok(config)
    }

    /// Sets the parameter with the given name from the given value string.
    pub fn assign(&mut self, name: &str, value: &str) -> io::Result<()> {
        match name {
            "ncrb" => self.n_bins = parse_param(name, value)?,
            "p_min_fix" => self.p_min_fix = parse_float_param(name, value)?,
            "p_max_fix" => self.p_max_fix = parse_float_param(name, value)?,
            "p_lo_init" => self.p_lo_init = parse_float_param(name, value)?,
            "p_up_init" => self.p_up_init = parse_float_param(name, value)?,
            "q_big" => self.q_big = parse_float_param(name, value)?,
            "arr_dim_q" => self.arr_dim_q = parse_param(name, value)?,
            "e_small" => self.e_small = parse_float_param(name, value)?,
            "c" => self.c = parse_float_param(name, value)?,
            "species" => self.species = Some(parse_param(name, value)?),
            "transrelativistic" => self.transrelativistic = parse_bool_param(name, value)?,
            "slope_mode" => self.slope_mode = parse_param(name, value)?,
            "interpolate_cutoffs" => self.interpolate_cutoffs = parse_bool_param(name, value)?,
            "diagnostics_file" => self.diagnostics_file = PathBuf::from(trim_quotes(value)),
            unknown => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Unknown parameter {}\nValid parameters are: {}",
                        unknown,
                        Self::PARAMETER_NAMES.join(", ")
                    ),
                ))
            }
        }
        Ok(())
    }

    /// Returns the rest mass to use for the particles, which is zero unless
    /// the computation is transrelativistic and a species is specified.
    pub fn particle_mass(&self) -> fcr {
        match (self.transrelativistic, self.species) {
            (true, Some(species)) => species.mass(),
            _ => 0.0,
        }
    }

    /// Constructs the momentum grid described by the configuration.
    pub fn build_momentum_grid(&self) -> MomentumGrid {
        MomentumGrid::new(
            self.n_bins,
            self.p_min_fix,
            self.p_max_fix,
            self.p_lo_init,
            self.p_up_init,
            self.particle_mass(),
            self.c,
        )
    }

    /// Panics if any of the configuration parameter values are invalid.
    pub fn validate(&self) {
        assert!(self.n_bins >= 3, "Number of bins must be at least three.");
        assert!(
            self.p_min_fix > 0.0 && self.p_max_fix > self.p_min_fix,
            "Fixed momentum bounds must satisfy 0 < p_min_fix < p_max_fix."
        );
        assert!(
            self.p_lo_init > 0.0 && self.p_lo_init < self.p_min_fix,
            "Lower initial cutoff must satisfy 0 < p_lo_init < p_min_fix."
        );
        assert!(
            self.p_up_init > self.p_max_fix,
            "Upper initial cutoff must be larger than p_max_fix."
        );
        assert!(self.q_big > 3.0, "Slope bound q_big must be larger than three.");
        assert!(
            self.arr_dim_q >= 200,
            "Number of slope table samples must be at least 200."
        );
        assert!(
            self.e_small > 0.0,
            "Energy density floor must be larger than zero."
        );
        assert!(self.c > 0.0, "Speed of light must be larger than zero.");
    }
}

impl Default for SpectrumReconstructionConfig {
    fn default() -> Self {
        SpectrumReconstructionConfig {
            n_bins: Self::DEFAULT_N_BINS,
            p_min_fix: Self::DEFAULT_P_MIN_FIX,
            p_max_fix: Self::DEFAULT_P_MAX_FIX,
            p_lo_init: Self::DEFAULT_P_LO_INIT,
            p_up_init: Self::DEFAULT_P_UP_INIT,
            q_big: Self::DEFAULT_Q_BIG,
            arr_dim_q: Self::DEFAULT_ARR_DIM_Q,
            e_small: Self::DEFAULT_E_SMALL,
            c: Self::DEFAULT_C,
            species: None,
            transrelativistic: Self::DEFAULT_TRANSRELATIVISTIC,
            slope_mode: Self::DEFAULT_SLOPE_MODE,
            interpolate_cutoffs: Self::DEFAULT_INTERPOLATE_CUTOFFS,
            diagnostics_file: PathBuf::from(Self::DEFAULT_DIAGNOSTICS_FILE),
        }
    }
}

fn strip_comment(value: &str) -> &str {
    let value = match value.find('!') {
        Some(idx) => value[..idx].trim_end(),
        None => value,
    };
    value.trim_end_matches(',')
}

fn trim_quotes(value: &str) -> &str {
    value.trim_matches(|c: char| c == '"' || c == '\'')
}

fn invalid_value_error<E: ToString>(name: &str, value: &str, err: E) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!(
            "Failed parsing value {} of parameter {}: {}",
            value,
            name,
            err.to_string()
        ),
    )
}

fn parse_param<T>(name: &str, value: &str) -> io::Result<T>
where
    T: FromStr,
    T::Err: ToString,
{
    trim_quotes(value)
        .parse::<T>()
        .map_err(|err| invalid_value_error(name, value, err))
}

/// Parses a float, also accepting Fortran double precision exponents (`1.0d-2`).
fn parse_float_param(name: &str, value: &str) -> io::Result<fcr> {
    value
        .replace(|c: char| c == 'd' || c == 'D', "e")
        .parse::<fcr>()
        .map_err(|err| invalid_value_error(name, value, err))
}

fn parse_bool_param(name: &str, value: &str) -> io::Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | ".true." | "t" | ".t." | "1" => Ok(true),
        "false" | ".false." | "f" | ".f." | "0" => Ok(false),
        _ => Err(invalid_value_error(
            name,
            value,
            "expected true or false",
        )),
    }
}
