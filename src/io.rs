//! File input/output.

pub mod cells;
pub mod diagnostics;
pub mod utils;

/// How much non-critical status information to print.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    /// Print nothing.
    Quiet,
    /// Print status messages for each reconstructed spectrum.
    Messages,
    /// Print status messages and write diagnostics records.
    Diagnostics,
}

impl Verbosity {
    /// Creates a verbosity from a numerical level, where 0 is quiet
    /// and anything above 1 gives diagnostics.
    pub fn from_level(level: u32) -> Self {
        match level {
            0 => Self::Quiet,
            1 => Self::Messages,
            _ => Self::Diagnostics,
        }
    }

    pub fn print_messages(&self) -> bool {
        !matches!(self, Self::Quiet)
    }

    pub fn write_diagnostics(&self) -> bool {
        matches!(self, Self::Diagnostics)
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Self::Quiet
    }
}
