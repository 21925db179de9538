//! Command line interface.

pub mod build;
pub mod grid;
pub mod reconstruct;
pub mod run;
pub mod utils;
