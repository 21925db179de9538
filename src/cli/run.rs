//! Function for running the command line program.

use super::{build, grid::run_grid_subcommand, reconstruct::run_reconstruct_subcommand};
use crate::io::Verbosity;
use clap::ArgMatches;
use std::time::Instant;

/// Runs the `crspectrum` command line program.
pub fn run() {
    let command = build::build();
    run_with_args(command.get_matches());
}

/// Runs the `crspectrum` command line program with the given parsed arguments.
pub fn run_with_args(arguments: ArgMatches) {
    let verbosity = Verbosity::from_level(arguments.occurrences_of("verbose") as u32);

    let start_instant = Instant::now();

    if let Some(reconstruct_arguments) = arguments.subcommand_matches("reconstruct") {
        run_reconstruct_subcommand(reconstruct_arguments, verbosity);
    }
    if let Some(grid_arguments) = arguments.subcommand_matches("grid") {
        run_grid_subcommand(grid_arguments);
    }

    if arguments.is_present("timing") {
        println!("Elapsed time: {} s", start_instant.elapsed().as_secs_f64());
    }
}
