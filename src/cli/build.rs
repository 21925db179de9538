//! Function for building the command line hierarchy.

use super::{grid::create_grid_subcommand, reconstruct::create_reconstruct_subcommand};
use clap::{self, Arg, Command};

/// Build the `crspectrum` command line hierarchy.
pub fn build() -> Command<'static> {
    Command::new(clap::crate_name!())
        .version(clap::crate_version!())
        .author(clap::crate_authors!())
        .about(clap::crate_description!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .disable_help_subcommand(true)
        .arg(
            Arg::new("timing")
                .short('t')
                .long("timing")
                .help("Display elapsed time when done"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .multiple_occurrences(true)
                .global(true)
                .help(
                    "Print status messages for each spectrum\n\
                     (repeat to also write diagnostics records)",
                ),
        )
        .subcommand(create_reconstruct_subcommand())
        .subcommand(create_grid_subcommand())
}
