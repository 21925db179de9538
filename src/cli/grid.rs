//! Command line interface for inspecting the momentum grid.

use super::utils;
use clap::{ArgMatches, Command};

/// Builds a representation of the `grid` command line subcommand.
pub fn create_grid_subcommand() -> Command<'static> {
    utils::add_config_arguments(
        Command::new("grid").about("Print the momentum bins used for reconstruction"),
    )
}

/// Runs the actions for the `grid` subcommand using the given arguments.
pub fn run_grid_subcommand(arguments: &ArgMatches) {
    let config = utils::construct_config_from_options(arguments);
    let grid = config.build_momentum_grid();

    println!(
        "{} bins, interior momentum ratio {:.6}, particle mass {:e}",
        grid.n_bins(),
        grid.p_fix_ratio(),
        grid.mass()
    );
    println!(
        "{:>4} {:>11} {:>11} {:>11} {:>11} {:>8}",
        "bin", "p_l", "p_r", "T_l", "T_r", "s"
    );
    for bin_idx in 0..grid.n_bins() {
        let (p_l, p_r) = grid.bin_edges(bin_idx);
        let (g_l, g_r) = grid.bin_edge_energies(bin_idx);
        println!(
            "{:>4} {:>11.4e} {:>11.4e} {:>11.4e} {:>11.4e} {:>8.5}",
            bin_idx,
            p_l,
            p_r,
            g_l,
            g_r,
            grid.log_slopes()[bin_idx]
        );
    }
}
