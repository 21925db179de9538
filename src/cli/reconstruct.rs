//! Command line interface for reconstructing spectra.

use super::utils;
use crate::{
    exit_on_error,
    io::{cells, Verbosity},
    spectrum::{
        config::SpectrumReconstructionConfig,
        engine::{CellContext, ReconstructionEngine},
        power_law::ReconstructedSpectrum,
    },
};
use clap::{Arg, ArgMatches, Command};

#[cfg(feature = "json")]
use serde::Serialize;

#[cfg(feature = "json")]
use crate::io::utils::save_data_as_json;

/// Builds a representation of the `reconstruct` command line subcommand.
pub fn create_reconstruct_subcommand() -> Command<'static> {
    let command = Command::new("reconstruct")
        .about("Reconstruct spectra from binned number and energy densities")
        .arg(
            Arg::new("cells-file")
                .value_name("CELLS_FILE")
                .help(
                    "Path to text file with one cell per line, formatted as\n\
                     `time [x y z] n_0 .. n_{ncrb-1} e_0 .. e_{ncrb-1}`",
                )
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::new("diagnostics-file")
                .long("diagnostics-file")
                .require_equals(true)
                .value_name("FILE")
                .help("Path of file to write diagnostics records to [default: from param file]")
                .takes_value(true),
        );

    #[cfg(feature = "json")]
    let command = command.arg(
        Arg::new("output-file")
            .short('o')
            .long("output")
            .require_equals(true)
            .value_name("FILE")
            .help("Save the reconstructed spectra as JSON to this path instead of printing them")
            .takes_value(true),
    );

    utils::add_config_arguments(command)
}

/// Runs the actions for the `reconstruct` subcommand using the given arguments.
pub fn run_reconstruct_subcommand(arguments: &ArgMatches, verbosity: Verbosity) {
    let mut config = utils::construct_config_from_options(arguments);
    if let Some(diagnostics_file) = arguments.value_of("diagnostics-file") {
        config.diagnostics_file = diagnostics_file.into();
    }

    let cells_file_path = arguments
        .value_of("cells-file")
        .expect("No value for required argument");
    let cells = exit_on_error!(
        cells::read_cell_moments(cells_file_path, config.n_bins),
        "Error: Could not read cells file {0}: {1}",
        cells_file_path
    );

    if let Some(warning) = cutoff_interpolation_warning(&config) {
        eprintln!("{}", warning);
    }

    let engine = ReconstructionEngine::new(config, verbosity);

    if verbosity.write_diagnostics() {
        exit_on_error!(
            engine.diagnostics_log().clear(),
            "Error: Could not create diagnostics file: {}"
        );
    }
    if verbosity.print_messages() {
        println!(
            "Reconstructing spectra for {} cells with slope mode {}",
            cells.len(),
            engine.config().slope_mode
        );
    }

    let spectra = engine.reconstruct_spectra(&cells, None);

    #[cfg(feature = "json")]
    if let Some(output_file_path) = arguments.value_of("output-file") {
        let data: Vec<_> = cells
            .iter()
            .zip(spectra.iter())
            .map(|((context, _), spectrum)| CellSpectrum {
                time: context.time,
                location: context.location,
                spectrum,
            })
            .collect();
        exit_on_error!(
            save_data_as_json(output_file_path, &data),
            "Error: Could not save spectra: {}"
        );
        return;
    }

    for ((context, _), spectrum) in cells.iter().zip(spectra.iter()) {
        print_spectrum(context, spectrum);
    }
}

#[cfg(feature = "json")]
#[derive(Serialize)]
struct CellSpectrum<'a> {
    time: f64,
    location: Option<[f64; 3]>,
    spectrum: &'a ReconstructedSpectrum,
}

/// Cutoff interpolation needs a boundary interpolator, which the command line
/// program does not provide.
fn cutoff_interpolation_warning(config: &SpectrumReconstructionConfig) -> Option<String> {
    if config.interpolate_cutoffs {
        Some(
            "Warning: interpolate_cutoffs is set but no boundary interpolator is available, \
             so the cutoffs stay at the fixed bin edges"
                .to_string(),
        )
    } else {
        None
    }
}

fn print_spectrum(context: &CellContext, spectrum: &ReconstructedSpectrum) {
    match spectrum {
        ReconstructedSpectrum::Empty => println!("Time = {:.3e} | empty cell", context.time),
        ReconstructedSpectrum::Piecewise(spectrum) => {
            println!(
                "Time = {:.3e} | bins {} to {}",
                context.time,
                spectrum.first_bin_idx(),
                spectrum.last_bin_idx()
            );
            println!(
                "{:>4} {:>11} {:>11} {:>11} {:>11} {:>9}",
                "bin", "p_l", "p_r", "f_l", "f_r", "q"
            );
            for (offset, segment) in spectrum.segments().iter().enumerate() {
                println!(
                    "{:>4} {:>11.4e} {:>11.4e} {:>11.4e} {:>11.4e} {:>9.4}",
                    spectrum.first_bin_idx() + offset,
                    segment.p_l,
                    segment.p_r,
                    segment.f_l,
                    segment.f_r,
                    segment.q
                );
            }
        }
    }
}
