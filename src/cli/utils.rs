//! Utilities for creating the command line interface.

use crate::{
    exit_on_error,
    spectrum::{config::SpectrumReconstructionConfig, SlopeSolvingMode},
};
use clap::{Arg, ArgMatches, Command};
use std::str::FromStr;

/// Adds the arguments for configuring the reconstruction to the given command.
pub fn add_config_arguments(command: Command<'static>) -> Command<'static> {
    command
        .arg(
            Arg::new("param-file")
                .short('p')
                .long("param-file")
                .require_equals(true)
                .value_name("FILE")
                .help(
                    "Path to parameter file with `name = value` assignments\n\
                     [default: built-in defaults]",
                )
                .takes_value(true),
        )
        .arg(
            Arg::new("species")
                .long("species")
                .require_equals(true)
                .value_name("TAG")
                .help("Species of the cosmic-ray particles (e.g. e, p, Be10) [default: from param file]")
                .takes_value(true),
        )
        .arg(
            Arg::new("slope-mode")
                .long("slope-mode")
                .require_equals(true)
                .value_name("MODE")
                .help("How to obtain spectral slopes [default: from param file]")
                .takes_value(true)
                .possible_values(&["root_finding", "bin_table", "ratio_table"]),
        )
}

pub fn parse_value_string<T>(argument_name: &str, value_string: &str) -> T
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    exit_on_error!(
        value_string.parse(),
        "Error: Could not parse value for {0}: {1}",
        argument_name
    )
}

pub fn get_value_from_parseable_argument<T>(arguments: &ArgMatches, argument_name: &str) -> Option<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    arguments
        .value_of(argument_name)
        .map(|value_string| parse_value_string(argument_name, value_string))
}

/// Creates the reconstruction configuration from the parameter file and the
/// overriding options, exiting with an error if anything is invalid.
pub fn construct_config_from_options(arguments: &ArgMatches) -> SpectrumReconstructionConfig {
    let mut config = match arguments.value_of("param-file") {
        Some(param_file_path) => exit_on_error!(
            SpectrumReconstructionConfig::from_param_file(param_file_path),
            "Error: Could not read parameter file {0}: {1}",
            param_file_path
        ),
        None => SpectrumReconstructionConfig::default(),
    };
    if let Some(species) = get_value_from_parseable_argument(arguments, "species") {
        config.species = Some(species);
    }
    if let Some(slope_mode) = get_value_from_parseable_argument::<SlopeSolvingMode>(arguments, "slope-mode") {
        config.slope_mode = slope_mode;
    }
    config.validate();
    config
}
