//! Utilities for input/output.

use std::{
    fs,
    io::{self, Read},
    path::Path,
};

#[cfg(feature = "json")]
use serde::Serialize;

/// Reads and returns the content of the specified text file.
pub fn read_text_file<P: AsRef<Path>>(file_path: P) -> io::Result<String> {
    let file = fs::File::open(file_path)?;
    let mut text = String::new();
    let _ = io::BufReader::new(file).read_to_string(&mut text)?;
    Ok(text)
}

/// Parses every whitespace-separated token of the given line as a float.
pub fn parse_float_row(line: &str) -> io::Result<Vec<f64>> {
    line.split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|err| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Failed parsing value {} as a number: {}", token, err),
                )
            })
        })
        .collect()
}

/// Serializes the given data into JSON format and saves at the given path.
#[cfg(feature = "json")]
pub fn save_data_as_json<P: AsRef<Path>, T: Serialize>(file_path: P, data: &T) -> io::Result<()> {
    let mut file = io::BufWriter::new(fs::File::create(file_path)?);
    write_data_as_json(&mut file, data)
}

/// Serializes the given data into JSON format and writes to the given writer.
#[cfg(feature = "json")]
pub fn write_data_as_json<W: io::Write, T: Serialize>(writer: &mut W, data: &T) -> io::Result<()> {
    serde_json::to_writer(writer, data).map_err(|err| {
        io::Error::new(
            io::ErrorKind::Other,
            format!("Unexpected error while serializing data to JSON: {}", err),
        )
    })
}
