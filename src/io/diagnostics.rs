//! Flat text file with one record per reconstructed spectrum.

use crate::spectrum::{fcr, grid::MomentumGrid, power_law::PiecewiseSpectrum};
use std::{
    fmt::Write as FmtWrite,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

/// Append-only log of reconstructed spectra.
#[derive(Clone, Debug)]
pub struct DiagnosticsLog {
    file_path: PathBuf,
}

impl DiagnosticsLog {
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Truncates the log file, creating it if it does not exist.
    pub fn clear(&self) -> io::Result<()> {
        fs::File::create(&self.file_path).map(|_| ())
    }

    /// Appends a record for the given spectrum.
    pub fn append(&self, time: fcr, grid: &MomentumGrid, spectrum: &PiecewiseSpectrum) -> io::Result<()> {
        self.append_records(std::iter::once(format_record(time, grid, spectrum)))
    }

    /// Appends the given preformatted records, one per line.
    pub fn append_records<I>(&self, records: I) -> io::Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;
        let mut writer = io::BufWriter::new(file);
        for record in records {
            writeln!(writer, "{}", record)?;
        }
        writer.flush()
    }
}

/// Formats a single record describing the given spectrum on the full grid.
///
/// The record holds the time, a zero pad, the number of bins and the first
/// and last active bin index, followed by the edge momenta and edge
/// distribution function values of every bin and the slope of every bin.
/// Edge momenta and values are those of the fixed grid outside the spectrum.
/// Non-finite numbers are written as zero.
pub fn format_record(time: fcr, grid: &MomentumGrid, spectrum: &PiecewiseSpectrum) -> String {
    let n_bins = grid.n_bins();
    let first_bin_idx = spectrum.first_bin_idx();
    let last_bin_idx = spectrum.last_bin_idx();

    let mut edge_momenta = grid.edges().to_vec();
    edge_momenta[first_bin_idx] = spectrum.lower_cutoff();
    edge_momenta[last_bin_idx + 1] = spectrum.upper_cutoff();

    let mut edge_values = vec![0.0; n_bins + 1];
    let mut slopes = vec![0.0; n_bins];
    for (bin_idx, segment) in (first_bin_idx..=last_bin_idx).zip(spectrum.segments()) {
        edge_values[bin_idx] = segment.f_l;
        slopes[bin_idx] = segment.q;
    }
    if let Some(last_segment) = spectrum.segments().last() {
        edge_values[last_bin_idx + 1] = last_segment.f_r;
    }

    let mut record = format!(
        "{} {:4.2} {:2} {:2} {:2}",
        format_exponential(sanitize(time), 3, 15),
        0.0,
        n_bins,
        first_bin_idx,
        last_bin_idx
    );
    for &value in edge_momenta.iter().chain(&edge_values).chain(&slopes) {
        // Writing to a string can not fail
        let _ = write!(record, " {}", sanitize(value));
    }
    record
}

/// Formats the value in exponential notation with a signed exponent of at
/// least two digits, right-aligned to the given width.
fn format_exponential(value: fcr, precision: usize, width: usize) -> String {
    let formatted = format!("{:.*e}", precision, value);
    let formatted = match formatted.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exponent) => format!(
                "{}e{}{:02}",
                mantissa,
                if exponent < 0 { '-' } else { '+' },
                exponent.abs()
            ),
            Err(_) => formatted,
        },
        None => formatted,
    };
    format!("{:>width$}", formatted, width = width)
}

fn sanitize(value: fcr) -> fcr {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
