//! Reading binned moments for a set of cells from text.

use super::utils;
use crate::spectrum::{detection::BinMoments, engine::CellContext};
use ndarray::Array1;
use std::{io, path::Path};

/// Reads the cell moments in the given text file. See `parse_cell_moments`.
pub fn read_cell_moments<P: AsRef<Path>>(
    file_path: P,
    n_bins: usize,
) -> io::Result<Vec<(CellContext, BinMoments)>> {
    parse_cell_moments(&utils::read_text_file(file_path)?, n_bins)
}

/// Parses the moments of a set of cells from the given text.
///
/// Each line that is not empty or starting with `#` describes a cell as
/// `time [x y z] n_0 .. n_{n_bins-1} e_0 .. e_{n_bins-1}`.
pub fn parse_cell_moments(text: &str, n_bins: usize) -> io::Result<Vec<(CellContext, BinMoments)>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(line_idx, line)| {
            let values = utils::parse_float_row(line)?;
            let context = if values.len() == 1 + 2 * n_bins {
                CellContext::new(values[0])
            } else if values.len() == 4 + 2 * n_bins {
                CellContext::with_location(values[0], [values[1], values[2], values[3]])
            } else {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Line {} has {} values, expected {} or {} for {} bins",
                        line_idx + 1,
                        values.len(),
                        1 + 2 * n_bins,
                        4 + 2 * n_bins,
                        n_bins
                    ),
                ));
            };
            let offset = values.len() - 2 * n_bins;
            let moments = BinMoments::new(
                Array1::from(values[offset..offset + n_bins].to_vec()),
                Array1::from(values[offset + n_bins..].to_vec()),
            );
            Ok((context, moments))
        })
        .collect()
}
