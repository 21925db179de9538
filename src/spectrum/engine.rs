//! Reconstruction of the spectrum in a cell from its binned moments.

use super::{
    boundary::{BoundaryEdge, BoundaryInterpolator},
    config::SpectrumReconstructionConfig,
    detection::{detect_active_bins, ActiveBins, BinMoments},
    fcr,
    grid::MomentumGrid,
    power_law::{
        compute_right_edge_value, PiecewiseSpectrum, PowerLawSegment, ReconstructedSpectrum,
    },
    root_finding,
    table::{MomentRatioTable, QTable},
    SlopeSolvingMode,
};
use crate::io::{
    diagnostics::{self, DiagnosticsLog},
    Verbosity,
};
use rayon::prelude::*;
use std::sync::OnceLock;

/// Slope to start the Newton-Raphson iteration from.
const ROOT_FINDING_START_SLOPE: fcr = 3.5;

/// Where and when a set of moments was recorded.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CellContext {
    pub time: fcr,
    pub location: Option<[fcr; 3]>,
}

impl CellContext {
    pub fn new(time: fcr) -> Self {
        Self {
            time,
            location: None,
        }
    }

    pub fn with_location(time: fcr, location: [fcr; 3]) -> Self {
        Self {
            time,
            location: Some(location),
        }
    }
}

/// Reconstructs piecewise power-law spectra on a fixed momentum grid.
///
/// The slope tables are computed the first time they are needed and shared
/// by all subsequent reconstructions, which may run concurrently.
#[derive(Debug)]
pub struct ReconstructionEngine {
    config: SpectrumReconstructionConfig,
    verbosity: Verbosity,
    grid: MomentumGrid,
    bin_table: OnceLock<QTable>,
    ratio_table: OnceLock<MomentRatioTable>,
    diagnostics_log: DiagnosticsLog,
}

impl ReconstructionEngine {
    /// Creates a new engine for the given configuration.
    pub fn new(config: SpectrumReconstructionConfig, verbosity: Verbosity) -> Self {
        config.validate();
        let grid = config.build_momentum_grid();
        let diagnostics_log = DiagnosticsLog::new(&config.diagnostics_file);
        Self {
            config,
            verbosity,
            grid,
            bin_table: OnceLock::new(),
            ratio_table: OnceLock::new(),
            diagnostics_log,
        }
    }

    pub fn config(&self) -> &SpectrumReconstructionConfig {
        &self.config
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn grid(&self) -> &MomentumGrid {
        &self.grid
    }

    pub fn diagnostics_log(&self) -> &DiagnosticsLog {
        &self.diagnostics_log
    }

    /// Returns the per-bin slope table, computing it if necessary.
    pub fn bin_table(&self) -> &QTable {
        self.bin_table.get_or_init(|| {
            if self.verbosity.write_diagnostics() {
                println!("Computing slope table for {} bins", self.grid.n_bins());
            }
            QTable::build(
                self.grid.three_plus_log_slopes().view(),
                self.grid.log_slopes(),
                self.grid.edges(),
                self.config.q_big,
                self.config.arr_dim_q,
            )
        })
    }

    /// Returns the moment ratio slope table, computing it if necessary.
    pub fn ratio_table(&self) -> &MomentRatioTable {
        self.ratio_table.get_or_init(|| {
            if self.verbosity.write_diagnostics() {
                println!("Computing slope table over moment ratios");
            }
            MomentRatioTable::prepare(
                self.grid.p_fix_ratio(),
                self.config.q_big,
                self.config.arr_dim_q,
            )
        })
    }

    /// Computes all tables needed by the configured slope solving mode.
    pub fn prepare_tables(&self) {
        match self.config.slope_mode {
            SlopeSolvingMode::RootFinding => {}
            SlopeSolvingMode::BinTable => {
                self.bin_table();
            }
            SlopeSolvingMode::RatioTable => {
                self.ratio_table();
            }
        }
    }

    /// Finds the slope of the power law in the given bin that has the given
    /// moment ratio, using the configured slope solving mode.
    ///
    /// Also returns whether the slope was found, which is `false` when the
    /// iteration did not converge or the table lookup fell outside its range.
    pub fn solve_slope(&self, bin_idx: usize, moment_ratio: fcr) -> (fcr, bool) {
        let q_big = self.config.q_big;
        match self.config.slope_mode {
            SlopeSolvingMode::RootFinding => root_finding::solve_q(
                ROOT_FINDING_START_SLOPE,
                3.0 + self.grid.log_slopes()[bin_idx],
                moment_ratio,
                self.grid.bin_momentum_ratio(bin_idx),
                q_big,
            ),
            SlopeSolvingMode::BinTable => self.bin_table().interpolate_q(bin_idx, moment_ratio, q_big),
            SlopeSolvingMode::RatioTable => self.ratio_table().interpolate_q(moment_ratio),
        }
    }

    /// Reconstructs the spectrum for the given moments.
    ///
    /// If cutoff interpolation is enabled and a boundary interpolator is
    /// given, the outer edges of the spectrum are moved to the interpolated
    /// cutoffs. A diagnostics record is appended when the verbosity asks for it.
    pub fn reconstruct_spectrum(
        &self,
        context: &CellContext,
        moments: &BinMoments,
        boundary: Option<&dyn BoundaryInterpolator>,
    ) -> ReconstructedSpectrum {
        let mut messages = Vec::new();
        let spectrum = self.reconstruct_without_record(context, moments, boundary, &mut messages);
        print_messages(&messages);
        if self.verbosity.write_diagnostics() {
            if let ReconstructedSpectrum::Piecewise(spectrum) = &spectrum {
                if let Err(err) = self
                    .diagnostics_log
                    .append(context.time, &self.grid, spectrum)
                {
                    eprintln!("Warning: Could not write diagnostics record: {}", err);
                }
            }
        }
        spectrum
    }

    /// Reconstructs the spectra for the given cells in parallel.
    ///
    /// Messages are printed and diagnostics records appended in the order of
    /// the cells once all spectra are reconstructed.
    pub fn reconstruct_spectra(
        &self,
        cells: &[(CellContext, BinMoments)],
        boundary: Option<&dyn BoundaryInterpolator>,
    ) -> Vec<ReconstructedSpectrum> {
        self.prepare_tables();

        let (spectra, messages): (Vec<_>, Vec<_>) = cells
            .par_iter()
            .map(|(context, moments)| {
                let mut messages = Vec::new();
                let spectrum =
                    self.reconstruct_without_record(context, moments, boundary, &mut messages);
                (spectrum, messages)
            })
            .unzip();

        for cell_messages in &messages {
            print_messages(cell_messages);
        }

        if self.verbosity.write_diagnostics() {
            let records = cells
                .iter()
                .zip(spectra.iter())
                .filter_map(|((context, _), spectrum)| {
                    spectrum
                        .as_piecewise()
                        .map(|spectrum| diagnostics::format_record(context.time, &self.grid, spectrum))
                });
            if let Err(err) = self.diagnostics_log.append_records(records) {
                eprintln!("Warning: Could not write diagnostics records: {}", err);
            }
        }
        spectra
    }

    fn reconstruct_without_record(
        &self,
        context: &CellContext,
        moments: &BinMoments,
        boundary: Option<&dyn BoundaryInterpolator>,
        messages: &mut Vec<Message>,
    ) -> ReconstructedSpectrum {
        let active_bins = detect_active_bins(moments, &self.grid, self.config.e_small, |bin_idx, ratio| {
            self.solve_slope(bin_idx, ratio)
        });

        if active_bins.non_degenerate_count() < 2 {
            if self.verbosity.print_messages() {
                messages.push(Message::Info(format!(
                    "Time = {:6.2} | empty cell, no spectrum reconstructed",
                    context.time
                )));
            }
            return ReconstructedSpectrum::Empty;
        }

        let indices = active_bins.indices();
        if self.verbosity.print_messages() {
            self.describe_moments(context, moments, &active_bins, messages);
        }
        if self.verbosity.write_diagnostics() {
            messages.push(Message::Info(format!(
                "Spectral slopes are obtained with mode {}",
                self.config.slope_mode
            )));
        }

        let segments = indices
            .clone()
            .map(|bin_idx| {
                let (p_l, p_r) = self.grid.bin_edges(bin_idx);
                let (g_l, g_r) = self.grid.bin_edge_energies(bin_idx);
                match active_bins.estimate(bin_idx).map(|estimate| estimate.fit) {
                    Some(fit) => PowerLawSegment {
                        p_l,
                        p_r,
                        g_l,
                        g_r,
                        f_l: fit.f,
                        f_r: compute_right_edge_value(fit.f, fit.q, p_l, p_r),
                        q: fit.q,
                        valid: fit.valid && fit.q.is_finite(),
                    },
                    None => PowerLawSegment {
                        p_l,
                        p_r,
                        g_l,
                        g_r,
                        f_l: 0.0,
                        f_r: 0.0,
                        q: 0.0,
                        valid: false,
                    },
                }
            })
            .collect();
        let mut spectrum = PiecewiseSpectrum::new(indices.start, segments);

        if self.config.interpolate_cutoffs {
            if let Some(boundary) = boundary {
                for edge in [BoundaryEdge::Lower, BoundaryEdge::Upper] {
                    self.interpolate_cutoff(&mut spectrum, moments, boundary, edge, messages);
                }
            }
        }

        if self.verbosity.print_messages() {
            messages.push(Message::Info(format!(
                "q = {}",
                format_values(spectrum.slopes().iter().copied())
            )));
            messages.push(Message::Info(format!(
                "f = {}",
                format_values(spectrum.left_values().iter().copied())
            )));
            messages.push(Message::Info(format!(
                "Cutoff indices obtained (lo, up): {}, {} || momenta (lo, up): {:e}, {:e}",
                spectrum.first_bin_idx(),
                spectrum.last_bin_idx(),
                spectrum.lower_cutoff(),
                spectrum.upper_cutoff()
            )));
        }

        ReconstructedSpectrum::Piecewise(spectrum)
    }

    /// Replaces the outer edge of the first or last bin of the spectrum with
    /// the cutoff found by the boundary interpolator, and derives the
    /// distribution function values and slope of the bin from the cutoff.
    fn interpolate_cutoff(
        &self,
        spectrum: &mut PiecewiseSpectrum,
        moments: &BinMoments,
        boundary: &dyn BoundaryInterpolator,
        edge: BoundaryEdge,
        messages: &mut Vec<Message>,
    ) {
        let bin_idx = match edge {
            BoundaryEdge::Lower => spectrum.first_bin_idx(),
            BoundaryEdge::Upper => spectrum.last_bin_idx(),
        };
        if !moments.is_non_degenerate(bin_idx) {
            return;
        }
        let n = moments.number_density(bin_idx);
        let e = moments.energy_density(bin_idx);
        let edges = self.grid.edges();
        let edge_energies = self.grid.edge_energies();

        // The ratio is taken relative to the fixed inner edge of the bin
        let inner_edge_idx = match edge {
            BoundaryEdge::Lower => bin_idx + 1,
            BoundaryEdge::Upper => bin_idx,
        };
        let moment_ratio = e / (n * edge_energies[inner_edge_idx]);

        let (ratios, converged) = boundary.interpolated_ratios(edge, moment_ratio, n);
        if !converged && self.verbosity.print_messages() {
            messages.push(Message::Warning(format!(
                "Warning: Failed to extract {} boundary p and f from e, n: momentum ratio = {:.6}. Assuming fixed momentum.",
                edge.name(),
                ratios.momentum_ratio
            )));
        }

        let e_small = self.config.e_small;
        let q_big = self.config.q_big;
        let segment_idx = bin_idx - spectrum.first_bin_idx();
        let segment = &mut spectrum.segments_mut()[segment_idx];

        match edge {
            BoundaryEdge::Lower => {
                if converged {
                    segment.p_l = edges[inner_edge_idx] / ratios.momentum_ratio;
                    segment.g_l = self.grid.kinetic_energy(segment.p_l);
                }
                segment.f_l = boundary.e_small_to_f(e_small, segment.p_l);
                segment.f_r = segment.f_l * ratios.distribution_ratio;
            }
            BoundaryEdge::Upper => {
                if converged {
                    segment.p_r = edges[inner_edge_idx] * ratios.momentum_ratio;
                    segment.g_r = self.grid.kinetic_energy(segment.p_r);
                }
                segment.f_r = boundary.e_small_to_f(e_small, segment.p_r);
                segment.f_l = segment.f_r / ratios.distribution_ratio;
            }
        }
        let q = -fcr::log10(segment.f_r / segment.f_l) / fcr::log10(segment.p_r / segment.p_l);
        segment.q = fcr::signum(q) * fcr::min(fcr::abs(q), q_big);
    }

    fn describe_moments(
        &self,
        context: &CellContext,
        moments: &BinMoments,
        active_bins: &ActiveBins,
        messages: &mut Vec<Message>,
    ) {
        let indices = active_bins.indices();
        let header = match context.location {
            Some([x, y, z]) => format!(
                "Time = {:6.2} | i_lo = {:2}, i_up = {:2} | location = ({}, {}, {})",
                context.time,
                indices.start,
                indices.end - 1,
                x,
                y,
                z
            ),
            None => format!(
                "Time = {:6.2} | i_lo = {:2}, i_up = {:2}",
                context.time,
                indices.start,
                indices.end - 1
            ),
        };
        messages.push(Message::Info(header));
        messages.push(Message::Info(format!(
            "n = {}",
            format_values(moments.number_densities().iter().copied())
        )));
        messages.push(Message::Info(format!(
            "e = {}",
            format_values(moments.energy_densities().iter().copied())
        )));
        messages.push(Message::Info(format!(
            "e/(n g) = {}",
            format_values((0..moments.n_bins()).map(|idx| moments.moment_ratio(idx, &self.grid)))
        )));
    }
}

/// A message produced while reconstructing the spectrum of a single cell.
#[derive(Clone, Debug, PartialEq)]
enum Message {
    Info(String),
    Warning(String),
}

fn print_messages(messages: &[Message]) {
    for message in messages {
        match message {
            Message::Info(text) => println!("{}", text),
            Message::Warning(text) => eprintln!("{}", text),
        }
    }
}

/// Formats the given values with three significant digits.
fn format_values<I: Iterator<Item = fcr>>(values: I) -> String {
    let formatted: Vec<_> = values.map(|value| format!("{:.2e}", value)).collect();
    format!("[{}]", formatted.join(", "))
}

#[cfg(test)]
mod tests {

    use super::*;

    fn create_engine(slope_mode: SlopeSolvingMode) -> ReconstructionEngine {
        ReconstructionEngine::new(
            SpectrumReconstructionConfig {
                slope_mode,
                ..SpectrumReconstructionConfig::default()
            },
            Verbosity::Quiet,
        )
    }

    #[test]
    fn all_modes_give_bounded_slopes_for_uniform_moments() {
        for &mode in &[
            SlopeSolvingMode::RootFinding,
            SlopeSolvingMode::BinTable,
            SlopeSolvingMode::RatioTable,
        ] {
            let engine = create_engine(mode);
            let moments = BinMoments::new(ndarray::Array1::ones(45), ndarray::Array1::ones(45));
            let spectrum = engine.reconstruct_spectrum(&CellContext::new(0.0), &moments, None);
            let spectrum = spectrum.as_piecewise().unwrap();
            assert_eq!(spectrum.first_bin_idx(), 0);
            assert_eq!(spectrum.last_bin_idx(), 44);
            assert!(spectrum
                .slopes()
                .iter()
                .all(|&q| q.is_finite() && fcr::abs(q) <= 20.0));
        }
    }

    #[test]
    fn tables_are_only_built_when_needed() {
        let engine = create_engine(SlopeSolvingMode::RootFinding);
        engine.prepare_tables();
        assert!(engine.bin_table.get().is_none());
        assert!(engine.ratio_table.get().is_none());

        let engine = create_engine(SlopeSolvingMode::BinTable);
        engine.prepare_tables();
        assert!(engine.bin_table.get().is_some());
        assert!(engine.ratio_table.get().is_none());
    }

    #[test]
    fn messages_of_a_cell_are_collected_in_order() {
        let engine = ReconstructionEngine::new(
            SpectrumReconstructionConfig {
                slope_mode: SlopeSolvingMode::RootFinding,
                ..SpectrumReconstructionConfig::default()
            },
            Verbosity::Messages,
        );
        let context = CellContext::new(3.0);

        let mut messages = Vec::new();
        let spectrum =
            engine.reconstruct_without_record(&context, &BinMoments::zeros(45), None, &mut messages);
        assert!(spectrum.is_empty());
        assert_eq!(
            messages,
            vec![Message::Info(
                "Time =   3.00 | empty cell, no spectrum reconstructed".to_string()
            )]
        );

        let mut messages = Vec::new();
        let moments = BinMoments::new(ndarray::Array1::ones(45), ndarray::Array1::ones(45));
        engine.reconstruct_without_record(&context, &moments, None, &mut messages);
        let texts: Vec<_> = messages
            .iter()
            .map(|message| match message {
                Message::Info(text) | Message::Warning(text) => text.as_str(),
            })
            .collect();
        assert_eq!(texts.len(), 7);
        assert!(texts[0].starts_with("Time =   3.00 | i_lo =  0, i_up = 44"));
        assert!(texts[1].starts_with("n = ") && texts[2].starts_with("e = "));
        assert!(texts[6].starts_with("Cutoff indices obtained (lo, up): 0, 44"));
    }

    #[test]
    fn quiet_engine_collects_no_messages() {
        let engine = create_engine(SlopeSolvingMode::RootFinding);
        let moments = BinMoments::new(ndarray::Array1::ones(45), ndarray::Array1::ones(45));
        let mut messages = Vec::new();
        engine.reconstruct_without_record(&CellContext::new(0.0), &moments, None, &mut messages);
        assert!(messages.is_empty());
    }

    #[test]
    fn value_formatting_keeps_three_significant_digits() {
        assert_eq!(
            format_values([1234.5, 0.012345].iter().copied()),
            "[1.23e3, 1.23e-2]"
        );
    }
}
