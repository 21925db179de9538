//! Detection of the bins that take part in a reconstructed spectrum.

use super::{
    fcr,
    grid::MomentumGrid,
    power_law::{compute_normalization, compute_right_edge_value, SpectralFit},
};
use crate::constants::PI;
use ndarray::prelude::*;
use std::ops::Range;

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Number and energy density of cosmic rays in each momentum bin.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct BinMoments {
    number_densities: Array1<fcr>,
    energy_densities: Array1<fcr>,
}

impl BinMoments {
    pub fn new(number_densities: Array1<fcr>, energy_densities: Array1<fcr>) -> Self {
        assert_eq!(
            number_densities.len(),
            energy_densities.len(),
            "Number and energy densities must be given for the same bins."
        );
        Self {
            number_densities,
            energy_densities,
        }
    }

    /// Creates moments for the given number of bins with no particles.
    pub fn zeros(n_bins: usize) -> Self {
        Self::new(Array1::zeros(n_bins), Array1::zeros(n_bins))
    }

    pub fn n_bins(&self) -> usize {
        self.number_densities.len()
    }

    pub fn number_densities(&self) -> ArrayView1<fcr> {
        self.number_densities.view()
    }

    pub fn energy_densities(&self) -> ArrayView1<fcr> {
        self.energy_densities.view()
    }

    pub fn number_density(&self, bin_idx: usize) -> fcr {
        self.number_densities[bin_idx]
    }

    pub fn energy_density(&self, bin_idx: usize) -> fcr {
        self.energy_densities[bin_idx]
    }

    /// Whether both the number and energy density of the bin are positive.
    pub fn is_non_degenerate(&self, bin_idx: usize) -> bool {
        self.number_densities[bin_idx] > 0.0 && self.energy_densities[bin_idx] > 0.0
    }

    /// Computes the ratio `e/(n*T_l)` of the mean kinetic energy in the bin to
    /// the kinetic energy at its left edge.
    pub fn moment_ratio(&self, bin_idx: usize, grid: &MomentumGrid) -> fcr {
        self.energy_densities[bin_idx]
            / (self.number_densities[bin_idx] * grid.edge_energies()[bin_idx])
    }
}

/// Slope, normalization and edge energy amplitudes estimated for a
/// non-degenerate bin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BinEstimate {
    pub fit: SpectralFit,
    pub left_energy_amplitude: fcr,
    pub right_energy_amplitude: fcr,
    /// Whether the bin carries energy above the energy floor.
    ///
    /// Not used for narrowing the active range.
    pub above_energy_floor: bool,
}

/// The bins taking part in a spectrum, together with the estimates made for
/// each bin while detecting them.
#[derive(Clone, Debug)]
pub struct ActiveBins {
    indices: Range<usize>,
    non_degenerate_count: usize,
    estimates: Vec<Option<BinEstimate>>,
}

impl ActiveBins {
    /// Range of active bin indices.
    pub fn indices(&self) -> Range<usize> {
        self.indices.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn first(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.indices.start)
        }
    }

    pub fn last(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.indices.end - 1)
        }
    }

    /// Number of bins with positive number and energy density.
    pub fn non_degenerate_count(&self) -> usize {
        self.non_degenerate_count
    }

    /// Returns the estimate for the given bin, or `None` if it is degenerate.
    pub fn estimate(&self, bin_idx: usize) -> Option<&BinEstimate> {
        self.estimates.get(bin_idx).and_then(Option::as_ref)
    }
}

/// Classifies the bins of the given moments and estimates slope,
/// normalization and edge energy amplitudes for each non-degenerate bin,
/// using `solve_slope(bin_idx, moment_ratio)` to obtain slopes.
///
/// The solver returns the slope together with whether it was found within
/// the admissible range, which becomes the validity of the fit.
///
/// The active range is empty when no bin is non-degenerate and covers all
/// bins otherwise.
pub fn detect_active_bins<S>(
    moments: &BinMoments,
    grid: &MomentumGrid,
    e_small: fcr,
    solve_slope: S,
) -> ActiveBins
where
    S: Fn(usize, fcr) -> (fcr, bool),
{
    let n_bins = grid.n_bins();
    assert_eq!(moments.n_bins(), n_bins, "Moments must be given for every bin.");

    let c_squared = grid.c() * grid.c();

    let estimates: Vec<_> = (0..n_bins)
        .map(|bin_idx| {
            if !moments.is_non_degenerate(bin_idx) {
                return None;
            }
            let (p_l, p_r) = grid.bin_edges(bin_idx);
            let (g_l, g_r) = grid.bin_edge_energies(bin_idx);
            let n = moments.number_density(bin_idx);
            let e = moments.energy_density(bin_idx);

            let (q, converged) = solve_slope(bin_idx, moments.moment_ratio(bin_idx, grid));
            let f = compute_normalization(n, q, p_l, p_r);

            let left_energy_amplitude = 4.0 * PI * c_squared * f * p_l * p_l * g_l;
            let right_energy_amplitude =
                4.0 * PI * c_squared * compute_right_edge_value(f, q, p_l, p_r) * p_r * p_r * g_r;

            Some(BinEstimate {
                fit: SpectralFit {
                    q,
                    f,
                    valid: converged,
                },
                left_energy_amplitude,
                right_energy_amplitude,
                above_energy_floor: (left_energy_amplitude > e_small
                    || right_energy_amplitude > e_small)
                    && e > e_small,
            })
        })
        .collect();

    let non_degenerate_count = estimates.iter().filter(|estimate| estimate.is_some()).count();

    ActiveBins {
        indices: if non_degenerate_count == 0 {
            0..0
        } else {
            0..n_bins
        },
        non_degenerate_count,
        estimates,
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_relative_eq;

    fn default_grid() -> MomentumGrid {
        MomentumGrid::new(45, 1e-2, 1e2, 1e-3, 1e7, 0.0, 1.0)
    }

    #[test]
    fn empty_moments_give_no_active_bins() {
        let grid = default_grid();
        let active = detect_active_bins(&BinMoments::zeros(45), &grid, 1e-6, |_, _| (3.5, true));
        assert!(active.is_empty());
        assert_eq!(active.non_degenerate_count(), 0);
        assert_eq!(active.first(), None);
        assert_eq!(active.last(), None);
        assert!(active.estimate(10).is_none());
    }

    #[test]
    fn a_single_non_degenerate_bin_activates_the_full_range() {
        let grid = default_grid();
        let mut n = Array1::zeros(45);
        let mut e = Array1::zeros(45);
        n[7] = 1.0;
        e[7] = 1.1 * grid.edge_energies()[7];
        // Zero energy makes a bin degenerate even with particles present
        n[9] = 1.0;
        let active = detect_active_bins(&BinMoments::new(n, e), &grid, 1e-6, |_, _| (4.0, true));
        assert_eq!(active.indices(), 0..45);
        assert_eq!(active.non_degenerate_count(), 1);
        assert!(active.estimate(7).is_some());
        assert!(active.estimate(9).is_none());
    }

    #[test]
    fn estimates_hold_slope_normalization_and_energy_amplitudes() {
        let grid = default_grid();
        let bin_idx = 20;
        let moments = BinMoments::new(Array1::ones(45), Array1::ones(45));
        let active = detect_active_bins(&moments, &grid, 1e-6, |idx, ratio| {
            assert_relative_eq!(ratio, 1.0 / grid.edge_energies()[idx]);
            (4.5, true)
        });
        let estimate = active.estimate(bin_idx).unwrap();
        let (p_l, p_r) = grid.bin_edges(bin_idx);
        assert_eq!(estimate.fit.q, 4.5);
        assert!(estimate.fit.valid);
        assert_relative_eq!(estimate.fit.f, compute_normalization(1.0, 4.5, p_l, p_r));
        assert_relative_eq!(
            estimate.right_energy_amplitude / estimate.left_energy_amplitude,
            (p_r / p_l).powf(-4.5) * (p_r / p_l).powi(3),
            max_relative = 1e-12
        );
        assert!(estimate.above_energy_floor);
    }

    #[test]
    fn unsolved_slopes_give_invalid_fits() {
        let grid = default_grid();
        let moments = BinMoments::new(Array1::ones(45), Array1::ones(45));
        let active = detect_active_bins(&moments, &grid, 1e-6, |idx, _| {
            if idx == 0 {
                (-20.0, false)
            } else {
                (4.5, true)
            }
        });
        let first = active.estimate(0).unwrap();
        assert_eq!(first.fit.q, -20.0);
        assert!(!first.fit.valid);
        assert!(active.estimate(1).unwrap().fit.valid);
    }
}
