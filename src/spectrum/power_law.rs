//! Piecewise power-law spectra.

use super::{
    fcr,
    grid::{self, MomentumGrid},
};
use crate::{constants::PI, math};
use ndarray::prelude::*;

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Slopes closer to 3 than this use the logarithmic number density integral.
const LOGARITHMIC_SLOPE_TOLERANCE: fcr = 1e-15;

/// Number of quadrature subintervals per decade of momentum when integrating
/// the energy density.
const SUBINTERVALS_PER_DECADE: fcr = 16.0;

/// Computes the distribution function value at the left edge of a bin
/// spanning `[p_l, p_r]` holding a power law with slope `q` and number
/// density `n`.
///
/// Returns zero if either edge momentum is non-positive.
pub fn compute_normalization(n: fcr, q: fcr, p_l: fcr, p_r: fcr) -> fcr {
    if p_l <= 0.0 || p_r <= 0.0 {
        return 0.0;
    }
    let p_ratio = p_r / p_l;
    let scale = 4.0 * PI * p_l * p_l * p_l;
    if fcr::abs(q - 3.0) <= LOGARITHMIC_SLOPE_TOLERANCE {
        n / (scale * fcr::ln(p_ratio))
    } else {
        (n / scale) * (3.0 - q) / fcr::exp_m1((3.0 - q) * fcr::ln(p_ratio))
    }
}

/// Computes the distribution function value at the right edge of a bin
/// given the value at the left edge.
pub fn compute_right_edge_value(f_l: fcr, q: fcr, p_l: fcr, p_r: fcr) -> fcr {
    f_l * fcr::powf(p_r / p_l, -q)
}

/// Spectral slope and normalization found for a single bin.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct SpectralFit {
    /// Power-law slope.
    pub q: fcr,
    /// Distribution function value at the left bin edge.
    pub f: fcr,
    /// Whether the slope was found within the admissible range.
    pub valid: bool,
}

/// A power law `f(p) = f_l*(p/p_l)^(-q)` over a single bin.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct PowerLawSegment {
    pub p_l: fcr,
    pub p_r: fcr,
    /// Kinetic energy at `p_l`.
    pub g_l: fcr,
    /// Kinetic energy at `p_r`.
    pub g_r: fcr,
    pub f_l: fcr,
    pub f_r: fcr,
    pub q: fcr,
    pub valid: bool,
}

impl PowerLawSegment {
    /// Evaluates the distribution function at the given momentum.
    pub fn evaluate(&self, p: fcr) -> fcr {
        self.f_l * fcr::powf(p / self.p_l, -self.q)
    }

    /// Computes the number density `4*pi*int(f*p^2 dp)` over the segment.
    pub fn number_density(&self) -> fcr {
        let p_ratio = self.p_r / self.p_l;
        let scale = 4.0 * PI * self.f_l * self.p_l * self.p_l * self.p_l;
        if fcr::abs(self.q - 3.0) <= LOGARITHMIC_SLOPE_TOLERANCE {
            scale * fcr::ln(p_ratio)
        } else {
            scale * fcr::exp_m1((3.0 - self.q) * fcr::ln(p_ratio)) / (3.0 - self.q)
        }
    }

    /// Computes the energy density `4*pi*int(f*p^2*T(p) dp)` over the segment.
    pub fn energy_density(&self, mass: fcr, c: fcr) -> fcr {
        if self.f_l == 0.0 {
            return 0.0;
        }
        let n_subintervals =
            usize::max(1, fcr::ceil(SUBINTERVALS_PER_DECADE * fcr::log10(self.p_r / self.p_l)) as usize);
        4.0 * PI
            * math::integrate_logarithmically(
                |p| self.evaluate(p) * p * p * grid::kinetic_energy(p, mass, c),
                self.p_l,
                self.p_r,
                n_subintervals,
            )
    }
}

/// A spectrum made up of power laws over a contiguous range of bins.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct PiecewiseSpectrum {
    first_bin_idx: usize,
    segments: Vec<PowerLawSegment>,
}

impl PiecewiseSpectrum {
    /// Creates a new spectrum whose first segment belongs to the given bin.
    pub fn new(first_bin_idx: usize, segments: Vec<PowerLawSegment>) -> Self {
        assert!(!segments.is_empty(), "Spectrum must have at least one segment.");
        Self {
            first_bin_idx,
            segments,
        }
    }

    /// Returns the index of the first bin covered by the spectrum.
    pub fn first_bin_idx(&self) -> usize {
        self.first_bin_idx
    }

    /// Returns the index of the last bin covered by the spectrum.
    pub fn last_bin_idx(&self) -> usize {
        self.first_bin_idx + self.segments.len() - 1
    }

    pub fn segments(&self) -> &[PowerLawSegment] {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut [PowerLawSegment] {
        &mut self.segments
    }

    /// Returns the segment for the given bin index, if covered.
    pub fn segment(&self, bin_idx: usize) -> Option<&PowerLawSegment> {
        bin_idx
            .checked_sub(self.first_bin_idx)
            .and_then(|idx| self.segments.get(idx))
    }

    /// Returns the momentum where the spectrum starts.
    pub fn lower_cutoff(&self) -> fcr {
        self.segments[0].p_l
    }

    /// Returns the momentum where the spectrum ends.
    pub fn upper_cutoff(&self) -> fcr {
        self.segments[self.segments.len() - 1].p_r
    }

    /// Returns the slope of each segment.
    pub fn slopes(&self) -> Array1<fcr> {
        self.segments.iter().map(|segment| segment.q).collect()
    }

    /// Returns the left edge distribution function value of each segment.
    pub fn left_values(&self) -> Array1<fcr> {
        self.segments.iter().map(|segment| segment.f_l).collect()
    }

    /// Computes the number density of each segment.
    pub fn number_densities(&self) -> Array1<fcr> {
        self.segments
            .iter()
            .map(PowerLawSegment::number_density)
            .collect()
    }

    /// Computes the energy density of each segment.
    pub fn energy_densities(&self, mass: fcr, c: fcr) -> Array1<fcr> {
        self.segments
            .iter()
            .map(|segment| segment.energy_density(mass, c))
            .collect()
    }

    /// Computes the total number density of the spectrum.
    pub fn number_density(&self) -> fcr {
        self.number_densities().sum()
    }

    /// Computes the total energy density of the spectrum.
    pub fn energy_density(&self, mass: fcr, c: fcr) -> fcr {
        self.energy_densities(mass, c).sum()
    }

    /// Assembles a spectrum from the left edge distribution function value
    /// and slope of every bin in the given grid.
    ///
    /// The spectrum covers the bins from the first to the last with a
    /// positive distribution function value, with its outer edges moved to
    /// the given cutoff momenta. Returns `ReconstructedSpectrum::Empty` if no
    /// value is positive.
    pub fn from_distribution_values(
        grid: &MomentumGrid,
        f: ArrayView1<fcr>,
        q: ArrayView1<fcr>,
        lower_cutoff: fcr,
        upper_cutoff: fcr,
    ) -> ReconstructedSpectrum {
        let n_bins = grid.n_bins();
        assert_eq!(f.len(), n_bins, "Number of distribution values must match grid.");
        assert_eq!(q.len(), n_bins, "Number of slopes must match grid.");

        let first_bin_idx = match f.iter().position(|&value| value > 0.0) {
            Some(idx) => idx,
            None => return ReconstructedSpectrum::Empty,
        };
        let last_bin_idx = f.iter().rposition(|&value| value > 0.0).unwrap_or(first_bin_idx);

        let segments = (first_bin_idx..=last_bin_idx)
            .map(|bin_idx| {
                let (mut p_l, mut p_r) = grid.bin_edges(bin_idx);
                if bin_idx == first_bin_idx {
                    p_l = lower_cutoff;
                }
                if bin_idx == last_bin_idx {
                    p_r = upper_cutoff;
                }
                let f_l = fcr::max(f[bin_idx], 0.0);
                PowerLawSegment {
                    p_l,
                    p_r,
                    g_l: grid.kinetic_energy(p_l),
                    g_r: grid.kinetic_energy(p_r),
                    f_l,
                    f_r: compute_right_edge_value(f_l, q[bin_idx], p_l, p_r),
                    q: q[bin_idx],
                    valid: f[bin_idx] > 0.0,
                }
            })
            .collect();

        ReconstructedSpectrum::Piecewise(Self::new(first_bin_idx, segments))
    }
}

/// Outcome of reconstructing the spectrum in a single cell.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub enum ReconstructedSpectrum {
    /// Too few bins held particles for a spectrum to be reconstructed.
    Empty,
    Piecewise(PiecewiseSpectrum),
}

impl ReconstructedSpectrum {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_piecewise(&self) -> Option<&PiecewiseSpectrum> {
        match self {
            Self::Empty => None,
            Self::Piecewise(spectrum) => Some(spectrum),
        }
    }
}
