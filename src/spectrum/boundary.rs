//! Interface for interpolating the cutoff momenta at the ends of a spectrum.

use super::fcr;

/// Which end of the spectrum a cutoff belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryEdge {
    /// Lower edge of the first active bin.
    Lower,
    /// Upper edge of the last active bin.
    Upper,
}

impl BoundaryEdge {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lower => "lower",
            Self::Upper => "upper",
        }
    }
}

/// Ratios describing where the spectrum is cut off inside an edge bin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryRatios {
    /// Ratio between the fixed inner edge momentum and the cutoff momentum
    /// (both ways chosen to be at least one).
    pub momentum_ratio: fcr,
    /// Ratio `f_r/f_l` of the distribution function across the edge bin.
    pub distribution_ratio: fcr,
}

/// Defines the properties of a method for locating spectrum cutoffs from the
/// moments of the outermost bins.
pub trait BoundaryInterpolator: Sync {
    /// Finds the cutoff ratios for the given edge bin from its moment ratio
    /// and number density.
    ///
    /// Returns the ratios together with whether the interpolation succeeded.
    fn interpolated_ratios(
        &self,
        edge: BoundaryEdge,
        moment_ratio: fcr,
        number_density: fcr,
    ) -> (BoundaryRatios, bool);

    /// Computes the distribution function value at momentum `p` that
    /// corresponds to the energy density floor `e_small`.
    fn e_small_to_f(&self, e_small: fcr, p: fcr) -> fcr;
}
