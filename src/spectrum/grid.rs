//! Fixed logarithmic momentum grid.

use super::fcr;
use ndarray::{prelude::*, Zip};

/// The fixed momentum bins over which the cosmic-ray spectrum is represented.
///
/// The `n_bins - 2` interior bins are spaced logarithmically between the minimum
/// and maximum fixed momenta, while the outermost edges extend down and up to
/// separate initial cutoff momenta.
#[derive(Clone, Debug)]
pub struct MomentumGrid {
    /// Momenta of the `n_bins + 1` bin edges.
    edges: Array1<fcr>,
    /// Kinetic energies at the bin edges.
    edge_energies: Array1<fcr>,
    /// Representative momenta of the bins.
    mid_momenta: Array1<fcr>,
    /// Representative kinetic energies of the bins.
    mid_energies: Array1<fcr>,
    /// Logarithmic slope `s = dln(T)/dln(p)` of the kinetic energy across each bin.
    log_slopes: Array1<fcr>,
    /// Ratio between adjacent edges of the interior bins.
    p_fix_ratio: fcr,
    /// Rest mass of the particles.
    mass: fcr,
    /// Speed of light.
    c: fcr,
}

impl MomentumGrid {
    /// Creates a new momentum grid with `n_bins` bins.
    ///
    /// The interior edges run from `p_min_fix` to `p_max_fix`, while the
    /// outermost edges are `p_lo_init` and `p_up_init`.
    pub fn new(
        n_bins: usize,
        p_min_fix: fcr,
        p_max_fix: fcr,
        p_lo_init: fcr,
        p_up_init: fcr,
        mass: fcr,
        c: fcr,
    ) -> Self {
        assert!(n_bins >= 3, "Momentum grid must have at least three bins.");
        assert!(
            p_lo_init > 0.0 && p_lo_init < p_min_fix,
            "Lowest momentum edge must lie in (0, p_min_fix)."
        );
        assert!(
            p_max_fix > p_min_fix,
            "Maximum fixed momentum must be larger than minimum fixed momentum."
        );
        assert!(
            p_up_init > p_max_fix,
            "Highest momentum edge must be larger than p_max_fix."
        );
        assert!(mass >= 0.0, "Rest mass must be non-negative.");
        assert!(c > 0.0, "Speed of light must be positive.");

        let log_width = fcr::log10(p_max_fix / p_min_fix) / ((n_bins - 2) as fcr);
        let p_fix_ratio = fcr::powf(10.0, log_width);

        let mut edges = Array1::from_shape_fn(n_bins + 1, |idx| {
            p_min_fix * fcr::powf(10.0, log_width * ((idx as fcr) - 1.0))
        });
        edges[0] = p_lo_init;
        edges[n_bins - 1] = p_max_fix;
        edges[n_bins] = p_up_init;

        let edge_energies = edges.mapv(|p| kinetic_energy(p, mass, c));

        let lower_edges = edges.slice(s![..n_bins]);
        let upper_edges = edges.slice(s![1..]);
        let lower_energies = edge_energies.slice(s![..n_bins]);
        let upper_energies = edge_energies.slice(s![1..]);

        let log_slopes = Zip::from(&lower_edges)
            .and(&upper_edges)
            .and(&lower_energies)
            .and(&upper_energies)
            .map_collect(|&p_l, &p_r, &g_l, &g_r| fcr::ln(g_r / g_l) / fcr::ln(p_r / p_l));

        let mid_momenta = Self::compute_mid_values(&edges, p_fix_ratio);
        let mid_energies = Self::compute_mid_values(&edge_energies, p_fix_ratio);

        Self {
            edges,
            edge_energies,
            mid_momenta,
            mid_energies,
            log_slopes,
            p_fix_ratio,
            mass,
            c,
        }
    }

    /// Returns the number of bins.
    pub fn n_bins(&self) -> usize {
        self.log_slopes.len()
    }

    /// Returns a view of the `n_bins + 1` edge momenta.
    pub fn edges(&self) -> ArrayView1<fcr> {
        self.edges.view()
    }

    /// Returns a view of the kinetic energies at the `n_bins + 1` edges.
    pub fn edge_energies(&self) -> ArrayView1<fcr> {
        self.edge_energies.view()
    }

    /// Returns a view of the representative momentum of each bin.
    pub fn mid_momenta(&self) -> ArrayView1<fcr> {
        self.mid_momenta.view()
    }

    /// Returns a view of the representative kinetic energy of each bin.
    pub fn mid_energies(&self) -> ArrayView1<fcr> {
        self.mid_energies.view()
    }

    /// Returns a view of the logarithmic kinetic energy slope of each bin.
    pub fn log_slopes(&self) -> ArrayView1<fcr> {
        self.log_slopes.view()
    }

    /// Returns `3 + s` for each bin.
    pub fn three_plus_log_slopes(&self) -> Array1<fcr> {
        self.log_slopes.mapv(|s| 3.0 + s)
    }

    /// Returns the ratio between adjacent edges of the interior bins.
    pub fn p_fix_ratio(&self) -> fcr {
        self.p_fix_ratio
    }

    pub fn mass(&self) -> fcr {
        self.mass
    }

    pub fn c(&self) -> fcr {
        self.c
    }

    /// Returns the momenta of the left and right edge of the given bin.
    pub fn bin_edges(&self, bin_idx: usize) -> (fcr, fcr) {
        (self.edges[bin_idx], self.edges[bin_idx + 1])
    }

    /// Returns the kinetic energies at the left and right edge of the given bin.
    pub fn bin_edge_energies(&self, bin_idx: usize) -> (fcr, fcr) {
        (self.edge_energies[bin_idx], self.edge_energies[bin_idx + 1])
    }

    /// Returns the ratio of the right to the left edge momentum of the given bin.
    pub fn bin_momentum_ratio(&self, bin_idx: usize) -> fcr {
        self.edges[bin_idx + 1] / self.edges[bin_idx]
    }

    /// Computes the kinetic energy of a particle with the given momentum.
    pub fn kinetic_energy(&self, momentum: fcr) -> fcr {
        kinetic_energy(momentum, self.mass, self.c)
    }

    fn compute_mid_values(edge_values: &Array1<fcr>, p_fix_ratio: fcr) -> Array1<fcr> {
        let n_bins = edge_values.len() - 1;
        let mut mid_values = Array1::zeros(n_bins);
        for idx in 1..n_bins - 1 {
            mid_values[idx] = fcr::sqrt(edge_values[idx] * edge_values[idx + 1]);
        }
        mid_values[0] = mid_values[1] / p_fix_ratio;
        mid_values[n_bins - 1] = mid_values[n_bins - 2] * p_fix_ratio;
        mid_values
    }
}

/// Computes the kinetic energy `sqrt(p^2*c^2 + m^2*c^4) - m*c^2` of a
/// particle with momentum `p` and rest mass `m`.
pub fn kinetic_energy(momentum: fcr, mass: fcr, c: fcr) -> fcr {
    let pc_squared = momentum * momentum * c * c;
    let rest_energy = mass * c * c;
    // Equivalent form without the cancellation for small momenta
    pc_squared / (fcr::sqrt(pc_squared + rest_energy * rest_energy) + rest_energy)
}
