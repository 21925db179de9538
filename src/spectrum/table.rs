//! Precomputed tables for looking up spectral slopes from moment ratios.

use super::{
    fcr,
    root_finding::{self, spectral_slope_root_function},
};
use ndarray::prelude::*;

/// Moment ratios of power laws with a range of slopes, tabulated for every bin.
///
/// Row `k` holds the moment ratios for slope sample `q_k`, column `j` belongs
/// to bin `j`.
#[derive(Clone, Debug)]
pub struct QTable {
    q_samples: Array1<fcr>,
    moment_ratios: Array2<fcr>,
}

impl QTable {
    /// Tabulates the moment ratios of all bins for `arr_dim_q` slope samples
    /// running from slightly below `-q_big` to slightly below `q_big`.
    ///
    /// `three_plus_s` and `s` hold the kinetic energy slope parameters of each
    /// bin, while `p_edges` holds the `n_bins + 1` bin edge momenta.
    pub fn build(
        three_plus_s: ArrayView1<fcr>,
        s: ArrayView1<fcr>,
        p_edges: ArrayView1<fcr>,
        q_big: fcr,
        arr_dim_q: usize,
    ) -> Self {
        let n_bins = s.len();
        assert_eq!(three_plus_s.len(), n_bins, "Inconsistent number of bins.");
        assert_eq!(p_edges.len(), n_bins + 1, "Inconsistent number of bin edges.");
        assert!(arr_dim_q >= 2, "Slope table needs at least two samples.");

        let q_samples = Array1::from_shape_fn(arr_dim_q, |k| {
            q_big * fcr::powf(3.0, ((k as fcr) - 1.0) / ((arr_dim_q - 1) as fcr)) - 2.0 * q_big
        });

        let moment_ratios = Array2::from_shape_fn((arr_dim_q, n_bins), |(k, j)| {
            spectral_slope_root_function(
                q_samples[k],
                three_plus_s[j],
                s[j],
                0.0,
                p_edges[j + 1] / p_edges[j],
            )
        });

        Self {
            q_samples,
            moment_ratios,
        }
    }

    /// Returns the tabulated slope samples.
    pub fn q_samples(&self) -> ArrayView1<fcr> {
        self.q_samples.view()
    }

    /// Returns the tabulated moment ratios for the given bin.
    pub fn moment_ratios(&self, bin_idx: usize) -> ArrayView1<fcr> {
        self.moment_ratios.column(bin_idx)
    }

    /// Looks up the slope giving the specified moment ratio in the given bin.
    ///
    /// The sample nearest to the moment ratio is found and the slope is
    /// linearly interpolated towards the neighbour across the flatter side.
    /// Landing on the first or last sample gives `-q_big` or `q_big`, and
    /// the returned flag is then `false`.
    pub fn interpolate_q(&self, bin_idx: usize, moment_ratio: fcr, q_big: fcr) -> (fcr, bool) {
        let ratios = self.moment_ratios(bin_idx);
        let last_idx = ratios.len() - 1;

        let mut nearest_idx = 0;
        let mut smallest_distance = fcr::INFINITY;
        for (idx, &ratio) in ratios.iter().enumerate() {
            let distance = fcr::abs(ratio - moment_ratio);
            if distance < smallest_distance {
                smallest_distance = distance;
                nearest_idx = idx;
            }
        }

        if nearest_idx == 0 {
            return (-q_big, false);
        }
        if nearest_idx == last_idx {
            return (q_big, false);
        }

        let (lower_idx, upper_idx) = if fcr::abs(ratios[nearest_idx + 1] - ratios[nearest_idx])
            <= fcr::abs(ratios[nearest_idx] - ratios[nearest_idx - 1])
        {
            (nearest_idx, nearest_idx + 1)
        } else {
            (nearest_idx - 1, nearest_idx)
        };

        let ratio_difference = ratios[upper_idx] - ratios[lower_idx];
        if ratio_difference == 0.0 {
            return (self.q_samples[nearest_idx], true);
        }
        (
            self.q_samples[lower_idx]
                + (moment_ratio - ratios[lower_idx])
                    * (self.q_samples[upper_idx] - self.q_samples[lower_idx])
                    / ratio_difference,
            true,
        )
    }
}

/// Slopes tabulated over a logarithmic axis of moment ratios, for a bin
/// with the interior momentum ratio and an ultra-relativistic energy slope.
#[derive(Clone, Debug)]
pub struct MomentRatioTable {
    moment_ratios: Array1<fcr>,
    q_values: Array1<fcr>,
}

impl MomentRatioTable {
    pub const MIN_MOMENT_RATIO: fcr = 1.000_000_05;
    const THREE_PLUS_S: fcr = 4.0;
    const INITIAL_MAX_RATIO_FACTOR: fcr = 1.1;
    const MAX_RATIO_SHRINK_FACTOR: fcr = 0.995;
    const SMALLEST_START_MAGNITUDE: fcr = 0.05;
    /// Distance from the end of the table of the entry that must be solved for.
    const PROBE_OFFSET: usize = 100;

    /// Computes the table for bins with momentum ratio `p_fix_ratio`.
    ///
    /// The upper end of the moment ratio axis starts somewhat above the
    /// largest attainable ratio and is lowered until the slope can be solved
    /// for near the top of the axis. Each entry is found by Newton-Raphson
    /// continuation from the previous one, falling back to a set of spread
    /// out start values when the continuation fails to converge.
    pub fn prepare(p_fix_ratio: fcr, q_big: fcr, arr_dim_q: usize) -> Self {
        assert!(
            arr_dim_q > Self::PROBE_OFFSET,
            "Moment ratio table needs more than {} samples.",
            Self::PROBE_OFFSET
        );
        let start_values = Self::compute_start_values(q_big, arr_dim_q / 20);

        let mut q_values = Array1::from_shape_fn(arr_dim_q, |idx| {
            if idx < arr_dim_q / 2 {
                q_big
            } else {
                -q_big
            }
        });
        let mut moment_ratios = Array1::zeros(arr_dim_q);

        let min_ratio = Self::MIN_MOMENT_RATIO;
        let mut max_ratio = Self::INITIAL_MAX_RATIO_FACTOR * p_fix_ratio;
        let probe_idx = arr_dim_q - Self::PROBE_OFFSET;

        while q_values[probe_idx] <= -q_big
            && q_values[arr_dim_q - 1] <= -q_big
            && max_ratio > min_ratio
        {
            max_ratio *= Self::MAX_RATIO_SHRINK_FACTOR;
            let log_step = fcr::log10(max_ratio / min_ratio) / (arr_dim_q as fcr);
            moment_ratios
                .indexed_iter_mut()
                .for_each(|(idx, ratio)| *ratio = min_ratio * fcr::powf(10.0, log_step * (idx as fcr)));

            Self::fill_q_values(
                &mut q_values,
                moment_ratios.view(),
                &start_values,
                p_fix_ratio,
                q_big,
            );
        }

        Self {
            moment_ratios,
            q_values,
        }
    }

    /// Returns the moment ratio axis.
    pub fn moment_ratios(&self) -> ArrayView1<fcr> {
        self.moment_ratios.view()
    }

    /// Returns the slopes tabulated along the moment ratio axis.
    pub fn q_values(&self) -> ArrayView1<fcr> {
        self.q_values.view()
    }

    /// Looks up the slope for the given moment ratio.
    ///
    /// Ratios outside the tabulated axis give the slope at the nearest end,
    /// with the returned flag set to `false`.
    pub fn interpolate_q(&self, moment_ratio: fcr) -> (fcr, bool) {
        let n = self.moment_ratios.len();
        let first_ratio = self.moment_ratios[0];
        let last_ratio = self.moment_ratios[n - 1];

        let fractional_idx = fcr::ln(moment_ratio / first_ratio) / fcr::ln(last_ratio / first_ratio)
            * ((n - 1) as fcr);
        let floored_idx = fcr::floor(fractional_idx);

        if !(floored_idx >= 0.0) {
            return (self.q_values[0], false);
        }
        if floored_idx >= ((n - 1) as fcr) {
            return (self.q_values[n - 1], false);
        }
        let idx = floored_idx as usize;

        (
            self.q_values[idx]
                + (moment_ratio - self.moment_ratios[idx])
                    * (self.q_values[idx + 1] - self.q_values[idx])
                    / (self.moment_ratios[idx + 1] - self.moment_ratios[idx]),
            true,
        )
    }

    /// Start values spaced logarithmically from `q_big` down to a small
    /// magnitude, followed by the same values negated in reverse order.
    fn compute_start_values(q_big: fcr, n_values: usize) -> Vec<fcr> {
        let n_positive = n_values / 2 - 1;
        let log_scale = fcr::ln(n_positive as fcr) / (Self::SMALLEST_START_MAGNITUDE - q_big);

        let mut start_values = vec![0.0; n_values];
        for idx in 0..n_positive {
            start_values[idx] = q_big + fcr::ln((idx + 1) as fcr) / log_scale;
        }
        for idx in 0..n_values / 2 {
            start_values[n_values - 1 - idx] = -start_values[idx];
        }
        start_values
    }

    fn fill_q_values(
        q_values: &mut Array1<fcr>,
        moment_ratios: ArrayView1<fcr>,
        start_values: &[fcr],
        p_fix_ratio: fcr,
        q_big: fcr,
    ) {
        let mut previous_solution = q_values[q_values.len() / 2];

        // The first entry is left at its initial value
        for idx in 1..q_values.len() {
            let (q, converged) = root_finding::solve_q(
                previous_solution,
                Self::THREE_PLUS_S,
                moment_ratios[idx],
                p_fix_ratio,
                q_big,
            );
            if converged {
                q_values[idx] = q;
                previous_solution = q;
            } else {
                for &start_value in &start_values[1..] {
                    let (q, converged) = root_finding::solve_q(
                        start_value,
                        Self::THREE_PLUS_S,
                        moment_ratios[idx],
                        p_fix_ratio,
                        q_big,
                    );
                    if converged {
                        q_values[idx] = q;
                    }
                }
            }
        }
    }
}
