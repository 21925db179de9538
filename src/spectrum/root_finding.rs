//! Newton-Raphson solution for the spectral slope of a bin.

use super::fcr;

/// Maximum number of Newton-Raphson iterations.
pub const MAX_ITERATIONS: usize = 30;

/// The iteration has converged when the correction is smaller than this.
pub const CORRECTION_TOLERANCE: fcr = 1e-9;

/// Slopes closer than this to a singular point of the general moment ratio
/// expression are evaluated with the corresponding limiting expression.
pub const SINGULARITY_EPSILON: fcr = 1e-3;

/// Which expression to use for the moment ratio of a power law with a given slope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SingularityCase {
    /// Slope close to 3, where the number density integral becomes logarithmic.
    Logarithmic,
    /// Slope close to `3 + s`, where the energy density integral becomes logarithmic.
    Degenerate,
    /// Any other slope.
    General,
}

impl SingularityCase {
    /// Determines the applicable case for slope `q` in a bin where the
    /// kinetic energy scales as `p^s`.
    pub fn classify(q: fcr, three_plus_s: fcr) -> Self {
        if fcr::abs(q - 3.0) < SINGULARITY_EPSILON {
            Self::Logarithmic
        } else if fcr::abs(q - three_plus_s) < SINGULARITY_EPSILON {
            Self::Degenerate
        } else {
            Self::General
        }
    }
}

/// Evaluates the moment ratio `e/(n*T_l)` of a power law with slope `q` in a
/// bin with momentum ratio `p_ratio = p_r/p_l`, where the kinetic energy scales
/// as `p^s`, and subtracts the given target moment ratio.
///
/// With a target of zero this returns the moment ratio itself.
pub fn spectral_slope_root_function(
    q: fcr,
    three_plus_s: fcr,
    s: fcr,
    moment_ratio: fcr,
    p_ratio: fcr,
) -> fcr {
    let power_law_ratio = match SingularityCase::classify(q, three_plus_s) {
        SingularityCase::Logarithmic => {
            (fcr::powf(p_ratio, s) - 1.0) / (s * fcr::ln(p_ratio))
        }
        SingularityCase::Degenerate => {
            let p_ratio_to_s = fcr::powf(p_ratio, s);
            s * fcr::ln(p_ratio) * p_ratio_to_s / (p_ratio_to_s - 1.0)
        }
        SingularityCase::General => {
            ((3.0 - q) / (three_plus_s - q))
                * ((fcr::powf(p_ratio, three_plus_s - q) - 1.0)
                    / (fcr::powf(p_ratio, 3.0 - q) - 1.0))
        }
    };
    power_law_ratio - moment_ratio
}

/// Finds the slope `q` for which the power-law moment ratio in a bin equals the
/// given moment ratio, starting the Newton-Raphson iteration at `q_start`.
///
/// Returns the final slope estimate together with whether the iteration
/// converged. When the iterate leaves `[-q_big, q_big]` it is clamped to the
/// nearest bound and reported as not converged. The returned slope is usable
/// in either case.
pub fn solve_q(
    q_start: fcr,
    three_plus_s: fcr,
    moment_ratio: fcr,
    p_ratio: fcr,
    q_big: fcr,
) -> (fcr, bool) {
    let s = three_plus_s - 3.0;
    let evaluate =
        |q: fcr| spectral_slope_root_function(q, three_plus_s, s, moment_ratio, p_ratio);

    let mut q = q_start;

    for _ in 0..MAX_ITERATIONS {
        if fcr::abs(q) >= q_big {
            return (fcr::signum(q) * q_big, false);
        }

        let dq = fcr::min(fcr::max(fcr::abs(q * 1e-3), 1e-10), 0.1);
        let derivative = 0.5 * (evaluate(q + dq) - evaluate(q - dq)) / dq;

        let correction = -evaluate(q) / derivative;

        if !correction.is_finite() {
            // Flat or undefined function, Newton-Raphson cannot proceed
            return (q, false);
        }
        if fcr::abs(correction) <= CORRECTION_TOLERANCE {
            return (q, true);
        }
        q += correction;
    }
    if fcr::abs(q) >= q_big {
        (fcr::signum(q) * q_big, false)
    } else {
        (q, false)
    }
}
