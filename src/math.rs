//! Math utilities.

/// Floating-point precision to use for integration.
#[allow(non_camel_case_types)]
pub type fin = f64;

/// Estimates the integral of the given function over the given interval using a
/// five-point Gauss-Legendre quadrature.
pub fn integrate_five_point_gauss_legendre<E>(evaluate_integrand: E, start: fin, end: fin) -> fin
where
    E: Fn(fin) -> fin,
{
    const COORD_1: fin = -0.906_179_845_938_664; // -(1/3)*sqrt(5 + 2*sqrt(10/7))
    const COORD_2: fin = -0.538_469_310_105_683; // -(1/3)*sqrt(5 - 2*sqrt(10/7))
    const COORD_3: fin = 0.0;
    const COORD_4: fin = -COORD_2; // (1/3)*sqrt(5 - 2*sqrt(10/7))
    const COORD_5: fin = -COORD_1; // (1/3)*sqrt(5 + 2*sqrt(10/7))

    const WEIGHT_1: fin = 0.236_926_885_056_189_08; // (322 - 13*sqrt(70))/900
    const WEIGHT_2: fin = 0.478_628_670_499_366_47; // (322 + 13*sqrt(70))/900
    const WEIGHT_3: fin = 128.0 / 225.0;
    const WEIGHT_4: fin = WEIGHT_2; // (322 + 13*sqrt(70))/900
    const WEIGHT_5: fin = WEIGHT_1; // (322 - 13*sqrt(70))/900

    assert!(
        end >= start,
        "Interval end {:?} is smaller than interval start {:?}",
        end,
        start
    );
    let interval_scale = 0.5 * (end - start);
    let interval_offset = 0.5 * (end + start);

    interval_scale
        * (WEIGHT_1 * evaluate_integrand(interval_offset + interval_scale * COORD_1)
            + WEIGHT_2 * evaluate_integrand(interval_offset + interval_scale * COORD_2)
            + WEIGHT_3 * evaluate_integrand(interval_offset + interval_scale * COORD_3)
            + WEIGHT_4 * evaluate_integrand(interval_offset + interval_scale * COORD_4)
            + WEIGHT_5 * evaluate_integrand(interval_offset + interval_scale * COORD_5))
}

/// Estimates the integral of the given function over the given positive
/// interval by splitting the interval into subintervals of equal logarithmic
/// width and applying a five-point Gauss-Legendre quadrature in `ln(x)` to each.
///
/// Suited for integrands that behave like power laws over many decades.
pub fn integrate_logarithmically<E>(
    evaluate_integrand: E,
    start: fin,
    end: fin,
    n_subintervals: usize,
) -> fin
where
    E: Fn(fin) -> fin,
{
    assert!(
        start > 0.0 && end >= start,
        "Logarithmic integration requires 0 < start <= end (got {:?} and {:?})",
        start,
        end
    );
    assert!(n_subintervals > 0, "Number of subintervals must be positive.");

    let ln_start = fin::ln(start);
    let ln_width = (fin::ln(end) - ln_start) / (n_subintervals as fin);

    // Substituting x = exp(u) gives dx = x du
    let evaluate_transformed_integrand = |u: fin| {
        let x = fin::exp(u);
        evaluate_integrand(x) * x
    };

    (0..n_subintervals)
        .map(|idx| {
            let sub_start = ln_start + (idx as fin) * ln_width;
            integrate_five_point_gauss_legendre(
                evaluate_transformed_integrand,
                sub_start,
                sub_start + ln_width,
            )
        })
        .sum()
}
