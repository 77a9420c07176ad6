//! Modified Bessel function of the second kind, order zero.
//!
//! Polynomial approximations from Abramowitz & Stegun 9.8.1, 9.8.5 and
//! 9.8.6; absolute error below 1e-7 over the whole range.

/// I0(x) for |x| <= 3.75.
fn bessel_i0_small(x: f64) -> f64 {
    let t = (x / 3.75).powi(2);
    1.0 + t
        * (3.5156229
            + t * (3.0899424
                + t * (1.2067492 + t * (0.2659732 + t * (0.0360768 + t * 0.0045813)))))
}

/// K0(x) for x > 0. Returns +inf at 0 and NaN for negative input.
pub fn bessel_k0(x: f64) -> f64 {
    if x < 0.0 || x.is_nan() {
        return f64::NAN;
    }
    if x == 0.0 {
        return f64::INFINITY;
    }
    if x <= 2.0 {
        let t = (x / 2.0).powi(2);
        -(x / 2.0).ln() * bessel_i0_small(x) - 0.57721566
            + t * (0.42278420
                + t * (0.23069756
                    + t * (0.03488590 + t * (0.00262698 + t * (0.00010750 + t * 0.00000740)))))
    } else {
        let t = 2.0 / x;
        let poly = 1.25331414
            + t * (-0.07832358
                + t * (0.02189568
                    + t * (-0.01062446 + t * (0.00587872 + t * (-0.00251540 + t * 0.00053208)))));
        (-x).exp() / x.sqrt() * poly
    }
}
