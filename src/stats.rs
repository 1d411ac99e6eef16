//! Two-sample significance testing and the numeric helpers behind it.
//!
//! The p-value comes from the regularized incomplete beta function,
//! evaluated with Lentz's continued-fraction method. Tolerances here are
//! far tighter than anything the portfolio comparisons need.

use serde::Serialize;

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Unbiased sample variance (n - 1 denominator). `None` with fewer than
/// two values.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_of_squares: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
    Some(sum_of_squares / (values.len() - 1) as f64)
}

/// Sample standard deviation. `None` with fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Result of a two-sample Welch t-test.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TwoSampleTTest {
    pub t_stat: f64,
    pub df: f64,
    pub p_value: f64,
}

impl TwoSampleTTest {
    /// Whether the difference is significant at level `alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Welch's unequal-variances t-test, two-sided.
///
/// `None` when either sample has fewer than two values or when both
/// samples are constant (the standard error degenerates to zero).
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Option<TwoSampleTTest> {
    if a.len() < 2 || b.len() < 2 {
        return None;
    }

    let (mean_a, mean_b) = (mean(a)?, mean(b)?);
    let (var_a, var_b) = (sample_variance(a)?, sample_variance(b)?);
    let (n_a, n_b) = (a.len() as f64, b.len() as f64);

    let spread_a = var_a / n_a;
    let spread_b = var_b / n_b;
    let std_error = (spread_a + spread_b).sqrt();
    if std_error == 0.0 {
        return None;
    }

    let t_stat = (mean_a - mean_b) / std_error;
    // Welch-Satterthwaite degrees of freedom.
    let df = (spread_a + spread_b).powi(2)
        / (spread_a.powi(2) / (n_a - 1.0) + spread_b.powi(2) / (n_b - 1.0));
    let p_value = two_sided_p(t_stat, df);

    Some(TwoSampleTTest {
        t_stat,
        df,
        p_value,
    })
}

/// Two-sided p-value for a t statistic with `df` degrees of freedom:
/// I_x(df/2, 1/2) at x = df / (df + t^2).
fn two_sided_p(t_stat: f64, df: f64) -> f64 {
    let x = df / (df + t_stat * t_stat);
    regularized_incomplete_beta(df / 2.0, 0.5, x).clamp(0.0, 1.0)
}

/// Regularized incomplete beta function I_x(a, b).
fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front =
        ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    // The continued fraction converges fast only on one side of the mean
    // of the distribution; use the symmetry relation on the other side.
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Continued-fraction expansion of the incomplete beta function, evaluated
/// with Lentz's method.
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITERATIONS: usize = 200;
    const EPSILON: f64 = 1e-14;
    const TINY: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITERATIONS {
        let m = m as f64;
        let m2 = 2.0 * m;

        let even_step = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + even_step * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + even_step / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let odd_step = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + odd_step * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + odd_step / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }

    h
}

/// Lanczos approximation of ln(gamma(x)) for x > 0.
fn ln_gamma(x: f64) -> f64 {
    const COEFFICIENTS: [f64; 6] = [
        76.180_091_729_471_46,
        -86.505_320_329_416_77,
        24.014_098_240_830_91,
        -1.231_739_572_450_155,
        1.208_650_973_866_179e-3,
        -5.395_239_384_953e-6,
    ];

    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut denominator = x;
    let mut series = 1.000_000_000_190_015;
    for coefficient in COEFFICIENTS {
        denominator += 1.0;
        series += coefficient / denominator;
    }
    -tmp + (2.506_628_274_631_000_5 * series / x).ln()
}
