//! Numerical stability utilities.
//!
//! Provides guarded implementations of the nonlinear transforms and
//! reductions the likelihood and inference layers lean on: stable
//! logit/logistic pairs for probability-valued parameters, a log-sum-exp
//! reduction for mask integration, the log modified Bessel function `ln I₀`
//! used by the von Mises bearing density, and an empirical quantile helper
//! for bootstrap confidence intervals.
//!
//! # Provided items
//! - [`LOG_FLOOR`]: the additive ε applied before taking logs of detection
//!   probabilities, keeping the likelihood finite at probability 0. This is
//!   an implementation guard and must never surface in user-visible errors.
//! - [`EIGEN_EPS`]: eigenvalue floor below which the observed information is
//!   treated as singular when inverting the Hessian.
//! - [`safe_logit`] / [`safe_logistic`]: bidirectional (0, 1) ↔ ℝ transforms
//!   with clamping away from the endpoints.
//! - [`log_sum_exp`]: overflow-free `ln Σ exp(xᵢ)`.
//! - [`ln_bessel_i0`]: `ln I₀(x)` via the Abramowitz & Stegun polynomial
//!   approximations.
//! - [`quantile`]: linear-interpolation empirical quantile on a sorted copy.
//! - [`std_normal_quantile`]: inverse standard-normal CDF via `erf_inv`.

use ndarray::ArrayView1;
use statrs::function::erf::erf_inv;

/// Additive floor applied before `ln` of a detection probability.
///
/// `log(p + LOG_FLOOR)` stays finite when a detection function returns
/// exactly 0 or 1 at some mask point. The floor is far below any probability
/// the optimizer can distinguish, so it perturbs no finite likelihood value.
pub const LOG_FLOOR: f64 = f64::MIN_POSITIVE;

/// Eigenvalue threshold for treating the observed information as singular.
///
/// Eigenvalues with magnitude at most this value are considered numerically
/// nonpositive when inverting the Hessian into a covariance matrix.
pub const EIGEN_EPS: f64 = 1e-10;

/// Clamp bound keeping logit arguments strictly inside (0, 1).
const LOGIT_EPS: f64 = 1e-15;

/// Numerically stable logit: `ln(p / (1 − p))` with endpoint clamping.
///
/// Inputs are clamped to `[LOGIT_EPS, 1 − LOGIT_EPS]` so that probability
/// parameters sitting exactly on a bound map to large finite link values
/// rather than ±∞.
pub fn safe_logit(p: f64) -> f64 {
    let p = p.clamp(LOGIT_EPS, 1.0 - LOGIT_EPS);
    (p / (1.0 - p)).ln()
}

/// Numerically stable logistic: inverse of [`safe_logit`].
///
/// Evaluates `1 / (1 + exp(−x))` through the branch that never
/// exponentiates a large positive argument.
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Overflow-free `ln Σᵢ exp(xᵢ)` over a vector view.
///
/// Subtracts the maximum before exponentiating. Returns `-∞` for an empty
/// view or when every element is `-∞`, which is the correct limit for a
/// log-integral with no mass.
pub fn log_sum_exp(xs: ArrayView1<'_, f64>) -> f64 {
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    let sum: f64 = xs.iter().map(|&x| (x - max).exp()).sum();
    max + sum.ln()
}

/// `ln I₀(x)` — log of the modified Bessel function of order zero.
///
/// Uses the Abramowitz & Stegun 9.8.1 polynomial for `|x| ≤ 3.75` and the
/// 9.8.2 large-argument expansion otherwise, so the von Mises normalizing
/// constant stays finite for large concentration values.
pub fn ln_bessel_i0(x: f64) -> f64 {
    let ax = x.abs();
    if ax <= 3.75 {
        let t = (x / 3.75) * (x / 3.75);
        let i0 = 1.0
            + t * (3.5156229
                + t * (3.0899424
                    + t * (1.2067492 + t * (0.2659732 + t * (0.0360768 + t * 0.0045813)))));
        i0.ln()
    } else {
        let t = 3.75 / ax;
        let poly = 0.39894228
            + t * (0.01328592
                + t * (0.00225319
                    + t * (-0.00157565
                        + t * (0.00916281
                            + t * (-0.02057706
                                + t * (0.02635537 + t * (-0.01647633 + t * 0.00392377)))))));
        ax - 0.5 * ax.ln() + poly.ln()
    }
}

/// Empirical quantile with linear interpolation between order statistics.
///
/// `prob` must lie in `[0, 1]`; the input need not be sorted (a sorted copy
/// is taken). This matches the conventional "type 7" definition, so
/// percentile bootstrap bounds are non-decreasing in `prob`.
pub fn quantile(xs: &[f64], prob: f64) -> f64 {
    debug_assert!((0.0..=1.0).contains(&prob));
    debug_assert!(!xs.is_empty());
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = prob * (n as f64 - 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = h - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Inverse standard-normal CDF.
///
/// `Φ⁻¹(p) = √2 · erf⁻¹(2p − 1)`; used for Wald interval critical values.
pub fn std_normal_quantile(p: f64) -> f64 {
    std::f64::consts::SQRT_2 * erf_inv(2.0 * p - 1.0)
}
