//! Auxiliary-measurement log-density terms, per mask point.
//!
//! Each function maps one individual's auxiliary measurements to a vector
//! of additive log-density contributions over the mask, conditioned on that
//! individual's binary capture vector. Non-detection entries of the
//! auxiliary matrices are never read.
use crate::detection::DetFn;
use crate::likelihood::detprob::DetProb;
use crate::numerics::ln_bessel_i0;
use ndarray::{Array1, Array2, ArrayView1};
use statrs::function::gamma::ln_gamma;

const LN_2PI: f64 = 1.8378770664093453;

/// Time-of-arrival log terms.
///
/// Measured arrival times at detecting traps differ from the mask-point
/// implied times `distance / sound_speed` by independent normal error with
/// SD `sigma_toa`. Because absolute call time is unknown, residuals are
/// centered per mask point before squaring; the per-point contribution is
/// `(1 − k)·ln σ − ssq / (2σ²)` where `k` counts detecting traps. A single
/// detection carries no timing information and contributes zero.
pub fn toa_log_terms(
    toa: ArrayView1<'_, f64>, w: ArrayView1<'_, f64>, distances: &Array2<f64>, sound_speed: f64,
    sigma_toa: f64,
) -> Array1<f64> {
    let n_mask = distances.ncols();
    let detecting: Vec<usize> =
        w.iter().enumerate().filter(|(_, &v)| v == 1.0).map(|(t, _)| t).collect();
    let k = detecting.len() as f64;
    let mut terms = Array1::zeros(n_mask);
    if detecting.len() < 2 {
        return terms;
    }
    for m in 0..n_mask {
        let residuals: Vec<f64> =
            detecting.iter().map(|&t| toa[t] - distances[[t, m]] / sound_speed).collect();
        let mean = residuals.iter().sum::<f64>() / k;
        let ssq: f64 = residuals.iter().map(|r| (r - mean) * (r - mean)).sum();
        terms[m] = (1.0 - k) * sigma_toa.ln() - ssq / (2.0 * sigma_toa * sigma_toa);
    }
    terms
}

/// Signal-strength log terms.
///
/// A detected signal strength is normal around the expected strength at
/// the mask-point distance, conditioned on exceeding the cutoff; the
/// conditioning divides out the detection probability, hence the
/// `− log p1` correction against the already-floored log surface.
pub fn ss_log_terms(
    ss: ArrayView1<'_, f64>, w: ArrayView1<'_, f64>, detfn: &DetFn, distances: &Array2<f64>,
    surfaces: &DetProb,
) -> Array1<f64> {
    let n_mask = distances.ncols();
    let mut terms = Array1::zeros(n_mask);
    let Some((sigma_ss, _cutoff)) = detfn.signal_noise() else {
        return terms;
    };
    for m in 0..n_mask {
        let mut total = 0.0;
        for (t, &wt) in w.iter().enumerate() {
            if wt == 1.0 {
                // expected_signal is Some for every signal-strength family
                let mu = detfn.expected_signal(distances[[t, m]]).unwrap_or(0.0);
                let z = (ss[t] - mu) / sigma_ss;
                let ln_phi = -sigma_ss.ln() - 0.5 * LN_2PI - 0.5 * z * z;
                total += ln_phi - surfaces.log_p1[[t, m]];
            }
        }
        terms[m] = total;
    }
    terms
}

/// Bearing log terms.
///
/// Observed bearings follow a von Mises distribution centered on the true
/// detector-to-point bearing with concentration `kappa`:
/// `κ·cos(δ) − ln 2π − ln I₀(κ)` per detecting trap.
pub fn bearing_log_terms(
    bearing: ArrayView1<'_, f64>, w: ArrayView1<'_, f64>, bearings: &Array2<f64>, kappa: f64,
) -> Array1<f64> {
    let n_mask = bearings.ncols();
    let log_const = LN_2PI + ln_bessel_i0(kappa);
    let mut terms = Array1::zeros(n_mask);
    for m in 0..n_mask {
        let mut total = 0.0;
        for (t, &wt) in w.iter().enumerate() {
            if wt == 1.0 {
                let delta = bearing[t] - bearings[[t, m]];
                total += kappa * delta.cos() - log_const;
            }
        }
        terms[m] = total;
    }
    terms
}

/// Distance log terms.
///
/// Observed distances follow a gamma distribution with shape `alpha` and
/// mean equal to the true detector-to-point distance (`rate = α/d`):
/// `α·ln(α/d) − ln Γ(α) + (α−1)·ln x − (α/d)·x` per detecting trap.
pub fn distance_log_terms(
    dist: ArrayView1<'_, f64>, w: ArrayView1<'_, f64>, distances: &Array2<f64>, alpha: f64,
) -> Array1<f64> {
    let n_mask = distances.ncols();
    let ln_gamma_alpha = ln_gamma(alpha);
    let mut terms = Array1::zeros(n_mask);
    for m in 0..n_mask {
        let mut total = 0.0;
        for (t, &wt) in w.iter().enumerate() {
            if wt == 1.0 {
                let true_d = distances[[t, m]].max(f64::MIN_POSITIVE);
                let rate = alpha / true_d;
                let x = dist[t].max(f64::MIN_POSITIVE);
                total += alpha * rate.ln() - ln_gamma_alpha + (alpha - 1.0) * x.ln() - rate * x;
            }
        }
        terms[m] = total;
    }
    terms
}
