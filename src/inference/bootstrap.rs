//! Parametric-free bootstrap over capture histories.
use crate::inference::errors::{InferenceError, InferenceResult};
use crate::inference::fit::{BootstrapDraws, FitResult};
use crate::likelihood::ScrModel;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::debug;

/// Nonparametric bootstrap: resample individuals within each session,
/// refit, and attach the coefficient draws to the fit.
///
/// Replicates run in parallel; replicate `i` draws from an RNG seeded
/// with `seed + i`, so results are reproducible independently of thread
/// scheduling. Refits skip Hessian work. The returned fit is `fit` with
/// the draw matrix attached, switching [`FitResult::std_errors`] to
/// bootstrap standard errors.
///
/// # Errors
/// - [`InferenceError::InvalidBootstrapCount`] for fewer than 2
///   replicates.
/// - [`InferenceError::BootstrapRefitFailed`] as soon as any replicate
///   fails to refit.
pub fn bootstrap(
    model: &ScrModel, fit: &FitResult, n_boot: usize, seed: u64,
) -> InferenceResult<FitResult> {
    if n_boot < 2 {
        return Err(InferenceError::InvalidBootstrapCount { n_boot });
    }
    let names = fit.coef_names();

    let rows: Vec<Vec<f64>> = (0..n_boot)
        .into_par_iter()
        .map(|index| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
            let replicate = model.resampled(&mut rng);
            let refit = replicate.fit_quick().map_err(|e| {
                InferenceError::BootstrapRefitFailed { index, text: e.to_string() }
            })?;
            debug!(replicate = index, nll = refit.nll(), "bootstrap replicate refit");
            Ok(refit.coef_values())
        })
        .collect::<InferenceResult<Vec<Vec<f64>>>>()?;

    let mut draws = Array2::zeros((n_boot, names.len()));
    for (i, row) in rows.iter().enumerate() {
        for (k, value) in row.iter().enumerate() {
            draws[[i, k]] = *value;
        }
    }
    Ok(fit.clone().with_draws(BootstrapDraws { names, draws }))
}
