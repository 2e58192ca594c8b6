//! Density-surface prediction from a fitted model.
use crate::inference::errors::{InferenceError, InferenceResult};
use crate::inference::fit::FitResult;
use ndarray::{Array1, Array2, ArrayView2};

/// One predicted density value, optionally with a delta-method standard
/// error on the requested scale.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityPrediction {
    pub estimate: f64,
    pub se: Option<f64>,
}

/// Predict density at new design rows.
///
/// Rows of `newdata` are design vectors over the fitted density
/// coefficients, one column per coefficient in the fit's density order;
/// uniform-density fits take a single intercept column of ones. Columns
/// listed in `zero_columns` are zeroed before evaluation, removing their
/// coefficients' contribution from the predictions. The linear predictor
/// is log density, so predictions are positive by construction. With
/// `log_scale` the log density and its standard error are returned
/// instead; otherwise the delta method scales the log-scale error by the
/// predicted density.
///
/// # Errors
/// - [`InferenceError::DesignShapeMismatch`] on a column-count mismatch
///   or an out-of-range zeroed column.
/// - [`InferenceError::CovarianceUnavailable`] when `want_se` is set on a
///   fit without a covariance matrix.
pub fn predict_density(
    fit: &FitResult, newdata: ArrayView2<'_, f64>, zero_columns: &[usize], log_scale: bool,
    want_se: bool,
) -> InferenceResult<Vec<DensityPrediction>> {
    let coef_names = density_log_coef_names(fit);
    if newdata.ncols() != coef_names.len() {
        return Err(InferenceError::DesignShapeMismatch {
            expected: coef_names.len(),
            found: newdata.ncols(),
        });
    }
    for &col in zero_columns {
        if col >= coef_names.len() {
            return Err(InferenceError::DesignShapeMismatch {
                expected: coef_names.len(),
                found: col,
            });
        }
    }
    let mut design = newdata.to_owned();
    for &col in zero_columns {
        design.column_mut(col).fill(0.0);
    }
    let newdata = design.view();

    let mut beta = Array1::zeros(coef_names.len());
    for (k, name) in coef_names.iter().enumerate() {
        beta[k] = fit.estimate(name)?;
    }

    let beta_cov = if want_se {
        let covariance = fit.covariance().ok_or(InferenceError::CovarianceUnavailable {
            reason: "prediction standard errors need the delta-method covariance",
        })?;
        let mut sub = Array2::zeros((coef_names.len(), coef_names.len()));
        let mut index = Vec::with_capacity(coef_names.len());
        for name in &coef_names {
            let k = covariance
                .names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| InferenceError::UnknownParameter { name: name.clone() })?;
            index.push(k);
        }
        for (i, &ki) in index.iter().enumerate() {
            for (j, &kj) in index.iter().enumerate() {
                sub[[i, j]] = covariance.matrix[[ki, kj]];
            }
        }
        Some(sub)
    } else {
        None
    };

    let mut out = Vec::with_capacity(newdata.nrows());
    for row in newdata.rows() {
        let log_d = row.dot(&beta);
        let se_log = beta_cov
            .as_ref()
            .map(|cov| row.dot(&cov.dot(&row.to_owned())).max(0.0).sqrt());
        let prediction = if log_scale {
            DensityPrediction { estimate: log_d, se: se_log }
        } else {
            let d = log_d.exp();
            DensityPrediction { estimate: d, se: se_log.map(|s| d * s) }
        };
        out.push(prediction);
    }
    Ok(out)
}

/// Names of the log-scale density coefficients in the fit's covariance
/// and coefficient space.
///
/// Covariate fits carry their coefficients directly on the log scale;
/// uniform fits expose the log of the density parameter as its linked
/// coefficient.
fn density_log_coef_names(fit: &FitResult) -> Vec<String> {
    if fit.meta().density_has_covariates {
        fit.density_names().to_vec()
    } else {
        vec!["D_link".to_string()]
    }
}
