//! Coefficient and covariance selection from a fitted model.
use crate::inference::errors::{InferenceError, InferenceResult};
use crate::inference::fit::{Covariance, DerivedKind, FitResult};
use ndarray::Array2;

/// A selection of coefficients.
///
/// Selections compose as a union that preserves the fit's coefficient
/// order, so requesting overlapping sets never duplicates an entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CoefSet {
    /// Every coefficient: fitted, derived, and linked.
    All,
    /// Model parameters on the natural scale, fixed included.
    Fitted,
    /// Derived quantities such as effective survey areas.
    Derived,
    /// Free parameters on the link scale.
    Linked,
    /// Effective survey areas only.
    Esa,
    /// Explicitly named coefficients from anywhere in the space.
    Names(Vec<String>),
}

/// Extract the union of the requested coefficient sets, in the fit's
/// coefficient order. A single explicit name list is returned in the
/// requested order instead.
///
/// # Errors
/// - [`InferenceError::UnknownParameter`] when a `Names` entry does not
///   exist in this fit.
pub fn coef(fit: &FitResult, sets: &[CoefSet]) -> InferenceResult<Vec<(String, f64)>> {
    let names = fit.coef_names();
    let values = fit.coef_values();
    Ok(selected_indices(fit, sets)?
        .into_iter()
        .map(|i| (names[i].clone(), values[i]))
        .collect())
}

/// Extract the variance-covariance submatrix over the same selections as
/// [`coef`], with matching row/column labels.
///
/// With bootstrap draws attached the matrix is the sample covariance of
/// the draws; otherwise the delta-method covariance is used.
///
/// # Errors
/// - [`InferenceError::UnknownParameter`] when a `Names` entry does not
///   exist in this fit.
/// - [`InferenceError::CovarianceUnavailable`] when the fit carries
///   neither draws nor a covariance matrix.
pub fn vcov(fit: &FitResult, sets: &[CoefSet]) -> InferenceResult<Covariance> {
    let picked = selected_indices(fit, sets)?;
    let coef_names = fit.coef_names();

    let (source_names, source) = if let Some(draws) = fit.draws() {
        (draws.names.clone(), draws_covariance(&draws.draws))
    } else if let Some(covariance) = fit.covariance() {
        (covariance.names.clone(), covariance.matrix.clone())
    } else {
        return Err(InferenceError::CovarianceUnavailable {
            reason: "covariance extraction needs a covariance matrix or bootstrap draws",
        });
    };

    let mut index = Vec::with_capacity(picked.len());
    let mut names = Vec::with_capacity(picked.len());
    for &i in &picked {
        let k = source_names
            .iter()
            .position(|n| *n == coef_names[i])
            .ok_or_else(|| InferenceError::UnknownParameter { name: coef_names[i].clone() })?;
        index.push(k);
        names.push(coef_names[i].clone());
    }
    let mut matrix = Array2::zeros((index.len(), index.len()));
    for (a, &ka) in index.iter().enumerate() {
        for (b, &kb) in index.iter().enumerate() {
            matrix[[a, b]] = source[[ka, kb]];
        }
    }
    Ok(Covariance { names, matrix })
}

/// Sample covariance of the bootstrap draw columns, `B − 1` denominator.
fn draws_covariance(draws: &Array2<f64>) -> Array2<f64> {
    let b = draws.nrows() as f64;
    let p = draws.ncols();
    let means: Vec<f64> = (0..p).map(|k| draws.column(k).sum() / b).collect();
    let mut cov = Array2::zeros((p, p));
    for i in 0..p {
        for j in 0..=i {
            let mut acc = 0.0;
            for r in 0..draws.nrows() {
                acc += (draws[[r, i]] - means[i]) * (draws[[r, j]] - means[j]);
            }
            let v = acc / (b - 1.0);
            cov[[i, j]] = v;
            cov[[j, i]] = v;
        }
    }
    cov
}

/// Positions of the selected coefficients in the full coefficient order,
/// with the lone-explicit-list ordering rule shared by [`coef`] and
/// [`vcov`].
fn selected_indices(fit: &FitResult, sets: &[CoefSet]) -> InferenceResult<Vec<usize>> {
    let names = fit.coef_names();
    let n_fitted = fit.fitted().len();
    let n_derived = fit.derived().len();

    // a lone explicit list preserves the caller's order
    if let [CoefSet::Names(requested)] = sets {
        return requested
            .iter()
            .map(|name| {
                names
                    .iter()
                    .position(|n| n == name)
                    .ok_or_else(|| InferenceError::UnknownParameter { name: name.clone() })
            })
            .collect();
    }

    let mut wanted = vec![false; names.len()];
    for set in sets {
        match set {
            CoefSet::All => wanted.iter_mut().for_each(|w| *w = true),
            CoefSet::Fitted => wanted[..n_fitted].iter_mut().for_each(|w| *w = true),
            CoefSet::Derived => {
                wanted[n_fitted..n_fitted + n_derived].iter_mut().for_each(|w| *w = true)
            }
            CoefSet::Linked => {
                wanted[n_fitted + n_derived..].iter_mut().for_each(|w| *w = true)
            }
            CoefSet::Esa => {
                for (k, (_, kind, _)) in fit.derived().iter().enumerate() {
                    if *kind == DerivedKind::Esa {
                        wanted[n_fitted + k] = true;
                    }
                }
            }
            CoefSet::Names(requested) => {
                for name in requested {
                    let i = names.iter().position(|n| n == name).ok_or_else(|| {
                        InferenceError::UnknownParameter { name: name.clone() }
                    })?;
                    wanted[i] = true;
                }
            }
        }
    }

    Ok(wanted
        .iter()
        .enumerate()
        .filter(|(_, w)| **w)
        .map(|(i, _)| i)
        .collect())
}
