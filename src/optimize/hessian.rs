//! Finite-difference Hessians and their inversion into covariance matrices.
use crate::numerics::EIGEN_EPS;
use crate::optimize::errors::{OptError, OptResult};
use crate::optimize::{Grad, Hessian, Theta};
use finitediff::FiniteDiff;
use nalgebra::DMatrix;
use ndarray::Array2;

/// Validate a Hessian's shape and finiteness.
pub(crate) fn validate_hessian(hessian: &Hessian, dim: usize) -> OptResult<()> {
    if hessian.nrows() != dim || hessian.ncols() != dim {
        return Err(OptError::HessianDimMismatch {
            expected: dim,
            found: (hessian.nrows(), hessian.ncols()),
        });
    }
    for ((row, col), &value) in hessian.indexed_iter() {
        if !value.is_finite() {
            return Err(OptError::InvalidHessian { row, col, value });
        }
    }
    Ok(())
}

/// Average off-diagonal pairs in place so the matrix is exactly symmetric.
fn symmetrize(hessian: &mut Hessian) {
    let n = hessian.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            let avg = 0.5 * (hessian[[i, j]] + hessian[[j, i]]);
            hessian[[i, j]] = avg;
            hessian[[j, i]] = avg;
        }
    }
}

/// Finite-difference Hessian of a scalar objective at `theta`.
///
/// Differentiates a forward-difference gradient with central differences,
/// then symmetrizes. Falls back to a forward-difference Hessian when the
/// central approximation fails validation.
///
/// # Errors
/// - [`OptError::HessianDimMismatch`] / [`OptError::InvalidHessian`] when
///   both schemes produce an unusable matrix.
pub fn compute_hessian<G: Fn(&Theta) -> f64>(cost: &G, theta: &Theta) -> OptResult<Hessian> {
    let grad_fn = |t: &Theta| -> Grad { t.forward_diff(cost) };
    let dim = theta.len();
    let mut hessian = theta.central_hessian(&grad_fn);
    symmetrize(&mut hessian);
    if validate_hessian(&hessian, dim).is_err() {
        hessian = theta.forward_hessian(&grad_fn);
        symmetrize(&mut hessian);
        validate_hessian(&hessian, dim)?;
    }
    Ok(hessian)
}

/// Invert an observed-information matrix into a covariance matrix.
///
/// Uses a symmetric eigendecomposition; every eigenvalue must exceed
/// [`EIGEN_EPS`], otherwise the information is treated as singular and the
/// caller records the fit as having no usable covariance.
///
/// # Errors
/// - [`OptError::SingularHessian`] carrying the minimum eigenvalue when
///   the matrix is numerically nonpositive along any direction.
/// - [`OptError::HessianDimMismatch`] / [`OptError::InvalidHessian`] on a
///   malformed input.
pub fn covariance_from_hessian(hessian: &Hessian) -> OptResult<Array2<f64>> {
    let n = hessian.nrows();
    validate_hessian(hessian, n)?;
    let mut dense = DMatrix::<f64>::zeros(n, n);
    for j in 0..n {
        for i in 0..n {
            dense[(i, j)] = hessian[[i, j]];
        }
    }
    let eigen = dense.symmetric_eigen();
    let min_eigenvalue =
        eigen.eigenvalues.iter().copied().fold(f64::INFINITY, f64::min);
    if min_eigenvalue <= EIGEN_EPS {
        return Err(OptError::SingularHessian { min_eigenvalue });
    }
    let q = eigen.eigenvectors;
    let mut covariance = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            covariance[[i, j]] = eigen
                .eigenvalues
                .iter()
                .enumerate()
                .map(|(k, &lambda)| q[(i, k)] * q[(j, k)] / lambda)
                .sum();
        }
    }
    Ok(covariance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Finite-difference Hessians of quadratics with known curvature.
    // - Covariance inversion against analytic inverses.
    // - The singular-information rejection path.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // The finite-difference Hessian of a quadratic matches its constant
    // analytic Hessian.
    //
    // Given
    // -----
    // - c(x, y) = 2x² + xy + y² with Hessian [[4, 1], [1, 2]].
    //
    // Expect
    // ------
    // - Entrywise agreement to 1e-4 and exact symmetry.
    fn hessian_of_quadratic_matches_analytic() {
        let cost = |t: &Theta| 2.0 * t[0] * t[0] + t[0] * t[1] + t[1] * t[1];
        let theta = array![0.3, -0.7];
        let h = compute_hessian(&cost, &theta).expect("valid Hessian");
        assert!((h[[0, 0]] - 4.0).abs() < 1e-4);
        assert!((h[[0, 1]] - 1.0).abs() < 1e-4);
        assert!((h[[1, 1]] - 2.0).abs() < 1e-4);
        assert_eq!(h[[0, 1]], h[[1, 0]]);
    }

    #[test]
    // Purpose
    // -------
    // Covariance inversion matches the analytic inverse of a diagonal
    // information matrix.
    //
    // Given
    // -----
    // - Information diag(4, 1).
    //
    // Expect
    // ------
    // - Covariance diag(0.25, 1.0) with zero off-diagonals.
    fn covariance_matches_analytic_inverse() {
        let info = array![[4.0, 0.0], [0.0, 1.0]];
        let cov = covariance_from_hessian(&info).expect("invertible");
        assert!((cov[[0, 0]] - 0.25).abs() < 1e-10);
        assert!((cov[[1, 1]] - 1.0).abs() < 1e-10);
        assert!(cov[[0, 1]].abs() < 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // A rank-deficient information matrix is reported as singular rather
    // than silently pseudoinverted.
    //
    // Given
    // -----
    // - The rank-1 matrix [[1, 1], [1, 1]].
    //
    // Expect
    // ------
    // - SingularHessian with a minimum eigenvalue at numerical zero.
    fn singular_information_is_rejected() {
        let info = array![[1.0, 1.0], [1.0, 1.0]];
        match covariance_from_hessian(&info) {
            Err(OptError::SingularHessian { min_eigenvalue }) => {
                assert!(min_eigenvalue.abs() < 1e-8);
            }
            other => panic!("expected SingularHessian, got {other:?}"),
        }
    }
}
