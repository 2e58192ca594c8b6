//! Adapter exposing one optimization stage as an `argmin` problem.
//!
//! A stage minimizes the objective over the currently active coordinates
//! only; frozen coordinates keep their values from the previous stage. Box
//! constraints are enforced by projection: each active coordinate is
//! clamped into its link-scale bounds before the objective is evaluated,
//! so the unconstrained solver can never push the model outside its
//! declared region.
use std::cell::RefCell;

use crate::optimize::driver::Objective;
use crate::optimize::errors::{OptError, OptResult};
use crate::optimize::{Cost, Grad, Theta};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges an [`Objective`] restricted to a coordinate subset to `argmin`'s
/// `CostFunction` and `Gradient` traits.
pub(crate) struct StageProblem<'a, F: Objective> {
    f: &'a F,
    /// Full free-parameter vector; inactive coordinates stay at these values.
    base: Theta,
    /// Indices into `base` that this stage optimizes.
    active: &'a [usize],
    /// Link-scale bounds over the full free vector.
    bounds: &'a [(f64, f64)],
}

// Manual impl: `F` need not be `Clone`, the objective is held by reference.
impl<'a, F: Objective> Clone for StageProblem<'a, F> {
    fn clone(&self) -> Self {
        Self { f: self.f, base: self.base.clone(), active: self.active, bounds: self.bounds }
    }
}

impl<'a, F: Objective> StageProblem<'a, F> {
    pub(crate) fn new(
        f: &'a F, base: Theta, active: &'a [usize], bounds: &'a [(f64, f64)],
    ) -> Self {
        Self { f, base, active, bounds }
    }

    /// Expand a reduced stage vector into the full free vector, clamping
    /// active coordinates into their bounds.
    pub(crate) fn embed(&self, reduced: &Theta) -> Theta {
        let mut full = self.base.clone();
        for (k, &i) in self.active.iter().enumerate() {
            let (lo, hi) = self.bounds[i];
            full[i] = reduced[k].clamp(lo, hi);
        }
        full
    }

    /// Restrict the base vector to the active coordinates.
    pub(crate) fn reduce(&self) -> Theta {
        Theta::from_iter(self.active.iter().map(|&i| self.base[i]))
    }
}

impl<'a, F: Objective> CostFunction for StageProblem<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate the objective at the embedded full vector.
    ///
    /// # Errors
    /// - [`OptError::NonFiniteCost`] if the objective returns NaN or ±∞.
    /// - Propagates model-level failures from the objective via `?`.
    fn cost(&self, reduced: &Self::Param) -> Result<Self::Output, Error> {
        let full = self.embed(reduced);
        let value = self.f.value(&full)?;
        if !value.is_finite() {
            return Err((OptError::NonFiniteCost { value }).into());
        }
        Ok(value)
    }
}

impl<'a, F: Objective> Gradient for StageProblem<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Finite-difference gradient of the stage cost.
    ///
    /// Tries central differences first; if any cost evaluation inside the
    /// finite-difference routine failed (captured through `closure_err`,
    /// since the closure cannot return `Result`) or the result fails
    /// validation, retries once with forward differences.
    ///
    /// # Errors
    /// - Propagates the first error raised by a cost evaluation.
    /// - [`OptError::GradientDimMismatch`] / [`OptError::InvalidGradient`]
    ///   when both schemes produce an unusable gradient.
    fn gradient(&self, reduced: &Self::Param) -> Result<Self::Gradient, Error> {
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let cost_fn = |t: &Theta| -> f64 {
            match self.cost(t) {
                Ok(value) => value,
                Err(e) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    f64::NAN
                }
            }
        };
        let dim = reduced.len();
        let grad = reduced.central_diff(&cost_fn);
        if closure_err.borrow().is_some() || validate_grad(&grad, dim).is_err() {
            let grad = retry_forward_diff(reduced, &cost_fn, &closure_err)?;
            return Ok(grad);
        }
        Ok(grad)
    }
}

/// Validate a gradient's length and finiteness.
pub(crate) fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "gradient entries must be finite",
            });
        }
    }
    Ok(())
}

/// Forward-difference retry with error capture.
///
/// Clears the capture cell, re-differences, and surfaces the first error
/// recorded by the cost closure before validating the result.
fn retry_forward_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, cost_fn: &G, closure_err: &RefCell<Option<Error>>,
) -> Result<Grad, Error> {
    closure_err.replace(None);
    let grad = theta.forward_diff(cost_fn);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&grad, theta.len())?;
    Ok(grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Embedding/reduction between full and stage vectors.
    // - Bound clamping inside embed.
    // - The finite-difference gradient on a smooth objective.
    // -------------------------------------------------------------------------

    struct Quadratic;

    impl Objective for Quadratic {
        fn value(&self, theta: &Theta) -> OptResult<Cost> {
            Ok(theta.iter().map(|x| x * x).sum())
        }
    }

    fn open_bounds(n: usize) -> Vec<(f64, f64)> {
        vec![(f64::NEG_INFINITY, f64::INFINITY); n]
    }

    #[test]
    // Purpose
    // -------
    // Embedding writes active coordinates into the base vector and leaves
    // frozen coordinates untouched.
    //
    // Given
    // -----
    // - Base [1, 2, 3] with only index 1 active.
    //
    // Expect
    // ------
    // - embed([9]) = [1, 9, 3]; reduce() = [2].
    fn embed_and_reduce_respect_active_subset() {
        let f = Quadratic;
        let bounds = open_bounds(3);
        let problem = StageProblem::new(&f, array![1.0, 2.0, 3.0], &[1], &bounds);
        assert_eq!(problem.embed(&array![9.0]), array![1.0, 9.0, 3.0]);
        assert_eq!(problem.reduce(), array![2.0]);
    }

    #[test]
    // Purpose
    // -------
    // Active coordinates are clamped into their bounds before evaluation.
    //
    // Given
    // -----
    // - Bounds [-1, 1] on the single active coordinate.
    //
    // Expect
    // ------
    // - embed([5]) projects to 1; the cost equals the projected value's.
    fn embed_clamps_into_bounds() {
        let f = Quadratic;
        let bounds = vec![(-1.0, 1.0)];
        let problem = StageProblem::new(&f, array![0.0], &[0], &bounds);
        assert_eq!(problem.embed(&array![5.0]), array![1.0]);
        let cost = problem.cost(&array![5.0]).expect("finite cost");
        assert!((cost - 1.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // The finite-difference gradient matches the analytic gradient of a
    // quadratic.
    //
    // Given
    // -----
    // - c(x) = Σ xᵢ² at [0.5, -0.25], both coordinates active.
    //
    // Expect
    // ------
    // - Gradient ≈ [1.0, -0.5] to 1e-5.
    fn gradient_matches_analytic() {
        let f = Quadratic;
        let bounds = open_bounds(2);
        let problem = StageProblem::new(&f, array![0.0, 0.0], &[0, 1], &bounds);
        let grad = problem.gradient(&array![0.5, -0.25]).expect("finite gradient");
        assert!((grad[0] - 1.0).abs() < 1e-5);
        assert!((grad[1] + 0.5).abs() < 1e-5);
    }
}
