//! Phased constrained minimization driver.
use std::str::FromStr;

use crate::optimize::adapter::StageProblem;
use crate::optimize::errors::{OptError, OptResult};
use crate::optimize::hessian::compute_hessian;
use crate::optimize::{
    Cost, FnEvalMap, Grad, Hessian, LbfgsHagerZhang, LbfgsMoreThuente, Theta,
    DEFAULT_LBFGS_MEM,
};
use argmin::core::{Executor, State, TerminationReason, TerminationStatus};
use argmin::solver::linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch};
use argmin::solver::quasinewton::LBFGS;

/// Model-side objective interface.
///
/// Implementors evaluate the cost to minimize (a negative log-likelihood)
/// at a full free-parameter vector on the link scale. Gradients are always
/// obtained by finite differences inside the driver, so no gradient method
/// exists here.
pub trait Objective {
    /// Evaluate the cost at `theta`.
    ///
    /// # Errors
    /// Return a descriptive [`OptError`] for invalid inputs or model
    /// failures; the driver aborts the stage on the first error.
    fn value(&self, theta: &Theta) -> OptResult<Cost>;

    /// One-time validation hook run before the first stage.
    fn check(&self, theta: &Theta) -> OptResult<()> {
        let _ = theta;
        Ok(())
    }
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Parses case-insensitively from `"MoreThuente"` or `"HagerZhang"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Numerical tolerances and iteration limits.
///
/// At least one of the three fields must be provided; tolerances must be
/// finite and strictly positive when present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        if let Some(tol) = tol_grad {
            if !tol.is_finite() || tol <= 0.0 {
                return Err(OptError::InvalidTolGrad {
                    tol,
                    reason: "Gradient tolerance must be finite and positive.",
                });
            }
        }
        if let Some(tol) = tol_cost {
            if !tol.is_finite() || tol <= 0.0 {
                return Err(OptError::InvalidTolCost {
                    tol,
                    reason: "Cost change tolerance must be finite and positive.",
                });
            }
        }
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Driver-level configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizeOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub lbfgs_mem: Option<usize>,
}

impl MinimizeOptions {
    /// Create validated options.
    ///
    /// # Errors
    /// - [`OptError::InvalidLbfgsMem`] when `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(mem) = lbfgs_mem {
            if mem == 0 {
                return Err(OptError::InvalidLbfgsMem {
                    mem,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self { tols, line_searcher, lbfgs_mem })
    }
}

impl Default for MinimizeOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(300) },
            line_searcher: LineSearcher::MoreThuente,
            lbfgs_mem: None,
        }
    }
}

/// Result of a phased minimization run.
///
/// - `theta_hat`: best full free-parameter vector, clamped into bounds.
/// - `value`: cost at `theta_hat`.
/// - `converged`: whether the final stage met a solver tolerance or the
///   target cost; exhausting the iteration budget does not count.
/// - `status`: human-readable termination status of the final stage.
/// - `iterations` / `fn_evals`: summed over all stages.
/// - `hessian`: finite-difference Hessian at `theta_hat` over the full
///   free vector, when requested and computable.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizeOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub hessian: Option<Hessian>,
}

/// Minimize an objective over a phased, box-constrained free vector.
///
/// Phases run in ascending order; each stage optimizes the coordinates
/// whose phase number is at most the current phase while later-phase
/// coordinates stay frozen at their running values. The final stage always
/// covers every coordinate, so earlier phases serve only to produce good
/// starting values for hard-to-identify parameters.
///
/// # Arguments
/// - `f`: the model objective.
/// - `start`: link-scale starting vector over the free parameters.
/// - `bounds`: per-coordinate link-scale bounds, enforced by projection.
/// - `phases`: per-coordinate phase numbers, all `>= 0`.
/// - `opts`: solver configuration.
/// - `want_hessian`: compute the finite-difference Hessian at the optimum.
///
/// # Errors
/// - [`OptError::LayoutMismatch`] when `bounds` or `phases` disagree with
///   `start` in length.
/// - [`OptError::NoFreeParameters`] for an empty start vector.
/// - Any objective or solver failure from an individual stage.
///
/// # Notes
/// A Hessian request that fails inversion-side validation propagates as an
/// error here; singularity itself is detected later when the covariance is
/// formed, not at this point.
pub fn minimize<F: Objective>(
    f: &F, start: Theta, bounds: &[(f64, f64)], phases: &[i32], opts: &MinimizeOptions,
    want_hessian: bool,
) -> OptResult<MinimizeOutcome> {
    let dim = start.len();
    if dim == 0 {
        return Err(OptError::NoFreeParameters);
    }
    if bounds.len() != dim {
        return Err(OptError::LayoutMismatch {
            what: "bounds",
            expected: dim,
            found: bounds.len(),
        });
    }
    if phases.len() != dim {
        return Err(OptError::LayoutMismatch {
            what: "phases",
            expected: dim,
            found: phases.len(),
        });
    }
    f.check(&start)?;

    let mut stage_phases: Vec<i32> = phases.to_vec();
    stage_phases.sort_unstable();
    stage_phases.dedup();

    let mut base = start;
    let mut converged = false;
    let mut status = String::new();
    let mut iterations = 0;
    let mut fn_evals = FnEvalMap::new();
    let mut value = f64::NAN;

    for &stage in &stage_phases {
        let active: Vec<usize> =
            (0..dim).filter(|&i| phases[i] <= stage).collect();
        let problem = StageProblem::new(f, base.clone(), &active, bounds);
        let reduced_start = problem.reduce();
        let stage_result = match opts.line_searcher {
            LineSearcher::MoreThuente => {
                let ls = MoreThuenteLineSearch::new();
                let solver: LbfgsMoreThuente =
                    configure_lbfgs(LBFGS::new(ls, opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM)), opts)?;
                run_stage(reduced_start, opts, problem.clone(), solver)?
            }
            LineSearcher::HagerZhang => {
                let ls = HagerZhangLineSearch::new();
                let solver: LbfgsHagerZhang =
                    configure_lbfgs(LBFGS::new(ls, opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM)), opts)?;
                run_stage(reduced_start, opts, problem.clone(), solver)?
            }
        };
        base = problem.embed(&stage_result.theta_hat);
        value = stage_result.value;
        converged = stage_result.converged;
        status = stage_result.status;
        iterations += stage_result.iterations;
        for (key, count) in stage_result.fn_evals {
            *fn_evals.entry(key).or_insert(0) += count;
        }
    }

    validate_theta(&base)?;
    let hessian = if want_hessian {
        let cost_fn = |t: &Theta| -> f64 { f.value(t).unwrap_or(f64::NAN) };
        Some(compute_hessian(&cost_fn, &base)?)
    } else {
        None
    };

    Ok(MinimizeOutcome { theta_hat: base, value, converged, status, iterations, fn_evals, hessian })
}

/// Per-stage solver result before embedding back into the full vector.
struct StageOutcome {
    theta_hat: Theta,
    value: f64,
    converged: bool,
    status: String,
    iterations: usize,
    fn_evals: FnEvalMap,
}

/// Run one `argmin` solve over a stage problem.
fn run_stage<'a, F, S>(
    reduced_start: Theta, opts: &MinimizeOptions, problem: StageProblem<'a, F>, solver: S,
) -> OptResult<StageOutcome>
where
    F: Objective,
    S: argmin::core::Solver<
            StageProblem<'a, F>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    let mut executor = Executor::new(problem, solver);
    executor = executor.configure(|state| state.param(reduced_start));
    if let Some(max_iter) = opts.tols.max_iter {
        executor = executor.configure(|state| state.max_iters(max_iter as u64));
    }
    let mut result = executor.run()?.state().clone();
    let iterations = result.get_iter() as usize;
    let fn_evals = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let value = result.get_best_cost();
    let theta_hat = result.take_best_param().ok_or(OptError::MissingThetaHat)?;
    // only tolerance-driven exits count as convergence; running out of the
    // iteration budget or a solver bail-out leaves the stage unconverged
    let (converged, status) = match termination {
        TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
        TerminationStatus::Terminated(reason) => {
            let converged = matches!(
                reason,
                TerminationReason::SolverConverged | TerminationReason::TargetCostReached
            );
            (converged, format!("{reason:?}"))
        }
    };
    Ok(StageOutcome { theta_hat, value, converged, status, iterations, fn_evals })
}

/// Apply optional tolerances to an L-BFGS solver, any line search.
fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MinimizeOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

/// Every estimated coordinate must be finite.
fn validate_theta(theta: &Theta) -> OptResult<()> {
    for (index, &value) in theta.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidThetaHat {
                index,
                value,
                reason: "estimated parameters must be finite",
            });
        }
    }
    Ok(())
}
