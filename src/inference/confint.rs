//! Confidence intervals for fitted coefficients.
use crate::inference::errors::{InferenceError, InferenceResult};
use crate::inference::fit::FitResult;
use crate::numerics::{quantile, std_normal_quantile};
use crate::params::LinkFn;

/// Interval construction method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiMethod {
    /// Wald intervals from the delta-method covariance. Free parameters
    /// with a non-identity link are computed on the link scale and
    /// back-transformed, so the bounds respect the natural domain.
    Default,
    /// The `Default` interval with both limits shifted down by the
    /// bootstrap bias estimate `mean(draws) − estimate`.
    DefaultBc,
    /// Basic bootstrap intervals: `2·est − q(1−α/2)` to `2·est − q(α/2)`.
    Basic,
    /// Percentile bootstrap intervals.
    Percentile,
}

/// One coefficient's confidence interval.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfInt {
    pub name: String,
    pub estimate: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Confidence intervals for the named coefficients; an empty name list
/// selects the whole coefficient space.
///
/// # Errors
/// - [`InferenceError::InvalidLevel`] outside (0, 1).
/// - [`InferenceError::UnknownParameter`] for a name the fit lacks.
/// - [`InferenceError::CovarianceUnavailable`] for Wald intervals without
///   a covariance matrix.
/// - [`InferenceError::BootstrapRequired`] for bootstrap methods without
///   attached draws.
pub fn confint(
    fit: &FitResult, names: &[String], level: f64, method: CiMethod,
) -> InferenceResult<Vec<ConfInt>> {
    if !(level > 0.0 && level < 1.0) {
        return Err(InferenceError::InvalidLevel { level });
    }
    let all_names = fit.coef_names();
    let selected: Vec<String> = if names.is_empty() {
        all_names.clone()
    } else {
        for name in names {
            if !all_names.iter().any(|n| n == name) {
                return Err(InferenceError::UnknownParameter { name: name.clone() });
            }
        }
        names.to_vec()
    };

    match method {
        CiMethod::Default => wald_intervals(fit, &selected, level),
        CiMethod::DefaultBc => bootstrap_wald_bc(fit, &selected, level),
        CiMethod::Basic | CiMethod::Percentile => {
            bootstrap_quantile_intervals(fit, &selected, level, method)
        }
    }
}

fn z_for(level: f64) -> f64 {
    std_normal_quantile(0.5 + level / 2.0)
}

fn wald_intervals(
    fit: &FitResult, names: &[String], level: f64,
) -> InferenceResult<Vec<ConfInt>> {
    let covariance = fit.covariance().ok_or(InferenceError::CovarianceUnavailable {
        reason: "Wald intervals need the delta-method covariance",
    })?;
    let z = z_for(level);
    let se_of = |name: &str| -> InferenceResult<f64> {
        let k = covariance
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| InferenceError::UnknownParameter { name: name.to_string() })?;
        Ok(covariance.matrix[[k, k]].max(0.0).sqrt())
    };

    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let estimate = fit.estimate(name)?;
        let transformed = fit.fitted().iter().find(|p| {
            &p.name == name && p.link_value.is_some() && p.link != LinkFn::Identity
        });
        let (lower, upper) = match transformed {
            Some(param) => {
                // interval on the link scale, mapped back through the
                // inverse link
                let linked_name = format!("{name}_link");
                let se = se_of(&linked_name)?;
                let center = param.link_value.unwrap_or(0.0);
                (param.link.from_link(center - z * se), param.link.from_link(center + z * se))
            }
            None => {
                let se = se_of(name)?;
                (estimate - z * se, estimate + z * se)
            }
        };
        out.push(ConfInt { name: name.clone(), estimate, lower, upper });
    }
    Ok(out)
}

fn draws_column<'a>(
    fit: &'a FitResult, name: &str, method: &'static str,
) -> InferenceResult<Vec<f64>> {
    let draws = fit.draws().ok_or(InferenceError::BootstrapRequired { method })?;
    let k = draws
        .names
        .iter()
        .position(|n| n == name)
        .ok_or_else(|| InferenceError::UnknownParameter { name: name.to_string() })?;
    Ok(draws.draws.column(k).to_vec())
}

fn bootstrap_wald_bc(
    fit: &FitResult, names: &[String], level: f64,
) -> InferenceResult<Vec<ConfInt>> {
    let mut out = wald_intervals(fit, names, level)?;
    for ci in &mut out {
        let column = draws_column(fit, &ci.name, "default.bc")?;
        let mean = column.iter().sum::<f64>() / column.len() as f64;
        let bias = mean - ci.estimate;
        ci.lower -= bias;
        ci.upper -= bias;
    }
    Ok(out)
}

fn bootstrap_quantile_intervals(
    fit: &FitResult, names: &[String], level: f64, method: CiMethod,
) -> InferenceResult<Vec<ConfInt>> {
    let alpha = 1.0 - level;
    let method_name = if method == CiMethod::Basic { "basic" } else { "percentile" };
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let estimate = fit.estimate(name)?;
        let column = draws_column(fit, name, method_name)?;
        let q_lo = quantile(&column, alpha / 2.0);
        let q_hi = quantile(&column, 1.0 - alpha / 2.0);
        let (lower, upper) = match method {
            CiMethod::Basic => (2.0 * estimate - q_hi, 2.0 * estimate - q_lo),
            _ => (q_lo, q_hi),
        };
        out.push(ConfInt { name: name.clone(), estimate, lower, upper });
    }
    Ok(out)
}
