//! Fitted-model container: estimates, covariance, and fit metadata.
use crate::detection::DetFnTag;
use crate::inference::errors::{InferenceError, InferenceResult};
use crate::params::LinkFn;
use ndarray::Array2;
use tracing::warn;

/// How a derived coefficient was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedKind {
    /// Per-session effective survey area.
    Esa,
    /// Animal density converted from call density through the cue rate.
    Da,
}

/// What a detection in the capture histories represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionUnit {
    Individuals,
    Calls,
}

/// Fit-level metadata carried alongside the estimates.
#[derive(Debug, Clone, PartialEq)]
pub struct FitMeta {
    pub n_sessions: usize,
    pub detfn_tag: DetFnTag,
    pub density_has_covariates: bool,
    pub unit: DetectionUnit,
    pub converged: bool,
    /// The optimizer converged but the Hessian was singular, so no
    /// covariance matrix is available.
    pub hessian_singular: bool,
}

/// One estimated model parameter on the natural scale, with its link and,
/// for free parameters, the link-scale estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedParam {
    pub name: String,
    pub value: f64,
    pub link: LinkFn,
    /// `None` for fixed parameters, which never enter the optimizer.
    pub link_value: Option<f64>,
}

/// Delta-method covariance over the full coefficient space, with row and
/// column labels in coefficient order.
#[derive(Debug, Clone, PartialEq)]
pub struct Covariance {
    pub names: Vec<String>,
    pub matrix: Array2<f64>,
}

/// Bootstrap coefficient draws: one row per replicate, one column per
/// coefficient in the full coefficient order.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapDraws {
    pub names: Vec<String>,
    pub draws: Array2<f64>,
}

/// A standard error with, for bootstrap-based estimates, its own Monte
/// Carlo error.
#[derive(Debug, Clone, PartialEq)]
pub struct StdError {
    pub name: String,
    pub se: f64,
    pub mc_error: Option<f64>,
}

/// A completed fit.
///
/// The coefficient space is the concatenation fitted → derived → linked:
/// every model parameter on the natural scale, then derived quantities,
/// then the free parameters on the link scale. Covariance rows and
/// bootstrap draw columns both follow this order.
#[derive(Debug, Clone)]
pub struct FitResult {
    fitted: Vec<FittedParam>,
    derived: Vec<(String, DerivedKind, f64)>,
    linked: Vec<(String, f64)>,
    covariance: Option<Covariance>,
    draws: Option<BootstrapDraws>,
    nll: f64,
    meta: FitMeta,
    density_names: Vec<String>,
}

impl FitResult {
    pub(crate) fn assemble(
        fitted: Vec<FittedParam>, derived: Vec<(String, DerivedKind, f64)>,
        linked: Vec<(String, f64)>, covariance: Option<Covariance>, nll: f64, meta: FitMeta,
        density_names: Vec<String>,
    ) -> FitResult {
        FitResult { fitted, derived, linked, covariance, draws: None, nll, meta, density_names }
    }

    pub(crate) fn with_draws(mut self, draws: BootstrapDraws) -> FitResult {
        self.draws = Some(draws);
        self
    }

    pub fn fitted(&self) -> &[FittedParam] {
        &self.fitted
    }

    pub fn derived(&self) -> &[(String, DerivedKind, f64)] {
        &self.derived
    }

    pub fn linked(&self) -> &[(String, f64)] {
        &self.linked
    }

    pub fn covariance(&self) -> Option<&Covariance> {
        self.covariance.as_ref()
    }

    pub fn draws(&self) -> Option<&BootstrapDraws> {
        self.draws.as_ref()
    }

    /// Minimized negative log-likelihood.
    pub fn nll(&self) -> f64 {
        self.nll
    }

    pub fn meta(&self) -> &FitMeta {
        &self.meta
    }

    /// Display names of the density coefficients, in design-column order.
    pub fn density_names(&self) -> &[String] {
        &self.density_names
    }

    /// Number of freely estimated parameters.
    pub fn n_free(&self) -> usize {
        self.fitted.iter().filter(|p| p.link_value.is_some()).count()
    }

    /// All coefficient names in the full coefficient order.
    pub fn coef_names(&self) -> Vec<String> {
        let mut names =
            Vec::with_capacity(self.fitted.len() + self.derived.len() + self.linked.len());
        names.extend(self.fitted.iter().map(|p| p.name.clone()));
        names.extend(self.derived.iter().map(|(n, _, _)| n.clone()));
        names.extend(self.linked.iter().map(|(n, _)| n.clone()));
        names
    }

    /// All coefficient values in the full coefficient order.
    pub fn coef_values(&self) -> Vec<f64> {
        let mut values =
            Vec::with_capacity(self.fitted.len() + self.derived.len() + self.linked.len());
        values.extend(self.fitted.iter().map(|p| p.value));
        values.extend(self.derived.iter().map(|(_, _, v)| *v));
        values.extend(self.linked.iter().map(|(_, v)| *v));
        values
    }

    /// The estimate registered under `name`, anywhere in the coefficient
    /// space.
    pub fn estimate(&self, name: &str) -> InferenceResult<f64> {
        let names = self.coef_names();
        let values = self.coef_values();
        names
            .iter()
            .position(|n| n == name)
            .map(|i| values[i])
            .ok_or_else(|| InferenceError::UnknownParameter { name: name.to_string() })
    }

    /// Standard errors over the full coefficient space.
    ///
    /// When bootstrap draws are attached the standard error is the sample
    /// SD of the draws, reported with its Monte Carlo error
    /// `se / sqrt(2(B − 1))`. Otherwise the delta-method covariance
    /// diagonal is used.
    ///
    /// # Errors
    /// - [`InferenceError::CovarianceUnavailable`] when neither draws nor
    ///   a covariance matrix exist.
    pub fn std_errors(&self) -> InferenceResult<Vec<StdError>> {
        if let Some(draws) = &self.draws {
            let b = draws.draws.nrows() as f64;
            return Ok(draws
                .names
                .iter()
                .enumerate()
                .map(|(k, name)| {
                    let column = draws.draws.column(k);
                    let mean = column.sum() / b;
                    let var =
                        column.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (b - 1.0);
                    let se = var.sqrt();
                    StdError {
                        name: name.clone(),
                        se,
                        mc_error: Some(se / (2.0 * (b - 1.0)).sqrt()),
                    }
                })
                .collect());
        }
        let covariance = self.covariance.as_ref().ok_or(
            InferenceError::CovarianceUnavailable {
                reason: "fit carries no covariance matrix and no bootstrap draws",
            },
        )?;
        Ok(covariance
            .names
            .iter()
            .enumerate()
            .map(|(k, name)| StdError {
                name: name.clone(),
                se: covariance.matrix[[k, k]].max(0.0).sqrt(),
                mc_error: None,
            })
            .collect())
    }
}

/// Akaike information criterion: `2·nll + 2·k` over the free parameters.
///
/// For call-level fits the criterion compares call-density models, not
/// animal-density models; a warning flags the distinction.
pub fn aic(fit: &FitResult) -> f64 {
    if fit.meta().unit == DetectionUnit::Calls {
        warn!("AIC from a call-level fit compares call-density models, not animal densities");
    }
    2.0 * fit.nll() + 2.0 * fit.n_free() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Coefficient-space ordering fitted -> derived -> linked.
    // - Standard errors from a covariance diagonal and from draws, with
    //   the Monte Carlo error only in the bootstrap case.
    // - AIC arithmetic over free parameters.
    // -------------------------------------------------------------------------

    fn toy_fit(covariance: Option<Covariance>) -> FitResult {
        FitResult::assemble(
            vec![
                FittedParam {
                    name: "D".to_string(),
                    value: 2.0,
                    link: LinkFn::Log,
                    link_value: Some(2.0_f64.ln()),
                },
                FittedParam {
                    name: "g0".to_string(),
                    value: 1.0,
                    link: LinkFn::Logit,
                    link_value: None,
                },
            ],
            vec![("esa.1".to_string(), DerivedKind::Esa, 350.0)],
            vec![("D_link".to_string(), 2.0_f64.ln())],
            covariance,
            10.0,
            FitMeta {
                n_sessions: 1,
                detfn_tag: DetFnTag::HalfNormal,
                density_has_covariates: false,
                unit: DetectionUnit::Individuals,
                converged: true,
                hessian_singular: false,
            },
            vec!["D".to_string()],
        )
    }

    fn toy_covariance() -> Covariance {
        Covariance {
            names: vec![
                "D".to_string(),
                "g0".to_string(),
                "esa.1".to_string(),
                "D_link".to_string(),
            ],
            matrix: Array2::from_diag(&array![0.25, 0.0, 4.0, 0.01]),
        }
    }

    #[test]
    // Purpose
    // -------
    // Coefficient names and values concatenate fitted, derived, and
    // linked blocks in order.
    //
    // Given
    // -----
    // - A toy fit with D, fixed g0, esa.1, and D_link.
    //
    // Expect
    // ------
    // - Names and values in that order; estimate() finds entries from
    //   every block and rejects unknown names.
    fn coefficient_space_is_ordered() {
        let fit = toy_fit(None);
        assert_eq!(fit.coef_names(), vec!["D", "g0", "esa.1", "D_link"]);
        assert_eq!(fit.coef_values(), vec![2.0, 1.0, 350.0, 2.0_f64.ln()]);
        assert_eq!(fit.estimate("esa.1").expect("esa exists"), 350.0);
        assert!(matches!(
            fit.estimate("nothing"),
            Err(InferenceError::UnknownParameter { .. })
        ));
        assert_eq!(fit.n_free(), 1);
    }

    #[test]
    // Purpose
    // -------
    // Without draws, standard errors are square roots of the covariance
    // diagonal and carry no Monte Carlo error.
    //
    // Given
    // -----
    // - Diagonal covariance [0.25, 0, 4, 0.01].
    //
    // Expect
    // ------
    // - SEs [0.5, 0, 2, 0.1]; all mc_error None; no covariance -> error.
    fn covariance_standard_errors() {
        let fit = toy_fit(Some(toy_covariance()));
        let ses = fit.std_errors().expect("covariance present");
        let values: Vec<f64> = ses.iter().map(|s| s.se).collect();
        assert_eq!(values, vec![0.5, 0.0, 2.0, 0.1]);
        assert!(ses.iter().all(|s| s.mc_error.is_none()));

        assert!(matches!(
            toy_fit(None).std_errors(),
            Err(InferenceError::CovarianceUnavailable { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // With draws attached, standard errors switch to the draw sample SD
    // and report the Monte Carlo error se / sqrt(2(B - 1)).
    //
    // Given
    // -----
    // - 3 replicates of a single coefficient: [1, 2, 3].
    //
    // Expect
    // ------
    // - se = 1; mc_error = 1 / 2.
    fn bootstrap_standard_errors() {
        let fit = toy_fit(None).with_draws(BootstrapDraws {
            names: vec!["D".to_string()],
            draws: array![[1.0], [2.0], [3.0]],
        });
        let ses = fit.std_errors().expect("draws present");
        assert!((ses[0].se - 1.0).abs() < 1e-12);
        assert!((ses[0].mc_error.expect("bootstrap SE") - 0.5).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // AIC counts only freely estimated parameters.
    //
    // Given
    // -----
    // - nll = 10 with exactly one free parameter.
    //
    // Expect
    // ------
    // - aic = 2*10 + 2*1 = 22.
    fn aic_counts_free_parameters() {
        assert_eq!(aic(&toy_fit(None)), 22.0);
    }
}
