//! Model assembly: sessions + detection function + density + parameters.
use crate::detection::{DetFn, DetFnTag};
use crate::inference::fit::{Covariance, DerivedKind, DetectionUnit, FitMeta, FitResult, FittedParam};
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::likelihood::session::{session_log_likelihood, AuxParams};
use crate::likelihood::detprob::DetProb;
use crate::optimize::{
    covariance_from_hessian, minimize, Cost, Objective, OptError, OptResult, Theta,
    MinimizeOptions,
};
use crate::params::{LinkFn, ParamRegistry, ParamSpec};
use crate::survey::{AuxKind, Session};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::warn;

/// Spatial density model over the mask.
///
/// `Uniform` carries a single natural-scale density parameter. `Covariate`
/// models log-density as a linear predictor over per-mask-point design
/// matrices, one per session, sharing one coefficient vector.
#[derive(Debug, Clone, PartialEq)]
pub enum DensityModel {
    Uniform,
    Covariate { designs: Vec<Array2<f64>>, names: Vec<String> },
}

impl DensityModel {
    fn has_covariates(&self) -> bool {
        matches!(self, DensityModel::Covariate { .. })
    }
}

/// Calls-per-unit-time rate with the matching survey length.
///
/// Both values must be stated in consistent time units; they are only ever
/// used through their product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueRate {
    pub rate: f64,
    pub survey_length: f64,
}

/// Model-level options.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrOptions {
    /// Speed of sound used to convert distances into arrival times.
    pub sound_speed: f64,
    /// Detection threshold for signal-strength families; required for
    /// those families, ignored otherwise.
    pub cutoff: Option<f64>,
    /// When detections are calls rather than individuals, the cue rate
    /// converts call density into animal density.
    pub cue_rate: Option<CueRate>,
    pub minimize: MinimizeOptions,
}

impl Default for ScrOptions {
    fn default() -> Self {
        Self {
            sound_speed: 330.0,
            cutoff: None,
            cue_rate: None,
            minimize: MinimizeOptions::default(),
        }
    }
}

/// Caller overrides for starts, bounds, fixed values, and phases, all on
/// the natural scale and keyed by parameter name.
///
/// Entries naming parameters the model does not define are dropped with a
/// warning rather than failing the fit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitOverrides {
    pub start: Vec<(String, f64)>,
    pub bounds: Vec<(String, (f64, f64))>,
    pub fix: Vec<(String, f64)>,
    pub phases: Vec<(String, i32)>,
}

/// A fully validated acoustic SCR model, ready to fit.
///
/// Construction performs every configuration check: session consistency,
/// auxiliary/detection-function compatibility, density design shapes, and
/// parameter-spec validity. After `new` succeeds, likelihood evaluation is
/// a total function of the link-scale vector.
#[derive(Debug, Clone)]
pub struct ScrModel {
    sessions: Vec<Session>,
    detfn_tag: DetFnTag,
    density: DensityModel,
    registry: ParamRegistry,
    options: ScrOptions,
    distances: Vec<Array2<f64>>,
    bearings: Vec<Array2<f64>>,
}

impl ScrModel {
    /// Build and validate a model.
    ///
    /// # Errors
    /// - [`LikelihoodError::EmptySessionList`] with no sessions.
    /// - [`LikelihoodError::Survey`] when an auxiliary component appears in
    ///   some sessions but not all.
    /// - [`LikelihoodError::SignalStrengthRequiresSsDetFn`] /
    ///   [`LikelihoodError::MissingCutoff`] for detection-function
    ///   incompatibilities.
    /// - [`LikelihoodError::InvalidSoundSpeed`] /
    ///   [`LikelihoodError::InvalidCueRate`] for bad scalar options.
    /// - [`LikelihoodError::DensityDesignCount`] /
    ///   [`LikelihoodError::DensityDesignMismatch`] /
    ///   [`LikelihoodError::DensityDesignNames`] for malformed covariate
    ///   designs.
    /// - [`LikelihoodError::Param`] when overrides produce an invalid
    ///   parameter spec.
    pub fn new(
        sessions: Vec<Session>, detfn_tag: DetFnTag, density: DensityModel,
        overrides: FitOverrides, options: ScrOptions,
    ) -> LikelihoodResult<ScrModel> {
        if sessions.is_empty() {
            return Err(LikelihoodError::EmptySessionList);
        }
        for kind in
            [AuxKind::TimeOfArrival, AuxKind::SignalStrength, AuxKind::Bearing, AuxKind::Distance]
        {
            let present = sessions.iter().filter(|s| s.captures.has_auxiliary(kind)).count();
            if present != 0 && present != sessions.len() {
                return Err(crate::survey::SurveyError::AuxiliaryInconsistentAcrossSessions {
                    component: kind.name(),
                }
                .into());
            }
        }
        let has = |kind: AuxKind| sessions[0].captures.has_auxiliary(kind);
        if has(AuxKind::SignalStrength) && !detfn_tag.is_signal_strength() {
            return Err(LikelihoodError::SignalStrengthRequiresSsDetFn { tag: detfn_tag.name() });
        }
        if detfn_tag.is_signal_strength() && options.cutoff.is_none() {
            return Err(LikelihoodError::MissingCutoff);
        }
        if has(AuxKind::TimeOfArrival)
            && (!options.sound_speed.is_finite() || options.sound_speed <= 0.0)
        {
            return Err(LikelihoodError::InvalidSoundSpeed { value: options.sound_speed });
        }
        if let Some(cue) = &options.cue_rate {
            if !cue.rate.is_finite()
                || cue.rate <= 0.0
                || !cue.survey_length.is_finite()
                || cue.survey_length <= 0.0
            {
                return Err(LikelihoodError::InvalidCueRate {
                    rate: cue.rate,
                    survey_length: cue.survey_length,
                    reason: "cue rate and survey length must both be finite and > 0",
                });
            }
        }
        if let DensityModel::Covariate { designs, names } = &density {
            if designs.len() != sessions.len() {
                return Err(LikelihoodError::DensityDesignCount {
                    expected: sessions.len(),
                    found: designs.len(),
                });
            }
            for (s, (design, session)) in designs.iter().zip(&sessions).enumerate() {
                if design.nrows() != session.mask.n_points() {
                    return Err(LikelihoodError::DensityDesignMismatch {
                        session: s,
                        expected: session.mask.n_points(),
                        found: design.nrows(),
                    });
                }
            }
            if names.is_empty() || names.len() != designs[0].ncols() {
                return Err(LikelihoodError::DensityDesignNames {
                    columns: designs[0].ncols(),
                    names: names.len(),
                });
            }
        }

        let specs = default_specs(&sessions, detfn_tag, &density, &options);
        let specs = apply_overrides(specs, &overrides, density.has_covariates());
        let registry = ParamRegistry::new(specs)?;

        let distances: Vec<Array2<f64>> =
            sessions.iter().map(|s| s.traps.distance_matrix(&s.mask)).collect();
        let bearings: Vec<Array2<f64>> =
            sessions.iter().map(|s| s.traps.bearing_matrix(&s.mask)).collect();

        Ok(ScrModel { sessions, detfn_tag, density, registry, options, distances, bearings })
    }

    pub fn registry(&self) -> &ParamRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn detfn_tag(&self) -> DetFnTag {
        self.detfn_tag
    }

    /// Display name for a registry parameter: the intercept-labeled density
    /// coefficient is reported as plain `D` when density has no covariates.
    fn display_name(&self, name: &str) -> String {
        if !self.density.has_covariates() && name == "D.(Intercept)" {
            "D".to_string()
        } else {
            name.to_string()
        }
    }

    /// Rebuild the detection function from a natural parameter vector.
    fn detfn_from(&self, natural: &Array1<f64>) -> LikelihoodResult<DetFn> {
        let mut values = Vec::with_capacity(self.detfn_tag.required_params().len());
        for name in self.detfn_tag.required_params() {
            values.push(natural[self.registry.index_of(name)?]);
        }
        Ok(DetFn::from_values(self.detfn_tag, &values)?)
    }

    /// Per-mask-point log density for one session.
    fn log_density_surface(&self, natural: &Array1<f64>, session: usize) -> LikelihoodResult<Array1<f64>> {
        match &self.density {
            DensityModel::Uniform => {
                let d = natural[self.registry.index_of("D.(Intercept)")?];
                let ln_d = d.max(f64::MIN_POSITIVE).ln();
                Ok(Array1::from_elem(self.sessions[session].mask.n_points(), ln_d))
            }
            DensityModel::Covariate { designs, names } => {
                let mut beta = Array1::zeros(names.len());
                for (k, name) in names.iter().enumerate() {
                    beta[k] = natural[self.registry.index_of(&format!("D.{name}"))?];
                }
                Ok(designs[session].dot(&beta))
            }
        }
    }

    fn aux_params(&self, natural: &Array1<f64>) -> LikelihoodResult<AuxParams> {
        let value = |name: &str| -> LikelihoodResult<f64> {
            Ok(natural[self.registry.index_of(name)?])
        };
        Ok(AuxParams {
            sound_speed: self.options.sound_speed,
            sigma_toa: if self.sessions[0].captures.has_auxiliary(AuxKind::TimeOfArrival) {
                Some(value("sigma.toa")?)
            } else {
                None
            },
            kappa: if self.sessions[0].captures.has_auxiliary(AuxKind::Bearing) {
                Some(value("kappa")?)
            } else {
                None
            },
            alpha: if self.sessions[0].captures.has_auxiliary(AuxKind::Distance) {
                Some(value("alpha")?)
            } else {
                None
            },
        })
    }

    /// Negative log-likelihood at a free link-scale vector.
    pub fn neg_log_likelihood(&self, free_link: &Theta) -> LikelihoodResult<f64> {
        let natural = self.registry.natural_full(free_link)?;
        let detfn = self.detfn_from(&natural)?;
        let aux = self.aux_params(&natural)?;
        let mut ll = 0.0;
        for (s, session) in self.sessions.iter().enumerate() {
            let log_density = self.log_density_surface(&natural, s)?;
            ll += session_log_likelihood(
                session,
                &detfn,
                &log_density,
                &aux,
                &self.distances[s],
                &self.bearings[s],
            );
        }
        Ok(-ll)
    }

    /// Derived parameters at a natural vector: per-session effective survey
    /// areas, plus animal density under a uniform cue-rate model.
    pub fn derived_values(
        &self, natural: &Array1<f64>,
    ) -> LikelihoodResult<Vec<(String, DerivedKind, f64)>> {
        let detfn = self.detfn_from(natural)?;
        let mut out = Vec::with_capacity(self.sessions.len() + 1);
        for (s, session) in self.sessions.iter().enumerate() {
            let surfaces = DetProb::compute(&detfn, &self.distances[s]);
            out.push((
                format!("esa.{}", s + 1),
                DerivedKind::Esa,
                surfaces.esa(session.mask.cell_area()),
            ));
        }
        if let (DensityModel::Uniform, Some(cue)) = (&self.density, &self.options.cue_rate) {
            let d = natural[self.registry.index_of("D.(Intercept)")?];
            out.push(("Da".to_string(), DerivedKind::Da, d / (cue.rate * cue.survey_length)));
        }
        Ok(out)
    }

    /// Fit the model, returning the full inference-ready result.
    pub fn fit(&self) -> LikelihoodResult<FitResult> {
        self.fit_inner(true)
    }

    /// Bootstrap refit: point estimates only, no Hessian work.
    pub(crate) fn fit_quick(&self) -> LikelihoodResult<FitResult> {
        self.fit_inner(false)
    }

    fn fit_inner(&self, want_hessian: bool) -> LikelihoodResult<FitResult> {
        let outcome = minimize(
            self,
            self.registry.link_start(),
            &self.registry.link_bounds(),
            &self.registry.phases(),
            &self.options.minimize,
            want_hessian,
        )?;
        let natural = self.registry.natural_full(&outcome.theta_hat)?;
        let derived = self.derived_values(&natural)?;

        let free_names = self.registry.free_names();
        let mut fitted = Vec::with_capacity(self.registry.n_params());
        for (i, name) in self.registry.names().iter().enumerate() {
            let free_pos = free_names.iter().position(|n| n == name);
            fitted.push(FittedParam {
                name: self.display_name(name),
                value: natural[i],
                link: self.registry.spec(name)?.link,
                link_value: free_pos.map(|j| outcome.theta_hat[j]),
            });
        }
        let linked: Vec<(String, f64)> = free_names
            .iter()
            .enumerate()
            .map(|(j, name)| (format!("{}_link", self.display_name(name)), outcome.theta_hat[j]))
            .collect();

        let mut hessian_singular = false;
        let covariance = match &outcome.hessian {
            Some(hessian) if outcome.converged => match covariance_from_hessian(hessian) {
                Ok(link_cov) => {
                    Some(self.full_covariance(&outcome.theta_hat, &link_cov, &fitted, &derived, &linked)?)
                }
                Err(OptError::SingularHessian { .. }) => {
                    hessian_singular = true;
                    None
                }
                Err(e) => return Err(e.into()),
            },
            _ => None,
        };

        let density_names: Vec<String> = match &self.density {
            DensityModel::Uniform => vec!["D".to_string()],
            DensityModel::Covariate { names, .. } =>
                names.iter().map(|n| format!("D.{n}")).collect(),
        };
        let unit = if self.options.cue_rate.is_some() {
            DetectionUnit::Calls
        } else {
            DetectionUnit::Individuals
        };
        let meta = FitMeta {
            n_sessions: self.sessions.len(),
            detfn_tag: self.detfn_tag,
            density_has_covariates: self.density.has_covariates(),
            unit,
            converged: outcome.converged,
            hessian_singular,
        };
        Ok(FitResult::assemble(
            fitted,
            derived,
            linked,
            covariance,
            outcome.value,
            meta,
            density_names,
        ))
    }

    /// Delta-method covariance over the full coefficient space.
    ///
    /// Rows follow the coefficient order fitted → derived → linked.
    /// Fitted free rows use the inverse-link derivative at the estimate,
    /// fixed rows are zero, derived rows are central finite differences of
    /// the derived values, and linked rows are the identity.
    fn full_covariance(
        &self, theta_hat: &Theta, link_cov: &Array2<f64>, fitted: &[FittedParam],
        derived: &[(String, DerivedKind, f64)], linked: &[(String, f64)],
    ) -> LikelihoodResult<Covariance> {
        let n_free = theta_hat.len();
        let n_rows = fitted.len() + derived.len() + linked.len();
        let free_names = self.registry.free_names();
        let free_links = self.registry.free_links();

        let mut jac = Array2::zeros((n_rows, n_free));
        for (row, name) in self.registry.names().iter().enumerate() {
            if let Some(j) = free_names.iter().position(|n| n == name) {
                jac[[row, j]] = free_links[j].inverse_derivative(theta_hat[j]);
            }
        }
        let derived_base = fitted.len();
        for j in 0..n_free {
            let h = 1e-5 * theta_hat[j].abs().max(1.0);
            let mut up = theta_hat.clone();
            up[j] += h;
            let mut down = theta_hat.clone();
            down[j] -= h;
            let d_up = self.derived_values(&self.registry.natural_full(&up)?)?;
            let d_down = self.derived_values(&self.registry.natural_full(&down)?)?;
            for (k, ((_, _, vu), (_, _, vd))) in d_up.iter().zip(&d_down).enumerate() {
                jac[[derived_base + k, j]] = (vu - vd) / (2.0 * h);
            }
        }
        let linked_base = derived_base + derived.len();
        for j in 0..n_free {
            jac[[linked_base + j, j]] = 1.0;
        }

        let mut names = Vec::with_capacity(n_rows);
        names.extend(fitted.iter().map(|p| p.name.clone()));
        names.extend(derived.iter().map(|(n, _, _)| n.clone()));
        names.extend(linked.iter().map(|(n, _)| n.clone()));
        let matrix = jac.dot(link_cov).dot(&jac.t());
        Ok(Covariance { names, matrix })
    }

    /// A model over row-resampled capture histories, for one bootstrap
    /// replicate. Geometry and designs are shared unchanged.
    pub(crate) fn resampled(&self, rng: &mut StdRng) -> ScrModel {
        let mut out = self.clone();
        for session in &mut out.sessions {
            let n = session.captures.n_individuals();
            let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            session.captures = session.captures.resample_rows(&rows);
        }
        out
    }
}

impl Objective for ScrModel {
    fn value(&self, theta: &Theta) -> OptResult<Cost> {
        self.neg_log_likelihood(theta)
            .map_err(|e| OptError::ObjectiveFailure { text: e.to_string() })
    }
}

/// Default parameter specs in registry order: density coefficients first,
/// then the detection function's canonical parameters, then auxiliary
/// density parameters.
fn default_specs(
    sessions: &[Session], detfn_tag: DetFnTag, density: &DensityModel, options: &ScrOptions,
) -> Vec<ParamSpec> {
    let buffer = sessions[0].mask.buffer();
    let total_detected: usize = sessions.iter().map(|s| s.captures.n_individuals()).sum();
    let total_area: f64 =
        sessions.iter().map(|s| s.mask.cell_area() * s.mask.n_points() as f64).sum();
    let d0 = (total_detected as f64 / total_area).max(1e-6);

    let mut specs = Vec::new();
    match density {
        DensityModel::Uniform => {
            specs.push(ParamSpec::free("D.(Intercept)", LinkFn::Log, d0));
        }
        DensityModel::Covariate { names, .. } => {
            for (k, name) in names.iter().enumerate() {
                let start = if k == 0 { d0.ln() } else { 0.0 };
                specs.push(ParamSpec::free(&format!("D.{name}"), LinkFn::Identity, start));
            }
        }
    }

    let (ss_mean, ss_sd) = detected_signal_stats(sessions);
    for &name in detfn_tag.required_params() {
        let spec = match name {
            "g0" => ParamSpec::free("g0", LinkFn::Logit, 0.95),
            "sigma" => ParamSpec::free("sigma", LinkFn::Log, buffer / 4.0),
            "z" => ParamSpec::free("z", LinkFn::Log, 2.0),
            "scale" => ParamSpec::free("scale", LinkFn::Log, buffer / 4.0),
            "shape" => ParamSpec::free("shape", LinkFn::Identity, 0.0),
            "shape1" => ParamSpec::free("shape1", LinkFn::Identity, 0.0),
            "shape2" => ParamSpec::free("shape2", LinkFn::Identity, 0.0),
            "b0" => ParamSpec::free(
                "b0",
                LinkFn::Identity,
                ss_mean.unwrap_or(options.cutoff.unwrap_or(0.0) + 10.0),
            ),
            "b1" => ParamSpec::free("b1", LinkFn::Identity, 0.1),
            "sigma.ss" => ParamSpec::free("sigma.ss", LinkFn::Log, ss_sd.unwrap_or(5.0)),
            // cutoff is data, not an estimated parameter
            "cutoff" => {
                ParamSpec::fixed("cutoff", LinkFn::Identity, options.cutoff.unwrap_or(0.0))
            }
            other => ParamSpec::free(other, LinkFn::Identity, 1.0),
        };
        specs.push(spec);
    }

    let has = |kind: AuxKind| sessions[0].captures.has_auxiliary(kind);
    if has(AuxKind::TimeOfArrival) {
        specs.push(ParamSpec::free("sigma.toa", LinkFn::Log, 0.002));
    }
    if has(AuxKind::Bearing) {
        specs.push(ParamSpec::free("kappa", LinkFn::Log, 10.0));
    }
    if has(AuxKind::Distance) {
        specs.push(ParamSpec::free("alpha", LinkFn::Log, 5.0));
    }
    specs
}

/// Mean and SD of signal strengths over detection cells, across sessions.
fn detected_signal_stats(sessions: &[Session]) -> (Option<f64>, Option<f64>) {
    let mut values = Vec::new();
    for session in sessions {
        if let Some(ss) = session.captures.auxiliary(AuxKind::SignalStrength) {
            for ((r, c), &w) in session.captures.binary().indexed_iter() {
                if w == 1.0 {
                    values.push(ss[[r, c]]);
                }
            }
        }
    }
    if values.len() < 2 {
        return (None, None);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0);
    (Some(mean), Some(var.sqrt().max(1e-3)))
}

/// Apply caller overrides onto the default specs.
///
/// Unknown names are dropped with a warning; the plain density name `D`
/// is accepted for the intercept coefficient when density has no
/// covariates. A `fix` entry replaces the whole spec with a fixed one.
fn apply_overrides(
    mut specs: Vec<ParamSpec>, overrides: &FitOverrides, has_covariates: bool,
) -> Vec<ParamSpec> {
    let canonical = |name: &str| -> String {
        if !has_covariates && name == "D" {
            "D.(Intercept)".to_string()
        } else {
            name.to_string()
        }
    };
    let position = |specs: &[ParamSpec], name: &str| -> Option<usize> {
        let name = canonical(name);
        specs.iter().position(|s| s.name == name)
    };
    for (name, value) in &overrides.fix {
        match position(&specs, name) {
            Some(i) => {
                let kept_name = specs[i].name.clone();
                specs[i] = ParamSpec::fixed(&kept_name, specs[i].link, *value);
            }
            None => warn!(parameter = %name, "dropping fixed value for unknown parameter"),
        }
    }
    for (name, value) in &overrides.start {
        match position(&specs, name) {
            Some(i) if specs[i].fixed.is_none() => specs[i].start = *value,
            Some(_) => warn!(parameter = %name, "dropping start value for fixed parameter"),
            None => warn!(parameter = %name, "dropping start value for unknown parameter"),
        }
    }
    for (name, (lower, upper)) in &overrides.bounds {
        match position(&specs, name) {
            Some(i) => {
                specs[i].lower = *lower;
                specs[i].upper = *upper;
            }
            None => warn!(parameter = %name, "dropping bounds for unknown parameter"),
        }
    }
    for (name, phase) in &overrides.phases {
        match position(&specs, name) {
            Some(i) if specs[i].fixed.is_none() => specs[i].phase = *phase,
            Some(_) => warn!(parameter = %name, "dropping phase for fixed parameter"),
            None => warn!(parameter = %name, "dropping phase for unknown parameter"),
        }
    }
    specs
}
