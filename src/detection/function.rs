//! Detection-function families: distance → detection probability.
//!
//! Each family is a variant of the closed [`DetFn`] enum; the required
//! parameter fields are enumerated statically per variant and checked at
//! construction time, never by runtime set comparison during evaluation.
//! Evaluation is pure: no state, no side effects, safe to call from any
//! number of optimizer threads.
use crate::detection::errors::{DetFnError, DetFnResult};
use crate::numerics::safe_logistic;
use ndarray::{Array1, ArrayView1};
use statrs::function::erf::erf;

/// Tag identifying a detection-function family.
///
/// Parsing accepts the canonical lowercase names (`"halfnormal"`,
/// `"hazard-rate"`, `"threshold"`, `"log-threshold"`, `"signal-strength"`,
/// `"log-signal-strength"`); anything else is a configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetFnTag {
    HalfNormal,
    HazardRate,
    Threshold,
    LogThreshold,
    SignalStrength,
    LogSignalStrength,
}

impl DetFnTag {
    /// Canonical name used in error messages and fit metadata.
    pub fn name(&self) -> &'static str {
        match self {
            DetFnTag::HalfNormal => "halfnormal",
            DetFnTag::HazardRate => "hazard-rate",
            DetFnTag::Threshold => "threshold",
            DetFnTag::LogThreshold => "log-threshold",
            DetFnTag::SignalStrength => "signal-strength",
            DetFnTag::LogSignalStrength => "log-signal-strength",
        }
    }

    /// Required parameter names for this family, in canonical order.
    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            DetFnTag::HalfNormal => &["g0", "sigma"],
            DetFnTag::HazardRate => &["g0", "sigma", "z"],
            DetFnTag::Threshold => &["scale", "shape"],
            DetFnTag::LogThreshold => &["scale", "shape1", "shape2"],
            DetFnTag::SignalStrength => &["b0", "b1", "sigma.ss", "cutoff"],
            DetFnTag::LogSignalStrength => &["b0", "b1", "sigma.ss", "cutoff"],
        }
    }

    /// Whether this family models detection through a signal-strength
    /// threshold (and therefore supports signal-strength auxiliary data).
    pub fn is_signal_strength(&self) -> bool {
        matches!(self, DetFnTag::SignalStrength | DetFnTag::LogSignalStrength)
    }
}

impl std::str::FromStr for DetFnTag {
    type Err = DetFnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "halfnormal" => Ok(DetFnTag::HalfNormal),
            "hazard-rate" => Ok(DetFnTag::HazardRate),
            "threshold" => Ok(DetFnTag::Threshold),
            "log-threshold" => Ok(DetFnTag::LogThreshold),
            "signal-strength" => Ok(DetFnTag::SignalStrength),
            "log-signal-strength" => Ok(DetFnTag::LogSignalStrength),
            _ => Err(DetFnError::UnknownTag { name: s.to_string() }),
        }
    }
}

/// A fully parameterized detection function.
///
/// Construct via [`DetFn::from_named`] (validated named-parameter set) or
/// [`DetFn::from_values`] (values in the canonical order of
/// [`DetFnTag::required_params`], used when rebuilding from an optimizer
/// parameter vector). All evaluation methods are pure.
#[derive(Debug, Clone, PartialEq)]
pub enum DetFn {
    /// `g0 · exp(−d² / (2σ²))`
    HalfNormal { g0: f64, sigma: f64 },
    /// `g0 · (1 − exp(−(d/σ)^−z))`
    HazardRate { g0: f64, sigma: f64, z: f64 },
    /// `0.5 − 0.5·erf(d/scale − shape)`
    Threshold { scale: f64, shape: f64 },
    /// `0.5 − 0.5·erf(shape1 − exp(shape2 − scale·d))`
    LogThreshold { scale: f64, shape1: f64, shape2: f64 },
    /// `1 − Φ(cutoff; b0 − b1·d, sigma_ss)`
    SignalStrength { b0: f64, b1: f64, sigma_ss: f64, cutoff: f64 },
    /// `1 − Φ(cutoff; exp(b0 − b1·d), sigma_ss)`
    LogSignalStrength { b0: f64, b1: f64, sigma_ss: f64, cutoff: f64 },
}

/// Standard normal CDF through `erf`, avoiding per-call distribution objects.
fn normal_cdf(x: f64, mean: f64, sd: f64) -> f64 {
    0.5 * (1.0 + erf((x - mean) / (sd * std::f64::consts::SQRT_2)))
}

impl DetFn {
    /// Build a detection function from a named-parameter set.
    ///
    /// The supplied names must equal the tag's required set exactly (order
    /// insensitive); any missing or extra name is reported in the error.
    /// Scale-type parameters must be strictly positive and `g0` must lie in
    /// `(0, 1]`.
    pub fn from_named(tag: DetFnTag, params: &[(String, f64)]) -> DetFnResult<DetFn> {
        let required = tag.required_params();
        let missing: Vec<String> = required
            .iter()
            .filter(|r| !params.iter().any(|(n, _)| n == *r))
            .map(|r| r.to_string())
            .collect();
        let extra: Vec<String> = params
            .iter()
            .filter(|(n, _)| !required.contains(&n.as_str()))
            .map(|(n, _)| n.clone())
            .collect();
        if !missing.is_empty() || !extra.is_empty() {
            return Err(DetFnError::ParameterSetMismatch { tag: tag.name(), missing, extra });
        }
        let get = |name: &str| -> f64 {
            params.iter().find(|(n, _)| n == name).map(|(_, v)| *v).unwrap_or(f64::NAN)
        };
        let values: Vec<f64> = required.iter().map(|n| get(n)).collect();
        DetFn::from_values(tag, &values)
    }

    /// Build a detection function from values in canonical parameter order.
    ///
    /// `values` must align with [`DetFnTag::required_params`]; domain
    /// violations are reported per parameter.
    pub fn from_values(tag: DetFnTag, values: &[f64]) -> DetFnResult<DetFn> {
        let required = tag.required_params();
        if values.len() != required.len() {
            return Err(DetFnError::ParameterSetMismatch {
                tag: tag.name(),
                missing: required.iter().skip(values.len()).map(|s| s.to_string()).collect(),
                extra: Vec::new(),
            });
        }
        for (name, &value) in required.iter().zip(values) {
            if !value.is_finite() {
                return Err(DetFnError::InvalidParameter {
                    name,
                    value,
                    reason: "must be finite",
                });
            }
        }
        let positive = |name: &'static str, value: f64| -> DetFnResult<f64> {
            if value > 0.0 {
                Ok(value)
            } else {
                Err(DetFnError::InvalidParameter { name, value, reason: "must be > 0" })
            }
        };
        let probability = |name: &'static str, value: f64| -> DetFnResult<f64> {
            if value > 0.0 && value <= 1.0 {
                Ok(value)
            } else {
                Err(DetFnError::InvalidParameter { name, value, reason: "must lie in (0, 1]" })
            }
        };
        match tag {
            DetFnTag::HalfNormal => Ok(DetFn::HalfNormal {
                g0: probability("g0", values[0])?,
                sigma: positive("sigma", values[1])?,
            }),
            DetFnTag::HazardRate => Ok(DetFn::HazardRate {
                g0: probability("g0", values[0])?,
                sigma: positive("sigma", values[1])?,
                z: positive("z", values[2])?,
            }),
            DetFnTag::Threshold => Ok(DetFn::Threshold {
                scale: positive("scale", values[0])?,
                shape: values[1],
            }),
            DetFnTag::LogThreshold => Ok(DetFn::LogThreshold {
                scale: positive("scale", values[0])?,
                shape1: values[1],
                shape2: values[2],
            }),
            DetFnTag::SignalStrength => Ok(DetFn::SignalStrength {
                b0: values[0],
                b1: values[1],
                sigma_ss: positive("sigma.ss", values[2])?,
                cutoff: values[3],
            }),
            DetFnTag::LogSignalStrength => Ok(DetFn::LogSignalStrength {
                b0: values[0],
                b1: values[1],
                sigma_ss: positive("sigma.ss", values[2])?,
                cutoff: values[3],
            }),
        }
    }

    /// Tag of this detection function.
    pub fn tag(&self) -> DetFnTag {
        match self {
            DetFn::HalfNormal { .. } => DetFnTag::HalfNormal,
            DetFn::HazardRate { .. } => DetFnTag::HazardRate,
            DetFn::Threshold { .. } => DetFnTag::Threshold,
            DetFn::LogThreshold { .. } => DetFnTag::LogThreshold,
            DetFn::SignalStrength { .. } => DetFnTag::SignalStrength,
            DetFn::LogSignalStrength { .. } => DetFnTag::LogSignalStrength,
        }
    }

    /// Detection probability at a single non-negative distance.
    ///
    /// Well-defined at `d = 0` for every family; the hazard-rate power is
    /// guarded so `(0/σ)^−z → ∞` yields `g0 · 1` rather than overflow.
    pub fn evaluate_scalar(&self, d: f64) -> f64 {
        let p = match *self {
            DetFn::HalfNormal { g0, sigma } => g0 * (-d * d / (2.0 * sigma * sigma)).exp(),
            DetFn::HazardRate { g0, sigma, z } => {
                if d <= 0.0 {
                    // limit of 1 − exp(−(d/σ)^−z) as d → 0 with z > 0
                    g0
                } else {
                    g0 * (1.0 - (-(d / sigma).powf(-z)).exp())
                }
            }
            DetFn::Threshold { scale, shape } => 0.5 - 0.5 * erf(d / scale - shape),
            DetFn::LogThreshold { scale, shape1, shape2 } => {
                0.5 - 0.5 * erf(shape1 - (shape2 - scale * d).exp())
            }
            DetFn::SignalStrength { b0, b1, sigma_ss, cutoff } => {
                1.0 - normal_cdf(cutoff, b0 - b1 * d, sigma_ss)
            }
            DetFn::LogSignalStrength { b0, b1, sigma_ss, cutoff } => {
                1.0 - normal_cdf(cutoff, (b0 - b1 * d).exp(), sigma_ss)
            }
        };
        p.clamp(0.0, 1.0)
    }

    /// Detection probabilities over a vector of distances.
    pub fn evaluate(&self, distances: ArrayView1<'_, f64>) -> Array1<f64> {
        distances.mapv(|d| self.evaluate_scalar(d))
    }

    /// Expected signal strength at distance `d` for signal-strength
    /// families, `None` otherwise.
    pub fn expected_signal(&self, d: f64) -> Option<f64> {
        match *self {
            DetFn::SignalStrength { b0, b1, .. } => Some(b0 - b1 * d),
            DetFn::LogSignalStrength { b0, b1, .. } => Some((b0 - b1 * d).exp()),
            _ => None,
        }
    }

    /// Signal-strength noise SD and cutoff for signal-strength families.
    pub fn signal_noise(&self) -> Option<(f64, f64)> {
        match *self {
            DetFn::SignalStrength { sigma_ss, cutoff, .. }
            | DetFn::LogSignalStrength { sigma_ss, cutoff, .. } => Some((sigma_ss, cutoff)),
            _ => None,
        }
    }

    /// Plot data: `(distance, probability)` pairs over `[0, max_distance]`.
    ///
    /// Pure; consumed by an external rendering component. `n_points ≥ 2`
    /// evenly spaced samples including both endpoints.
    pub fn curve(&self, max_distance: f64, n_points: usize) -> Vec<(f64, f64)> {
        let n = n_points.max(2);
        (0..n)
            .map(|i| {
                let d = max_distance * i as f64 / (n - 1) as f64;
                (d, self.evaluate_scalar(d))
            })
            .collect()
    }
}
