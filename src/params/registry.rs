//! Parameter registry: names, links, starts, bounds, phases, fixed values.
use crate::params::errors::{ParamError, ParamResult};
use crate::params::link::LinkFn;
use ndarray::Array1;

/// One model parameter with its link, start, bounds, phase, and optional
/// fixed value.
///
/// A fixed parameter carries `phase == -1` and a `fixed` value; the two are
/// normalized together at construction so downstream code can test either.
/// Bounds and starts are stated on the natural scale and transformed to the
/// link scale by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub link: LinkFn,
    pub start: f64,
    pub lower: f64,
    pub upper: f64,
    pub phase: i32,
    pub fixed: Option<f64>,
}

impl ParamSpec {
    /// A free parameter estimated in phase 0 with unbounded natural range.
    pub fn free(name: &str, link: LinkFn, start: f64) -> ParamSpec {
        ParamSpec {
            name: name.to_string(),
            link,
            start,
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
            phase: 0,
            fixed: None,
        }
    }

    /// A parameter held at a known value and excluded from optimization.
    pub fn fixed(name: &str, link: LinkFn, value: f64) -> ParamSpec {
        ParamSpec {
            name: name.to_string(),
            link,
            start: value,
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
            phase: -1,
            fixed: Some(value),
        }
    }

    /// Replace the natural-scale bounds.
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> ParamSpec {
        self.lower = lower;
        self.upper = upper;
        self
    }

    /// Replace the optimization phase.
    pub fn with_phase(mut self, phase: i32) -> ParamSpec {
        self.phase = phase;
        self
    }

    /// Replace the natural-scale start value.
    pub fn with_start(mut self, start: f64) -> ParamSpec {
        self.start = start;
        self
    }

    fn domain_check(&self, value: f64) -> Option<&'static str> {
        if !value.is_finite() {
            return Some("value must be finite");
        }
        match self.link {
            LinkFn::Identity => None,
            LinkFn::Log => (value <= 0.0).then_some("log-linked parameters must be > 0"),
            LinkFn::Logit => {
                (value <= 0.0 || value > 1.0).then_some("logit-linked parameters must be in (0, 1]")
            }
        }
    }
}

/// Ordered, validated collection of [`ParamSpec`]s.
///
/// Parameter order is fixed at construction and defines the layout of every
/// natural-scale vector in the model; the free (non-fixed) subset, in the
/// same relative order, defines the layout of the link-scale vector seen by
/// the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamRegistry {
    specs: Vec<ParamSpec>,
    free: Vec<usize>,
}

impl ParamRegistry {
    /// Build a registry, validating every spec.
    ///
    /// # Errors
    /// - [`ParamError::DuplicateParameter`] for repeated names.
    /// - [`ParamError::InvalidPhase`] for phases below -1, or a phase of -1
    ///   without a fixed value.
    /// - [`ParamError::InvalidFixedValue`] / [`ParamError::InvalidStart`] /
    ///   [`ParamError::InvalidBounds`] for domain violations on the natural
    ///   scale.
    /// - [`ParamError::StartOutsideBounds`] when a free start escapes its
    ///   bounds.
    pub fn new(specs: Vec<ParamSpec>) -> ParamResult<ParamRegistry> {
        for (i, spec) in specs.iter().enumerate() {
            if specs[..i].iter().any(|s| s.name == spec.name) {
                return Err(ParamError::DuplicateParameter { name: spec.name.clone() });
            }
            if spec.phase < -1 || (spec.phase == -1) != spec.fixed.is_some() {
                return Err(ParamError::InvalidPhase { name: spec.name.clone(), phase: spec.phase });
            }
            if let Some(value) = spec.fixed {
                if let Some(reason) = spec.domain_check(value) {
                    return Err(ParamError::InvalidFixedValue {
                        name: spec.name.clone(),
                        value,
                        reason,
                    });
                }
                continue;
            }
            if let Some(reason) = spec.domain_check(spec.start) {
                return Err(ParamError::InvalidStart {
                    name: spec.name.clone(),
                    value: spec.start,
                    reason,
                });
            }
            if spec.lower >= spec.upper || spec.lower.is_nan() || spec.upper.is_nan() {
                return Err(ParamError::InvalidBounds {
                    name: spec.name.clone(),
                    lower: spec.lower,
                    upper: spec.upper,
                    reason: "bounds must satisfy lower < upper",
                });
            }
            if spec.start < spec.lower || spec.start > spec.upper {
                return Err(ParamError::StartOutsideBounds {
                    name: spec.name.clone(),
                    start: spec.start,
                    lower: spec.lower,
                    upper: spec.upper,
                });
            }
        }
        let free = specs
            .iter()
            .enumerate()
            .filter(|(_, s)| s.fixed.is_none())
            .map(|(i, _)| i)
            .collect();
        Ok(ParamRegistry { specs, free })
    }

    /// Total parameter count (free plus fixed).
    pub fn n_params(&self) -> usize {
        self.specs.len()
    }

    /// Number of free parameters (the length of the link-scale vector).
    pub fn n_free(&self) -> usize {
        self.free.len()
    }

    /// Parameter names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    /// Free-parameter names in registration order.
    pub fn free_names(&self) -> Vec<&str> {
        self.free.iter().map(|&i| self.specs[i].name.as_str()).collect()
    }

    /// The spec registered under `name`.
    pub fn spec(&self, name: &str) -> ParamResult<&ParamSpec> {
        self.specs
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ParamError::UnknownParameter { name: name.to_string() })
    }

    /// Position of `name` in the full natural-scale vector.
    pub fn index_of(&self, name: &str) -> ParamResult<usize> {
        self.specs
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| ParamError::UnknownParameter { name: name.to_string() })
    }

    /// Link-scale start vector over the free subset.
    pub fn link_start(&self) -> Array1<f64> {
        Array1::from_iter(self.free.iter().map(|&i| {
            let s = &self.specs[i];
            s.link.to_link(s.start)
        }))
    }

    /// Link-scale bounds over the free subset.
    ///
    /// Natural bounds are mapped through the link, so an unbounded natural
    /// range on a log link becomes `(-inf, inf)` on the link scale.
    pub fn link_bounds(&self) -> Vec<(f64, f64)> {
        self.free
            .iter()
            .map(|&i| {
                let s = &self.specs[i];
                let lo = if s.lower.is_finite() {
                    s.link.to_link(s.lower)
                } else {
                    f64::NEG_INFINITY
                };
                let hi =
                    if s.upper.is_finite() { s.link.to_link(s.upper) } else { f64::INFINITY };
                (lo, hi)
            })
            .collect()
    }

    /// Phase number per free parameter, in free order.
    pub fn phases(&self) -> Vec<i32> {
        self.free.iter().map(|&i| self.specs[i].phase).collect()
    }

    /// Link functions over the free subset, in free order.
    pub fn free_links(&self) -> Vec<LinkFn> {
        self.free.iter().map(|&i| self.specs[i].link).collect()
    }

    /// Expand a free link-scale vector to the full natural-scale vector.
    ///
    /// Fixed parameters are reinserted at their registered positions; free
    /// entries pass through their inverse links.
    ///
    /// # Errors
    /// - [`ParamError::LinkVectorLength`] on a length mismatch.
    pub fn natural_full(&self, free_link: &Array1<f64>) -> ParamResult<Array1<f64>> {
        if free_link.len() != self.free.len() {
            return Err(ParamError::LinkVectorLength {
                expected: self.free.len(),
                found: free_link.len(),
            });
        }
        let mut natural = Array1::zeros(self.specs.len());
        let mut next_free = 0;
        for (i, spec) in self.specs.iter().enumerate() {
            natural[i] = match spec.fixed {
                Some(value) => value,
                None => {
                    let v = spec.link.from_link(free_link[next_free]);
                    next_free += 1;
                    v
                }
            };
        }
        Ok(natural)
    }

    /// Whether the parameter registered under `name` is fixed.
    pub fn is_fixed(&self, name: &str) -> ParamResult<bool> {
        Ok(self.spec(name)?.fixed.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction-time validation: duplicates, phases, domains, bounds.
    // - Fixed-value reinsertion in natural_full.
    // - Link-scale starts and bounds.
    // -------------------------------------------------------------------------

    fn three_specs() -> Vec<ParamSpec> {
        vec![
            ParamSpec::free("D", LinkFn::Log, 2.5),
            ParamSpec::fixed("g0", LinkFn::Logit, 1.0),
            ParamSpec::free("sigma", LinkFn::Log, 100.0).with_bounds(1.0, 1000.0),
        ]
    }

    #[test]
    // Purpose
    // -------
    // A fixed parameter is excluded from the free subset and reinserted at
    // its registered position by natural_full.
    //
    // Given
    // -----
    // - D (free), g0 (fixed at 1), sigma (free).
    //
    // Expect
    // ------
    // - 2 free parameters; natural_full returns [e^x0, 1, e^x1].
    fn fixed_values_are_reinserted() {
        let registry = ParamRegistry::new(three_specs()).expect("valid registry");
        assert_eq!(registry.n_free(), 2);
        assert_eq!(registry.free_names(), vec!["D", "sigma"]);
        let natural = registry.natural_full(&array![0.0, 3.0]).expect("matching length");
        assert!((natural[0] - 1.0).abs() < 1e-12);
        assert_eq!(natural[1], 1.0);
        assert!((natural[2] - 3.0_f64.exp()).abs() < 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Link-scale starts and bounds come from the natural specs through the
    // forward link.
    //
    // Given
    // -----
    // - sigma with natural bounds [1, 1000] on a log link.
    //
    // Expect
    // ------
    // - Start ln(100); bounds (0, ln 1000); unbounded D maps to (-inf, inf).
    fn link_scale_starts_and_bounds() {
        let registry = ParamRegistry::new(three_specs()).expect("valid registry");
        let start = registry.link_start();
        assert!((start[0] - 2.5_f64.ln()).abs() < 1e-12);
        assert!((start[1] - 100.0_f64.ln()).abs() < 1e-12);
        let bounds = registry.link_bounds();
        assert_eq!(bounds[0], (f64::NEG_INFINITY, f64::INFINITY));
        assert!((bounds[1].0 - 0.0).abs() < 1e-12);
        assert!((bounds[1].1 - 1000.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Invalid specs fail with the documented errors.
    //
    // Given
    // -----
    // - A duplicate name, a phase of -1 without a fixed value, a negative
    //   log-linked start, inverted bounds, and a start outside bounds.
    //
    // Expect
    // ------
    // - The matching ParamError variant in each case.
    fn invalid_specs_are_rejected() {
        let dup = vec![
            ParamSpec::free("D", LinkFn::Log, 1.0),
            ParamSpec::free("D", LinkFn::Log, 2.0),
        ];
        assert!(matches!(
            ParamRegistry::new(dup),
            Err(ParamError::DuplicateParameter { .. })
        ));

        let mut unfixed = ParamSpec::free("D", LinkFn::Log, 1.0);
        unfixed.phase = -1;
        assert!(matches!(
            ParamRegistry::new(vec![unfixed]),
            Err(ParamError::InvalidPhase { .. })
        ));

        let bad_start = vec![ParamSpec::free("sigma", LinkFn::Log, -3.0)];
        assert!(matches!(
            ParamRegistry::new(bad_start),
            Err(ParamError::InvalidStart { .. })
        ));

        let bad_bounds = vec![ParamSpec::free("D", LinkFn::Log, 1.0).with_bounds(5.0, 2.0)];
        assert!(matches!(
            ParamRegistry::new(bad_bounds),
            Err(ParamError::InvalidBounds { .. })
        ));

        let outside = vec![ParamSpec::free("D", LinkFn::Log, 10.0).with_bounds(1.0, 5.0)];
        assert!(matches!(
            ParamRegistry::new(outside),
            Err(ParamError::StartOutsideBounds { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Lookups by unknown name fail rather than falling through.
    //
    // Given
    // -----
    // - A registry without parameter "kappa".
    //
    // Expect
    // ------
    // - UnknownParameter from spec() and index_of().
    fn unknown_names_are_rejected() {
        let registry = ParamRegistry::new(three_specs()).expect("valid registry");
        assert!(matches!(
            registry.spec("kappa"),
            Err(ParamError::UnknownParameter { .. })
        ));
        assert!(matches!(
            registry.index_of("kappa"),
            Err(ParamError::UnknownParameter { .. })
        ));
    }
}
