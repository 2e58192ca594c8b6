//! acoustic_scr — maximum-likelihood spatial capture-recapture for acoustic surveys.
//!
//! Purpose
//! -------
//! Estimate animal or call density from detections of sound sources on an
//! array of detectors, by maximizing a spatially explicit capture-recapture
//! likelihood over a habitat mask. Supports six detection-function
//! families, auxiliary measurements (times of arrival, signal strengths,
//! bearings, distances), multi-session surveys, and covariate density
//! surfaces.
//!
//! Key behaviors
//! -------------
//! - `survey` validates the raw inputs: detector arrays, habitat masks,
//!   and capture histories with their auxiliary matrices.
//! - `detection` provides the detection-probability families.
//! - `params` maps natural-scale parameters through link functions, with
//!   fixed values, bounds, and optimization phases.
//! - `likelihood` assembles the negative log-likelihood and drives the
//!   fit through `optimize`, a phased bounded L-BFGS front end.
//! - `inference` turns a fit into coefficients, standard errors,
//!   confidence intervals, density predictions, and bootstrap draws.
//!
//! Conventions
//! -----------
//! - Distances, coordinates, and mask cell areas share one length unit;
//!   densities are per unit area of that unit squared.
//! - Detector-by-mask-point matrices put detectors on rows.
//! - All fallible operations return module-specific error enums; none of
//!   the library code panics on bad input.
//!
//! Testing notes
//! -------------
//! - Each module carries unit tests against hand-computed values; the
//!   end-to-end fit pipeline is exercised in `tests/`.

pub mod detection;
pub mod inference;
pub mod likelihood;
pub mod numerics;
pub mod optimize;
pub mod params;
pub mod survey;
