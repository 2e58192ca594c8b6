//! survey — survey geometry and observed data.
//!
//! Purpose
//! -------
//! Hold the immutable inputs to a fit: the discretized habitat mask, the
//! detector array, and per-session capture histories with their auxiliary
//! measurement components.
//!
//! Key behaviors
//! -------------
//! - Validate every component at construction (shapes, finiteness, binary
//!   entries, auxiliary alignment) so the likelihood layer can assume
//!   well-formed data.
//! - Precompute detector-to-mask distance and bearing matrices, the only
//!   geometry the likelihood needs.
//! - Support row resampling of capture histories for the nonparametric
//!   bootstrap without re-validating.
//!
//! Invariants & assumptions
//! ------------------------
//! - Mask, trap, and capture structures are immutable once built and are
//!   shared read-only across bootstrap workers.
//! - Detector order defines capture-history columns and the rows of all
//!   geometry matrices; mask-point order defines their columns.
//!
//! Conventions
//! -----------
//! - Coordinates are planar `(x, y)` pairs; bearings use the `atan2`
//!   convention in radians.
//! - Errors are [`SurveyError`] values that name the offending component,
//!   row, or column.
//!
//! Downstream usage
//! ----------------
//! - The likelihood layer consumes [`Session`] values and the geometry
//!   matrices from [`TrapArray`]; inference reads mask areas when scaling
//!   density estimates.
//!
//! Testing notes
//! -------------
//! - Unit tests cover construction-time validation (including the
//!   one-row/one-column auxiliary mismatches), geometry values against hand
//!   computations, and resampling alignment.

pub mod capture;
pub mod errors;
pub mod mask;
pub mod traps;

pub use self::capture::{AuxKind, CaptureHistory, Session};
pub use self::errors::{SurveyError, SurveyResult};
pub use self::mask::Mask;
pub use self::traps::TrapArray;
