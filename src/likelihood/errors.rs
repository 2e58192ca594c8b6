use crate::detection::DetFnError;
use crate::optimize::OptError;
use crate::params::ParamError;
use crate::survey::SurveyError;

/// Crate-wide result alias for likelihood operations.
pub type LikelihoodResult<T> = Result<T, LikelihoodError>;

#[derive(Debug, Clone, PartialEq)]
pub enum LikelihoodError {
    // ---- Wrapped layers ----
    /// Detection-function construction or validation failure.
    Detection(DetFnError),
    /// Survey-data validation failure.
    Survey(SurveyError),
    /// Parameter-registry failure.
    Param(ParamError),
    /// Optimizer failure during a fit.
    Opt(OptError),

    // ---- Model configuration ----
    /// At least one session is required.
    EmptySessionList,
    /// Signal-strength auxiliary data requires a signal-strength detection
    /// function.
    SignalStrengthRequiresSsDetFn {
        tag: &'static str,
    },
    /// Signal-strength detection functions need a cutoff value.
    MissingCutoff,
    /// Sound speed must be finite and > 0 when time-of-arrival data are
    /// present.
    InvalidSoundSpeed {
        value: f64,
    },
    /// Cue rate and survey length must both be finite and > 0, together.
    InvalidCueRate {
        rate: f64,
        survey_length: f64,
        reason: &'static str,
    },
    /// A density design matrix must have one row per mask point.
    DensityDesignMismatch {
        session: usize,
        expected: usize,
        found: usize,
    },
    /// Covariate density models need at least one design column, with one
    /// name per column.
    DensityDesignNames {
        columns: usize,
        names: usize,
    },
    /// Covariate density models need one design matrix per session.
    DensityDesignCount {
        expected: usize,
        found: usize,
    },
}

impl std::error::Error for LikelihoodError {}

impl std::fmt::Display for LikelihoodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LikelihoodError::Detection(e) => write!(f, "Detection function error: {e}"),
            LikelihoodError::Survey(e) => write!(f, "Survey data error: {e}"),
            LikelihoodError::Param(e) => write!(f, "Parameter error: {e}"),
            LikelihoodError::Opt(e) => write!(f, "Optimizer error: {e}"),
            LikelihoodError::EmptySessionList => {
                write!(f, "At least one session is required")
            }
            LikelihoodError::SignalStrengthRequiresSsDetFn { tag } => {
                write!(
                    f,
                    "Signal-strength auxiliary data requires a signal-strength detection function, found '{tag}'"
                )
            }
            LikelihoodError::MissingCutoff => {
                write!(f, "Signal-strength detection functions require a cutoff value")
            }
            LikelihoodError::InvalidSoundSpeed { value } => {
                write!(f, "Invalid sound speed {value}: must be finite and > 0")
            }
            LikelihoodError::InvalidCueRate { rate, survey_length, reason } => {
                write!(
                    f,
                    "Invalid cue rate configuration (rate {rate}, survey length {survey_length}): {reason}"
                )
            }
            LikelihoodError::DensityDesignMismatch { session, expected, found } => {
                write!(
                    f,
                    "Density design for session {session} has {found} rows, expected {expected} mask points"
                )
            }
            LikelihoodError::DensityDesignNames { columns, names } => {
                write!(
                    f,
                    "Density design has {columns} columns but {names} coefficient names"
                )
            }
            LikelihoodError::DensityDesignCount { expected, found } => {
                write!(
                    f,
                    "Covariate density model has {found} design matrices for {expected} sessions"
                )
            }
        }
    }
}

impl From<DetFnError> for LikelihoodError {
    fn from(e: DetFnError) -> Self {
        LikelihoodError::Detection(e)
    }
}

impl From<SurveyError> for LikelihoodError {
    fn from(e: SurveyError) -> Self {
        LikelihoodError::Survey(e)
    }
}

impl From<ParamError> for LikelihoodError {
    fn from(e: ParamError) -> Self {
        LikelihoodError::Param(e)
    }
}

impl From<OptError> for LikelihoodError {
    fn from(e: OptError) -> Self {
        LikelihoodError::Opt(e)
    }
}
