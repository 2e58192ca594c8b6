use crate::likelihood::LikelihoodError;
use crate::optimize::OptError;

/// Crate-wide result alias for post-fit inference.
pub type InferenceResult<T> = Result<T, InferenceError>;

#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Wrapped layers ----
    /// Optimizer or Hessian failure during inference.
    Opt(OptError),
    /// Likelihood failure during a refit or prediction.
    Likelihood(Box<LikelihoodError>),

    // ---- Inference requests ----
    /// A requested coefficient name does not exist in this fit.
    UnknownParameter {
        name: String,
    },
    /// The fit carries no covariance matrix.
    CovarianceUnavailable {
        reason: &'static str,
    },
    /// The requested method needs bootstrap draws that are not attached.
    BootstrapRequired {
        method: &'static str,
    },
    /// One bootstrap replicate failed to refit.
    BootstrapRefitFailed {
        index: usize,
        text: String,
    },
    /// Prediction rows must match the fitted density design width.
    DesignShapeMismatch {
        expected: usize,
        found: usize,
    },
    /// Confidence levels must lie strictly inside (0, 1).
    InvalidLevel {
        level: f64,
    },
    /// Bootstrap replication counts must be at least 2.
    InvalidBootstrapCount {
        n_boot: usize,
    },
}

impl std::error::Error for InferenceError {}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceError::Opt(e) => write!(f, "Optimizer error: {e}"),
            InferenceError::Likelihood(e) => write!(f, "Likelihood error: {e}"),
            InferenceError::UnknownParameter { name } => {
                write!(f, "Unknown coefficient '{name}'")
            }
            InferenceError::CovarianceUnavailable { reason } => {
                write!(f, "Covariance matrix unavailable: {reason}")
            }
            InferenceError::BootstrapRequired { method } => {
                write!(f, "Method '{method}' requires bootstrap draws; run the bootstrap first")
            }
            InferenceError::BootstrapRefitFailed { index, text } => {
                write!(f, "Bootstrap replicate {index} failed to refit: {text}")
            }
            InferenceError::DesignShapeMismatch { expected, found } => {
                write!(
                    f,
                    "Prediction rows have {found} columns, expected {expected} density coefficients"
                )
            }
            InferenceError::InvalidLevel { level } => {
                write!(f, "Confidence level {level} must lie strictly inside (0, 1)")
            }
            InferenceError::InvalidBootstrapCount { n_boot } => {
                write!(f, "Bootstrap needs at least 2 replicates, got {n_boot}")
            }
        }
    }
}

impl From<OptError> for InferenceError {
    fn from(e: OptError) -> Self {
        InferenceError::Opt(e)
    }
}

impl From<LikelihoodError> for InferenceError {
    fn from(e: LikelihoodError) -> Self {
        InferenceError::Likelihood(Box::new(e))
    }
}
