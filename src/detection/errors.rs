/// Crate-wide result alias for detection-function operations.
pub type DetFnResult<T> = Result<T, DetFnError>;

#[derive(Debug, Clone, PartialEq)]
pub enum DetFnError {
    /// Supplied named-parameter set does not equal the tag's required set.
    ParameterSetMismatch {
        tag: &'static str,
        missing: Vec<String>,
        extra: Vec<String>,
    },

    /// A parameter value lies outside its natural domain.
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Unknown detection-function tag name.
    UnknownTag {
        name: String,
    },
}

impl std::error::Error for DetFnError {}

impl std::fmt::Display for DetFnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetFnError::ParameterSetMismatch { tag, missing, extra } => {
                write!(
                    f,
                    "Parameter set mismatch for detection function '{tag}': missing {missing:?}, extra {extra:?}"
                )
            }
            DetFnError::InvalidParameter { name, value, reason } => {
                write!(f, "Invalid detection parameter '{name}' = {value}: {reason}")
            }
            DetFnError::UnknownTag { name } => {
                write!(f, "Unknown detection function tag '{name}'")
            }
        }
    }
}
