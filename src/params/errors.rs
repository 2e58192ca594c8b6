/// Crate-wide result alias for parameter-registry operations.
pub type ParamResult<T> = Result<T, ParamError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ParamError {
    /// A name was supplied that the model does not define.
    UnknownParameter {
        name: String,
    },
    /// The same parameter name was registered twice.
    DuplicateParameter {
        name: String,
    },
    /// Start values must be finite and inside the natural domain.
    InvalidStart {
        name: String,
        value: f64,
        reason: &'static str,
    },
    /// Bounds must satisfy lower < upper and respect the natural domain.
    InvalidBounds {
        name: String,
        lower: f64,
        upper: f64,
        reason: &'static str,
    },
    /// A start value must lie inside its bounds.
    StartOutsideBounds {
        name: String,
        start: f64,
        lower: f64,
        upper: f64,
    },
    /// A fixed value must be finite and inside the natural domain.
    InvalidFixedValue {
        name: String,
        value: f64,
        reason: &'static str,
    },
    /// Phase numbers must be -1 (fixed) or >= 0.
    InvalidPhase {
        name: String,
        phase: i32,
    },
    /// Link-vector length must match the number of free parameters.
    LinkVectorLength {
        expected: usize,
        found: usize,
    },
}

impl std::error::Error for ParamError {}

impl std::fmt::Display for ParamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamError::UnknownParameter { name } => {
                write!(f, "Unknown parameter '{name}'")
            }
            ParamError::DuplicateParameter { name } => {
                write!(f, "Parameter '{name}' registered more than once")
            }
            ParamError::InvalidStart { name, value, reason } => {
                write!(f, "Invalid start value {value} for '{name}': {reason}")
            }
            ParamError::InvalidBounds { name, lower, upper, reason } => {
                write!(f, "Invalid bounds [{lower}, {upper}] for '{name}': {reason}")
            }
            ParamError::StartOutsideBounds { name, start, lower, upper } => {
                write!(
                    f,
                    "Start value {start} for '{name}' lies outside its bounds [{lower}, {upper}]"
                )
            }
            ParamError::InvalidFixedValue { name, value, reason } => {
                write!(f, "Invalid fixed value {value} for '{name}': {reason}")
            }
            ParamError::InvalidPhase { name, phase } => {
                write!(f, "Invalid phase {phase} for '{name}': must be -1 or >= 0")
            }
            ParamError::LinkVectorLength { expected, found } => {
                write!(
                    f,
                    "Link-scale vector has length {found}, expected {expected} free parameters"
                )
            }
        }
    }
}
