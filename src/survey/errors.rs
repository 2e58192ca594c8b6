/// Crate-wide result alias for survey-data operations.
pub type SurveyResult<T> = Result<T, SurveyError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SurveyError {
    // ---- Mask ----
    /// Mask coordinate matrix must have exactly two columns.
    MaskShapeInvalid {
        ncols: usize,
    },
    /// Mask must contain at least one point.
    EmptyMask,
    /// Mask coordinates must be finite.
    NonFiniteMaskPoint {
        row: usize,
    },
    /// Cell area must be finite and > 0.
    InvalidCellArea {
        value: f64,
    },
    /// Buffer distance must be finite and > 0.
    InvalidBuffer {
        value: f64,
    },

    // ---- Traps ----
    /// Trap coordinate matrix must have exactly two columns.
    TrapShapeInvalid {
        ncols: usize,
    },
    /// At least one detector is required.
    EmptyTraps,
    /// Trap coordinates must be finite.
    NonFiniteTrapPoint {
        row: usize,
    },

    // ---- Capture histories ----
    /// At least one detected individual is required.
    EmptyCapture,
    /// Binary capture entries must be exactly 0 or 1.
    CaptureNotBinary {
        row: usize,
        col: usize,
        value: f64,
    },
    /// Every capture row must contain at least one detection.
    NoDetections {
        row: usize,
    },
    /// Auxiliary component dimensions must equal the binary component's.
    AuxiliaryDimMismatch {
        component: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
    /// Auxiliary entries must be present (finite) exactly where the binary
    /// component records a detection.
    AuxiliaryMissingAtDetection {
        component: &'static str,
        row: usize,
        col: usize,
    },
    /// Capture-history column count must equal the number of detectors.
    TrapCountMismatch {
        traps: usize,
        capture_cols: usize,
    },
    /// An auxiliary component supplied in one session must be supplied in
    /// every session.
    AuxiliaryInconsistentAcrossSessions {
        component: &'static str,
    },
}

impl std::error::Error for SurveyError {}

impl std::fmt::Display for SurveyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurveyError::MaskShapeInvalid { ncols } => {
                write!(f, "Mask coordinates must have 2 columns, found {ncols}")
            }
            SurveyError::EmptyMask => write!(f, "Mask must contain at least one point"),
            SurveyError::NonFiniteMaskPoint { row } => {
                write!(f, "Non-finite mask coordinate at row {row}")
            }
            SurveyError::InvalidCellArea { value } => {
                write!(f, "Invalid mask cell area {value}: must be finite and > 0")
            }
            SurveyError::InvalidBuffer { value } => {
                write!(f, "Invalid mask buffer {value}: must be finite and > 0")
            }
            SurveyError::TrapShapeInvalid { ncols } => {
                write!(f, "Trap coordinates must have 2 columns, found {ncols}")
            }
            SurveyError::EmptyTraps => write!(f, "At least one detector is required"),
            SurveyError::NonFiniteTrapPoint { row } => {
                write!(f, "Non-finite trap coordinate at row {row}")
            }
            SurveyError::EmptyCapture => {
                write!(f, "Capture history must contain at least one individual")
            }
            SurveyError::CaptureNotBinary { row, col, value } => {
                write!(f, "Capture entry at ({row}, {col}) is {value}: must be 0 or 1")
            }
            SurveyError::NoDetections { row } => {
                write!(f, "Capture row {row} records no detections")
            }
            SurveyError::AuxiliaryDimMismatch { component, expected, found } => {
                write!(
                    f,
                    "Auxiliary component '{component}' has shape {found:?}, expected {expected:?} to match the binary capture component"
                )
            }
            SurveyError::AuxiliaryMissingAtDetection { component, row, col } => {
                write!(
                    f,
                    "Auxiliary component '{component}' is missing a value at detection ({row}, {col})"
                )
            }
            SurveyError::TrapCountMismatch { traps, capture_cols } => {
                write!(
                    f,
                    "Capture history has {capture_cols} detector columns but the trap array has {traps} detectors"
                )
            }
            SurveyError::AuxiliaryInconsistentAcrossSessions { component } => {
                write!(
                    f,
                    "Auxiliary component '{component}' is supplied in some sessions but not all"
                )
            }
        }
    }
}
