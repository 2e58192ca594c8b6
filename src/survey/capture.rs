//! Per-session capture histories and auxiliary measurement components.
use crate::survey::errors::{SurveyError, SurveyResult};
use crate::survey::mask::Mask;
use crate::survey::traps::TrapArray;
use ndarray::Array2;

/// The auxiliary information types a survey can record alongside binary
/// detections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuxKind {
    TimeOfArrival,
    SignalStrength,
    Bearing,
    Distance,
}

impl AuxKind {
    /// Component name used in error messages and parameter naming.
    pub fn name(&self) -> &'static str {
        match self {
            AuxKind::TimeOfArrival => "toa",
            AuxKind::SignalStrength => "ss",
            AuxKind::Bearing => "bearing",
            AuxKind::Distance => "dist",
        }
    }
}

/// Binary capture histories plus aligned auxiliary measurement matrices.
///
/// The binary component is `n_individuals × n_detectors` with entries 0/1.
/// Every auxiliary component shares those dimensions exactly and must carry
/// a finite value wherever the binary component records a detection;
/// non-detections may hold any placeholder (they are never read).
/// Validation happens entirely at construction: the likelihood assembler
/// assumes a constructed history is well-formed.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureHistory {
    binary: Array2<f64>,
    toa: Option<Array2<f64>>,
    signal: Option<Array2<f64>>,
    bearing: Option<Array2<f64>>,
    distance: Option<Array2<f64>>,
}

impl CaptureHistory {
    /// Build a validated capture history.
    ///
    /// # Errors
    /// - [`SurveyError::EmptyCapture`] for zero individuals.
    /// - [`SurveyError::CaptureNotBinary`] naming the first non-0/1 entry.
    /// - [`SurveyError::NoDetections`] for an all-zero row.
    /// - [`SurveyError::AuxiliaryDimMismatch`] when any auxiliary component
    ///   differs in either dimension from the binary component — the data
    ///   are never truncated or padded.
    /// - [`SurveyError::AuxiliaryMissingAtDetection`] when an auxiliary
    ///   value is non-finite at a recorded detection.
    pub fn new(
        binary: Array2<f64>, toa: Option<Array2<f64>>, signal: Option<Array2<f64>>,
        bearing: Option<Array2<f64>>, distance: Option<Array2<f64>>,
    ) -> SurveyResult<CaptureHistory> {
        if binary.nrows() == 0 {
            return Err(SurveyError::EmptyCapture);
        }
        for ((row, col), &value) in binary.indexed_iter() {
            if value != 0.0 && value != 1.0 {
                return Err(SurveyError::CaptureNotBinary { row, col, value });
            }
        }
        for (row, r) in binary.rows().into_iter().enumerate() {
            if r.sum() == 0.0 {
                return Err(SurveyError::NoDetections { row });
            }
        }
        let expected = (binary.nrows(), binary.ncols());
        let components: [(&'static str, &Option<Array2<f64>>); 4] = [
            ("toa", &toa),
            ("ss", &signal),
            ("bearing", &bearing),
            ("dist", &distance),
        ];
        for (component, aux) in components {
            if let Some(aux) = aux {
                let found = (aux.nrows(), aux.ncols());
                if found != expected {
                    return Err(SurveyError::AuxiliaryDimMismatch { component, expected, found });
                }
                for ((row, col), &w) in binary.indexed_iter() {
                    if w == 1.0 && !aux[[row, col]].is_finite() {
                        return Err(SurveyError::AuxiliaryMissingAtDetection {
                            component,
                            row,
                            col,
                        });
                    }
                }
            }
        }
        Ok(CaptureHistory { binary, toa, signal, bearing, distance })
    }

    /// Number of detected individuals (or calls) in this session.
    pub fn n_individuals(&self) -> usize {
        self.binary.nrows()
    }

    /// Number of detector columns.
    pub fn n_detectors(&self) -> usize {
        self.binary.ncols()
    }

    /// Binary detection matrix.
    pub fn binary(&self) -> &Array2<f64> {
        &self.binary
    }

    /// Auxiliary component of the given kind, if recorded.
    pub fn auxiliary(&self, kind: AuxKind) -> Option<&Array2<f64>> {
        match kind {
            AuxKind::TimeOfArrival => self.toa.as_ref(),
            AuxKind::SignalStrength => self.signal.as_ref(),
            AuxKind::Bearing => self.bearing.as_ref(),
            AuxKind::Distance => self.distance.as_ref(),
        }
    }

    /// Whether the given auxiliary kind was recorded.
    pub fn has_auxiliary(&self, kind: AuxKind) -> bool {
        self.auxiliary(kind).is_some()
    }

    /// A new history containing the given rows (with repetition allowed).
    ///
    /// Used by the nonparametric bootstrap, which resamples individuals
    /// with replacement; validation is skipped because rows of a valid
    /// history remain valid.
    pub fn resample_rows(&self, rows: &[usize]) -> CaptureHistory {
        let take = |matrix: &Array2<f64>| -> Array2<f64> {
            let mut out = Array2::zeros((rows.len(), matrix.ncols()));
            for (i, &r) in rows.iter().enumerate() {
                out.row_mut(i).assign(&matrix.row(r));
            }
            out
        };
        CaptureHistory {
            binary: take(&self.binary),
            toa: self.toa.as_ref().map(&take),
            signal: self.signal.as_ref().map(&take),
            bearing: self.bearing.as_ref().map(&take),
            distance: self.distance.as_ref().map(&take),
        }
    }
}

/// One survey session: detectors, habitat mask, and capture data.
///
/// Construction checks the detector count against the capture-history
/// columns; the heavier per-component validation has already run inside
/// [`CaptureHistory::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub traps: TrapArray,
    pub mask: Mask,
    pub captures: CaptureHistory,
}

impl Session {
    /// Assemble a session, checking detector-count consistency.
    ///
    /// # Errors
    /// - [`SurveyError::TrapCountMismatch`] when the capture history's
    ///   column count differs from the number of detectors.
    pub fn new(traps: TrapArray, mask: Mask, captures: CaptureHistory) -> SurveyResult<Session> {
        if captures.n_detectors() != traps.n_traps() {
            return Err(SurveyError::TrapCountMismatch {
                traps: traps.n_traps(),
                capture_cols: captures.n_detectors(),
            });
        }
        Ok(Session { traps, mask, captures })
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
    // - Dimension-mismatch detection for auxiliary components (rows and
    //   columns), before any likelihood work could run.
    // - Binary-entry and empty-row validation.
    // - Trap-count consistency at session assembly.
    // - Row resampling used by the bootstrap.
    // -------------------------------------------------------------------------

    fn binary_2x3() -> Array2<f64> {
        array![[1.0, 0.0, 1.0], [0.0, 1.0, 0.0]]
    }

    #[test]
    // Purpose
    // -------
    // An auxiliary component with one fewer row than the binary component
    // must trigger the documented dimension-mismatch error.
    //
    // Given
    // -----
    // - A 2×3 binary matrix and a 1×3 TOA matrix.
    //
    // Expect
    // ------
    // - `AuxiliaryDimMismatch` for component "toa" with both shapes.
    fn auxiliary_row_mismatch_is_rejected() {
        let toa = array![[0.1, 0.0, 0.2]];
        let err = CaptureHistory::new(binary_2x3(), Some(toa), None, None, None).unwrap_err();
        assert_eq!(
            err,
            SurveyError::AuxiliaryDimMismatch {
                component: "toa",
                expected: (2, 3),
                found: (1, 3)
            }
        );
    }

    #[test]
    // Purpose
    // -------
    // An auxiliary component with one fewer column must also be rejected.
    //
    // Given
    // -----
    // - A 2×3 binary matrix and a 2×2 bearing matrix.
    //
    // Expect
    // ------
    // - `AuxiliaryDimMismatch` for component "bearing".
    fn auxiliary_column_mismatch_is_rejected() {
        let bearing = array![[0.1, 0.2], [0.3, 0.4]];
        let err = CaptureHistory::new(binary_2x3(), None, None, Some(bearing), None).unwrap_err();
        assert_eq!(
            err,
            SurveyError::AuxiliaryDimMismatch {
                component: "bearing",
                expected: (2, 3),
                found: (2, 2)
            }
        );
    }

    #[test]
    // Purpose
    // -------
    // Non-binary capture entries and all-zero rows are configuration
    // errors.
    //
    // Given
    // -----
    // - A matrix containing 0.5 and a matrix with an all-zero row.
    //
    // Expect
    // ------
    // - `CaptureNotBinary` and `NoDetections` respectively.
    fn binary_component_is_validated() {
        let err =
            CaptureHistory::new(array![[1.0, 0.5]], None, None, None, None).unwrap_err();
        assert_eq!(err, SurveyError::CaptureNotBinary { row: 0, col: 1, value: 0.5 });

        let err = CaptureHistory::new(array![[1.0, 0.0], [0.0, 0.0]], None, None, None, None)
            .unwrap_err();
        assert_eq!(err, SurveyError::NoDetections { row: 1 });
    }

    #[test]
    // Purpose
    // -------
    // A non-finite auxiliary value under a recorded detection is rejected.
    //
    // Given
    // -----
    // - A TOA matrix with NaN at a detection cell.
    //
    // Expect
    // ------
    // - `AuxiliaryMissingAtDetection` naming the cell.
    fn auxiliary_nan_at_detection_is_rejected() {
        let toa = array![[f64::NAN, 0.0, 0.2], [0.0, 0.4, 0.0]];
        let err = CaptureHistory::new(binary_2x3(), Some(toa), None, None, None).unwrap_err();
        assert_eq!(
            err,
            SurveyError::AuxiliaryMissingAtDetection { component: "toa", row: 0, col: 0 }
        );
    }

    #[test]
    // Purpose
    // -------
    // Session assembly rejects a trap-count mismatch.
    //
    // Given
    // -----
    // - Two detectors and a 3-column capture history.
    //
    // Expect
    // ------
    // - `TrapCountMismatch { traps: 2, capture_cols: 3 }`.
    fn session_rejects_trap_count_mismatch() {
        let traps = TrapArray::new(array![[0.0, 0.0], [10.0, 0.0]]).expect("valid traps");
        let mask = Mask::new(array![[5.0, 5.0]], 1.0, 10.0).expect("valid mask");
        let captures =
            CaptureHistory::new(binary_2x3(), None, None, None, None).expect("valid capture");
        let err = Session::new(traps, mask, captures).unwrap_err();
        assert_eq!(err, SurveyError::TrapCountMismatch { traps: 2, capture_cols: 3 });
    }

    #[test]
    // Purpose
    // -------
    // Row resampling preserves alignment between binary and auxiliary
    // components.
    //
    // Given
    // -----
    // - A 2-row history with TOA data, resampled as [1, 1, 0].
    //
    // Expect
    // ------
    // - 3 rows in both components, in the requested order.
    fn resample_rows_keeps_components_aligned() {
        let toa = array![[0.1, 0.0, 0.2], [0.0, 0.4, 0.0]];
        let history = CaptureHistory::new(binary_2x3(), Some(toa), None, None, None)
            .expect("valid capture");
        let resampled = history.resample_rows(&[1, 1, 0]);
        assert_eq!(resampled.n_individuals(), 3);
        assert_eq!(resampled.binary().row(0), binary_2x3().row(1));
        assert_eq!(
            resampled.auxiliary(AuxKind::TimeOfArrival).expect("toa kept").row(2)[0],
            0.1
        );
    }
}
