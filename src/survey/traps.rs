//! Detector array and detector-to-mask geometry.
use crate::survey::errors::{SurveyError, SurveyResult};
use crate::survey::mask::Mask;
use ndarray::Array2;

/// Ordered set of detector locations.
///
/// Detector order defines the columns of every capture history and the rows
/// of every distance, bearing, and probability matrix. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TrapArray {
    locations: Array2<f64>,
}

impl TrapArray {
    /// Build a validated detector array from an `n × 2` coordinate matrix.
    ///
    /// # Errors
    /// - [`SurveyError::TrapShapeInvalid`] for a non-2-column matrix.
    /// - [`SurveyError::EmptyTraps`] for zero rows.
    /// - [`SurveyError::NonFiniteTrapPoint`] naming the first bad row.
    pub fn new(locations: Array2<f64>) -> SurveyResult<TrapArray> {
        if locations.ncols() != 2 {
            return Err(SurveyError::TrapShapeInvalid { ncols: locations.ncols() });
        }
        if locations.nrows() == 0 {
            return Err(SurveyError::EmptyTraps);
        }
        for (row, point) in locations.rows().into_iter().enumerate() {
            if !point.iter().all(|v| v.is_finite()) {
                return Err(SurveyError::NonFiniteTrapPoint { row });
            }
        }
        Ok(TrapArray { locations })
    }

    /// Number of detectors.
    pub fn n_traps(&self) -> usize {
        self.locations.nrows()
    }

    /// Coordinates of detector `t`.
    pub fn location(&self, t: usize) -> (f64, f64) {
        (self.locations[[t, 0]], self.locations[[t, 1]])
    }

    /// Euclidean detector × mask-point distance matrix.
    ///
    /// Deterministic in the detector and mask orders; row `t`, column `m`
    /// holds the distance from detector `t` to mask point `m`.
    pub fn distance_matrix(&self, mask: &Mask) -> Array2<f64> {
        let n_traps = self.n_traps();
        let n_mask = mask.n_points();
        let mut distances = Array2::zeros((n_traps, n_mask));
        for t in 0..n_traps {
            let (tx, ty) = self.location(t);
            for m in 0..n_mask {
                let (mx, my) = mask.point(m);
                distances[[t, m]] = ((mx - tx).powi(2) + (my - ty).powi(2)).sqrt();
            }
        }
        distances
    }

    /// Detector × mask-point bearing matrix (radians, `atan2` convention).
    ///
    /// Entry `(t, m)` is the bearing from detector `t` toward mask point
    /// `m`; used by the von Mises bearing density.
    pub fn bearing_matrix(&self, mask: &Mask) -> Array2<f64> {
        let n_traps = self.n_traps();
        let n_mask = mask.n_points();
        let mut bearings = Array2::zeros((n_traps, n_mask));
        for t in 0..n_traps {
            let (tx, ty) = self.location(t);
            for m in 0..n_mask {
                let (mx, my) = mask.point(m);
                bearings[[t, m]] = (my - ty).atan2(mx - tx);
            }
        }
        bearings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Detector validation and the determinism/values of the distance and
    // bearing matrices.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify the distance matrix against hand-computed Euclidean values.
    //
    // Given
    // -----
    // - Two detectors at (0,0) and (3,0); mask points at (0,4) and (3,4).
    //
    // Expect
    // ------
    // - Distances {5, 4} from the first detector and {√(9+16)? no: √(9+16)}
    //   from the second, matching 3-4-5 geometry.
    fn distance_matrix_matches_hand_computation() {
        let traps = TrapArray::new(array![[0.0, 0.0], [3.0, 0.0]]).expect("valid traps");
        let mask = Mask::new(array![[0.0, 4.0], [3.0, 4.0]], 1.0, 10.0).expect("valid mask");
        let d = traps.distance_matrix(&mask);
        assert!((d[[0, 0]] - 4.0).abs() < 1e-12);
        assert!((d[[0, 1]] - 5.0).abs() < 1e-12);
        assert!((d[[1, 0]] - 5.0).abs() < 1e-12);
        assert!((d[[1, 1]] - 4.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify bearings follow the atan2 convention.
    //
    // Given
    // -----
    // - A detector at the origin and mask points due east and due north.
    //
    // Expect
    // ------
    // - Bearings 0 and π/2 respectively.
    fn bearing_matrix_follows_atan2_convention() {
        let traps = TrapArray::new(array![[0.0, 0.0]]).expect("valid traps");
        let mask = Mask::new(array![[1.0, 0.0], [0.0, 1.0]], 1.0, 10.0).expect("valid mask");
        let b = traps.bearing_matrix(&mask);
        assert!(b[[0, 0]].abs() < 1e-12);
        assert!((b[[0, 1]] - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Reject malformed detector arrays.
    //
    // Given
    // -----
    // - An empty matrix and a NaN coordinate.
    //
    // Expect
    // ------
    // - `EmptyTraps` and `NonFiniteTrapPoint` respectively.
    fn trap_array_rejects_malformed_input() {
        assert_eq!(TrapArray::new(Array2::zeros((0, 2))), Err(SurveyError::EmptyTraps));
        assert_eq!(
            TrapArray::new(array![[f64::NAN, 0.0]]),
            Err(SurveyError::NonFiniteTrapPoint { row: 0 })
        );
    }
}
