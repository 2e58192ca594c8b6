//! Discretized habitat mask.
use crate::survey::errors::{SurveyError, SurveyResult};
use ndarray::Array2;

/// Ordered set of candidate habitat locations used for spatial integration.
///
/// Immutable once built: the likelihood and every bootstrap worker read the
/// same mask concurrently. The cell area converts the per-point sum of
/// detection probabilities into an effective survey area, and the buffer
/// records the maximum detector-to-mask-edge distance used when the mask
/// was generated.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    points: Array2<f64>,
    cell_area: f64,
    buffer: f64,
}

impl Mask {
    /// Build a validated mask.
    ///
    /// # Arguments
    /// - `points`: `n × 2` matrix of planar coordinates, `n ≥ 1`, all finite.
    /// - `cell_area`: area represented by each mask point (hectares); finite
    ///   and strictly positive.
    /// - `buffer`: mask generation buffer distance; finite and strictly
    ///   positive.
    ///
    /// # Errors
    /// - [`SurveyError::MaskShapeInvalid`] for a non-2-column matrix.
    /// - [`SurveyError::EmptyMask`] for zero rows.
    /// - [`SurveyError::NonFiniteMaskPoint`] naming the first bad row.
    /// - [`SurveyError::InvalidCellArea`] / [`SurveyError::InvalidBuffer`].
    pub fn new(points: Array2<f64>, cell_area: f64, buffer: f64) -> SurveyResult<Mask> {
        if points.ncols() != 2 {
            return Err(SurveyError::MaskShapeInvalid { ncols: points.ncols() });
        }
        if points.nrows() == 0 {
            return Err(SurveyError::EmptyMask);
        }
        for (row, point) in points.rows().into_iter().enumerate() {
            if !point.iter().all(|v| v.is_finite()) {
                return Err(SurveyError::NonFiniteMaskPoint { row });
            }
        }
        if !cell_area.is_finite() || cell_area <= 0.0 {
            return Err(SurveyError::InvalidCellArea { value: cell_area });
        }
        if !buffer.is_finite() || buffer <= 0.0 {
            return Err(SurveyError::InvalidBuffer { value: buffer });
        }
        Ok(Mask { points, cell_area, buffer })
    }

    /// Number of mask points.
    pub fn n_points(&self) -> usize {
        self.points.nrows()
    }

    /// Coordinates of mask point `m`.
    pub fn point(&self, m: usize) -> (f64, f64) {
        (self.points[[m, 0]], self.points[[m, 1]])
    }

    /// Area represented by each mask point.
    pub fn cell_area(&self) -> f64 {
        self.cell_area
    }

    /// Buffer distance used when generating the mask.
    pub fn buffer(&self) -> f64 {
        self.buffer
    }

    /// Full coordinate matrix (read-only).
    pub fn points(&self) -> &Array2<f64> {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Construction-time validation of mask geometry and scalars.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Accept a well-formed mask and expose its dimensions.
    //
    // Given
    // -----
    // - A 3-point, 2-column coordinate matrix with valid area and buffer.
    //
    // Expect
    // ------
    // - Construction succeeds; accessors reflect the inputs.
    fn mask_accepts_valid_input() {
        let mask = Mask::new(array![[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]], 25.0, 100.0)
            .expect("valid mask");
        assert_eq!(mask.n_points(), 3);
        assert_eq!(mask.cell_area(), 25.0);
        assert_eq!(mask.point(1), (10.0, 0.0));
    }

    #[test]
    // Purpose
    // -------
    // Reject malformed geometry and scalars with the documented errors.
    //
    // Given
    // -----
    // - A 3-column matrix, an empty matrix, a NaN coordinate, a zero cell
    //   area, and a negative buffer.
    //
    // Expect
    // ------
    // - Each case fails with the matching `SurveyError` variant.
    fn mask_rejects_malformed_input() {
        assert_eq!(
            Mask::new(Array2::zeros((2, 3)), 1.0, 1.0),
            Err(SurveyError::MaskShapeInvalid { ncols: 3 })
        );
        assert_eq!(Mask::new(Array2::zeros((0, 2)), 1.0, 1.0), Err(SurveyError::EmptyMask));
        assert_eq!(
            Mask::new(array![[0.0, f64::NAN]], 1.0, 1.0),
            Err(SurveyError::NonFiniteMaskPoint { row: 0 })
        );
        assert_eq!(
            Mask::new(array![[0.0, 0.0]], 0.0, 1.0),
            Err(SurveyError::InvalidCellArea { value: 0.0 })
        );
        assert_eq!(
            Mask::new(array![[0.0, 0.0]], 1.0, -5.0),
            Err(SurveyError::InvalidBuffer { value: -5.0 })
        );
    }
}
