//! Detection-probability surfaces over the mask.
use crate::detection::DetFn;
use crate::numerics::LOG_FLOOR;
use ndarray::{Array1, Array2};

/// Per-(detector, mask-point) detection probabilities and their guarded
/// logs, plus the per-point overall detection probability.
///
/// `p_dot(m) = 1 − Π_t p2(t, m)` is floored at `f64::MIN_POSITIVE` so the
/// count-term log stays finite even when every detector is effectively
/// blind at a mask point. The floors are implementation guards only and
/// never surface in errors.
#[derive(Debug, Clone)]
pub struct DetProb {
    pub p1: Array2<f64>,
    pub log_p1: Array2<f64>,
    pub log_p2: Array2<f64>,
    pub p_dot: Array1<f64>,
}

impl DetProb {
    /// Evaluate the surfaces for one detection function over a
    /// detector × mask-point distance matrix.
    pub fn compute(detfn: &DetFn, distances: &Array2<f64>) -> DetProb {
        let p1 = distances.mapv(|d| detfn.evaluate_scalar(d));
        let log_p1 = p1.mapv(|p| (p + LOG_FLOOR).ln());
        let log_p2 = p1.mapv(|p| (1.0 - p + LOG_FLOOR).ln());
        let n_mask = distances.ncols();
        let mut p_dot = Array1::zeros(n_mask);
        for m in 0..n_mask {
            let p_none: f64 = p1.column(m).iter().map(|p| 1.0 - p).product();
            p_dot[m] = (1.0 - p_none).max(f64::MIN_POSITIVE);
        }
        DetProb { p1, log_p1, log_p2, p_dot }
    }

    /// Effective survey area: `cell_area · Σ_m p_dot(m)`.
    ///
    /// Derived from the current parameter vector, never optimized directly.
    pub fn esa(&self, cell_area: f64) -> f64 {
        cell_area * self.p_dot.sum()
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
    // - Monotonicity of p_dot in g0.
    // - Effective survey area against a first-principles re-derivation.
    // - Finite logs at probability 0 and 1.
    // -------------------------------------------------------------------------

    fn distances_2x3() -> Array2<f64> {
        array![[10.0, 50.0, 120.0], [30.0, 20.0, 90.0]]
    }

    #[test]
    // Purpose
    // -------
    // Increasing g0 can only increase the per-point overall detection
    // probability.
    //
    // Given
    // -----
    // - Halfnormal surfaces at g0 = 0.4 and g0 = 0.8 over the same
    //   distances.
    //
    // Expect
    // ------
    // - p_dot is entrywise non-decreasing across the pair.
    fn p_dot_is_monotone_in_g0() {
        let d = distances_2x3();
        let low = DetProb::compute(&DetFn::HalfNormal { g0: 0.4, sigma: 40.0 }, &d);
        let high = DetProb::compute(&DetFn::HalfNormal { g0: 0.8, sigma: 40.0 }, &d);
        for m in 0..3 {
            assert!(high.p_dot[m] >= low.p_dot[m]);
        }
    }

    #[test]
    // Purpose
    // -------
    // The effective survey area matches an independent re-derivation.
    //
    // Given
    // -----
    // - A fixed reference configuration with cell area 25.
    //
    // Expect
    // ------
    // - esa agrees with a direct loop over 1 − Π(1 − p1) to 1e-4 relative.
    fn esa_matches_first_principles() {
        let d = distances_2x3();
        let detfn = DetFn::HalfNormal { g0: 0.9, sigma: 45.0 };
        let surfaces = DetProb::compute(&detfn, &d);
        let cell_area = 25.0;

        let mut direct = 0.0;
        for m in 0..d.ncols() {
            let mut p_none = 1.0;
            for t in 0..d.nrows() {
                p_none *= 1.0 - detfn.evaluate_scalar(d[[t, m]]);
            }
            direct += 1.0 - p_none;
        }
        direct *= cell_area;

        let esa = surfaces.esa(cell_area);
        assert!((esa - direct).abs() / direct < 1e-4);
    }

    #[test]
    // Purpose
    // -------
    // Guarded logs stay finite at the probability extremes.
    //
    // Given
    // -----
    // - g0 = 1 at distance 0 (p1 = 1, p2 = 0) and an enormous distance
    //   (p1 = 0).
    //
    // Expect
    // ------
    // - All log entries finite; p_dot strictly positive everywhere.
    fn logs_are_finite_at_extremes() {
        let d = array![[0.0, 1e9]];
        let surfaces = DetProb::compute(&DetFn::HalfNormal { g0: 1.0, sigma: 10.0 }, &d);
        assert!(surfaces.log_p1.iter().all(|v| v.is_finite()));
        assert!(surfaces.log_p2.iter().all(|v| v.is_finite()));
        assert!(surfaces.p_dot.iter().all(|&v| v > 0.0));
    }
}
