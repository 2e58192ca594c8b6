//! Integration tests for the acoustic SCR fit pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end path: survey construction, model assembly,
//!   phased maximum-likelihood fitting, and post-fit inference.
//! - Exercise realistic small survey geometries rather than toy edge
//!   cases only.
//!
//! Coverage
//! --------
//! - `survey`: trap arrays, masks, capture histories, sessions.
//! - `likelihood::ScrModel`: construction, overrides, fitting with fixed
//!   parameters, and derived quantities.
//! - `inference`: coefficient extraction, standard errors, Wald
//!   intervals, prediction, and AIC.
//!
//! Exclusions
//! ----------
//! - Fine-grained validation of numerical helpers and error paths; those
//!   are covered by unit tests in each module.
//! - Large-scale bootstrap runs; the bootstrap has its own unit tests on
//!   a smaller model.
use acoustic_scr::detection::{DetFn, DetFnTag};
use acoustic_scr::inference::{aic, coef, confint, predict_density, vcov, CiMethod, CoefSet};
use acoustic_scr::likelihood::{DensityModel, DetProb, FitOverrides, ScrModel, ScrOptions};
use acoustic_scr::survey::{CaptureHistory, Mask, Session, TrapArray};
use ndarray::{array, Array2};

/// Four traps on a 100 m square with a coarse rectangular mask around
/// them and a capture pattern concentrated near the array.
fn survey_session() -> Session {
    let traps = TrapArray::new(array![
        [0.0, 0.0],
        [100.0, 0.0],
        [0.0, 100.0],
        [100.0, 100.0],
    ])
    .expect("valid traps");

    // 6 x 6 grid with 50 m spacing covering the array with a margin
    let mut points = Vec::new();
    for ix in 0..6 {
        for iy in 0..6 {
            points.push([-75.0 + 50.0 * ix as f64, -75.0 + 50.0 * iy as f64]);
        }
    }
    let flat: Vec<f64> = points.iter().flatten().copied().collect();
    let mask = Mask::new(
        Array2::from_shape_vec((36, 2), flat).expect("36x2"),
        2500.0,
        125.0,
    )
    .expect("valid mask");

    let captures = CaptureHistory::new(
        array![
            [1.0, 0.0, 0.0, 0.0],
            [1.0, 1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 1.0],
            [0.0, 0.0, 1.0, 0.0],
            [1.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 1.0],
            [1.0, 1.0, 1.0, 1.0],
            [0.0, 0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0, 1.0],
        ],
        None,
        None,
        None,
        None,
    )
    .expect("valid capture");

    Session::new(traps, mask, captures).expect("valid session")
}

fn model_with(overrides: FitOverrides) -> ScrModel {
    ScrModel::new(
        vec![survey_session()],
        DetFnTag::HalfNormal,
        DensityModel::Uniform,
        overrides,
        ScrOptions::default(),
    )
    .expect("valid model")
}

/// Purpose
/// -------
/// A fixed parameter must come back exactly as supplied, excluded from
/// the free count, and the rest of the fit must still be usable for
/// inference.
#[test]
fn fixed_g0_round_trips_through_the_fit() {
    let overrides =
        FitOverrides { fix: vec![("g0".to_string(), 0.9)], ..FitOverrides::default() };
    let model = model_with(overrides);
    let fit = model.fit().expect("fit succeeds");

    let g0 = fit.fitted().iter().find(|p| p.name == "g0").expect("g0 reported");
    assert_eq!(g0.value, 0.9);
    assert!(g0.link_value.is_none());
    assert_eq!(fit.n_free(), 2);

    // the fixed row of the covariance is zero, so its Wald interval
    // collapses to the point
    if fit.covariance().is_some() {
        let cis = confint(&fit, &["g0".to_string()], 0.95, CiMethod::Default)
            .expect("covariance present");
        assert_eq!(cis[0].lower, 0.9);
        assert_eq!(cis[0].upper, 0.9);
    }

    assert!(fit.nll().is_finite());
    assert!(aic(&fit).is_finite());
}

/// Purpose
/// -------
/// The optimum must not depend on the density start value: a fit from a
/// deliberately bad start has to land on the same estimates.
#[test]
fn density_start_does_not_move_the_optimum() {
    let default_fit = model_with(FitOverrides::default()).fit().expect("fit succeeds");
    let shifted = FitOverrides {
        start: vec![("D".to_string(), 1e-2)],
        ..FitOverrides::default()
    };
    let shifted_fit = model_with(shifted).fit().expect("fit succeeds");

    let d_default = default_fit.estimate("D").expect("D reported");
    let d_shifted = shifted_fit.estimate("D").expect("D reported");
    assert!(d_default > 0.0);
    assert!((d_default - d_shifted).abs() / d_default < 1e-3);

    let s_default = default_fit.estimate("sigma").expect("sigma reported");
    let s_shifted = shifted_fit.estimate("sigma").expect("sigma reported");
    assert!((s_default - s_shifted).abs() / s_default < 1e-3);
}

/// Purpose
/// -------
/// The derived effective survey area must agree with an independent
/// recomputation from the fitted detection function.
#[test]
fn derived_esa_matches_recomputation() {
    let model = model_with(FitOverrides::default());
    let fit = model.fit().expect("fit succeeds");

    let esa = fit.estimate("esa.1").expect("esa reported");
    let g0 = fit.estimate("g0").expect("g0 reported");
    let sigma = fit.estimate("sigma").expect("sigma reported");
    let detfn =
        DetFn::from_values(DetFnTag::HalfNormal, &[g0, sigma]).expect("valid parameters");

    let session = survey_session();
    let distances = session.traps.distance_matrix(&session.mask);
    let surfaces = DetProb::compute(&detfn, &distances);
    let direct = surfaces.esa(session.mask.cell_area());
    assert!((esa - direct).abs() / direct < 1e-6);
}

/// Purpose
/// -------
/// Coefficient selection, standard errors, and density prediction all
/// work off one fit, with consistent naming across them.
#[test]
fn inference_surface_is_consistent() {
    let fit = model_with(FitOverrides::default()).fit().expect("fit succeeds");

    let picked = coef(&fit, &[CoefSet::Fitted, CoefSet::Esa]).expect("valid selection");
    let names: Vec<&str> = picked.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["D", "g0", "sigma", "esa.1"]);

    if fit.covariance().is_some() {
        let ses = fit.std_errors().expect("covariance present");
        assert_eq!(ses.len(), fit.coef_names().len());
        assert!(ses.iter().all(|s| s.se.is_finite() && s.se >= 0.0));

        // the selected covariance submatrix carries the same labels and
        // the squared standard errors on its diagonal
        let sub = vcov(&fit, &[CoefSet::Fitted, CoefSet::Esa]).expect("covariance present");
        assert_eq!(sub.names, vec!["D", "g0", "sigma", "esa.1"]);
        for (k, name) in sub.names.iter().enumerate() {
            let se = ses.iter().find(|s| &s.name == name).expect("se reported").se;
            assert!((sub.matrix[[k, k]].max(0.0).sqrt() - se).abs() < 1e-9);
        }

        let predictions = predict_density(&fit, array![[1.0]].view(), &[], false, true)
            .expect("covariance present");
        let d = fit.estimate("D").expect("D reported");
        assert!((predictions[0].estimate - d).abs() < 1e-9 * d.max(1.0));
        assert!(predictions[0].se.expect("se requested") >= 0.0);
    }
}

/// Purpose
/// -------
/// Mismatched inputs are rejected at construction, never mid-fit.
#[test]
fn shape_mismatches_fail_at_construction() {
    let traps = TrapArray::new(array![[0.0, 0.0], [100.0, 0.0]]).expect("valid traps");
    let mask = Mask::new(array![[50.0, 50.0]], 2500.0, 125.0).expect("valid mask");
    // three columns of detections against two traps
    let captures = CaptureHistory::new(
        array![[1.0, 0.0, 1.0]],
        None,
        None,
        None,
        None,
    )
    .expect("valid capture");
    assert!(Session::new(traps, mask, captures).is_err());
}
