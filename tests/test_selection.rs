//! Integration test: engine and selection semantics

use model_selector::error::{ErrorKind, Result};
use model_selector::training::{
    DecisionTreeRegressor, EngineConfig, Fittable, GridSet, LinearRegression, ParamGrid,
    ParamValue, Params, RandomForestRegressor, Regressor, Roster, SearchEngine,
};
use ndarray::{array, Array1, Array2};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Predicts the first feature, perturbed by `±noise` on alternating rows
#[derive(Debug, Clone)]
struct Perturbed {
    noise: f64,
    fits: Arc<AtomicUsize>,
}

impl Perturbed {
    fn new(noise: f64, fits: &Arc<AtomicUsize>) -> Self {
        Self {
            noise,
            fits: Arc::clone(fits),
        }
    }

    /// Noise giving R² = `target` on the `[0, 1, 2, 3]` test targets
    fn for_score(target: f64, fits: &Arc<AtomicUsize>) -> Self {
        Self::new(((1.0 - target) * 5.0 / 4.0).sqrt(), fits)
    }
}

impl Fittable for Perturbed {
    fn fit(&mut self, _x: &Array2<f64>, _y: &Array1<f64>) -> Result<()> {
        self.fits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(Array1::from_iter(x.column(0).iter().enumerate().map(|(i, v)| {
            if i % 2 == 0 {
                v + self.noise
            } else {
                v - self.noise
            }
        })))
    }

    fn get_params(&self) -> Params {
        Params::new().with("noise", self.noise)
    }

    fn set_params(&mut self, params: &Params) -> Result<()> {
        if let Some(noise) = params.get("noise").and_then(ParamValue::as_float) {
            self.noise = noise;
        }
        Ok(())
    }

    fn model_type(&self) -> &'static str {
        "Perturbed"
    }
}

fn quiet() -> SearchEngine {
    SearchEngine::new(EngineConfig {
        verbose: false,
        ..EngineConfig::default()
    })
}

fn identity_split() -> (Array2<f64>, Array1<f64>, Array2<f64>, Array1<f64>) {
    let x_train = Array2::from_shape_fn((9, 1), |(i, _)| i as f64);
    let y_train = x_train.column(0).to_owned();
    let x_test = array![[0.0], [1.0], [2.0], [3.0]];
    let y_test = array![0.0, 1.0, 2.0, 3.0];
    (x_train, y_train, x_test, y_test)
}

fn empty_grids(names: &[&str]) -> GridSet {
    names
        .iter()
        .fold(GridSet::new(), |grids, name| grids.with(*name, ParamGrid::new()))
}

#[test]
fn test_first_maximum_wins() {
    let fits = Arc::new(AtomicUsize::new(0));
    let mut roster: Roster<Perturbed> = Roster::new()
        .with("A", Perturbed::for_score(0.91, &fits))
        .with("B", Perturbed::for_score(0.95, &fits))
        .with("C", Perturbed::for_score(0.95, &fits));
    let grids = empty_grids(&["A", "B", "C"]);
    let (x_train, y_train, x_test, y_test) = identity_split();

    let report = quiet()
        .evaluate(&x_train, &y_train, &x_test, &y_test, &mut roster, &grids)
        .unwrap();

    assert!((report.score("A").unwrap() - 0.91).abs() < 1e-12);
    assert_eq!(report.score("B"), report.score("C"));
    assert_eq!(report.best().unwrap().name, "B");
    assert_eq!(report.names(), vec!["A", "B", "C"]);
}

#[test]
fn test_row_mismatch_rejected_before_any_fit() {
    let fits = Arc::new(AtomicUsize::new(0));
    let mut roster: Roster<Perturbed> = Roster::new().with("A", Perturbed::new(0.0, &fits));
    let grids = empty_grids(&["A"]);
    let (x_train, _, x_test, y_test) = identity_split();
    let short = array![0.0, 1.0];

    let err = quiet()
        .evaluate(&x_train, &short, &x_test, &y_test, &mut roster, &grids)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputShape);
    assert_eq!(fits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_grid_keys_must_match_roster() {
    let fits = Arc::new(AtomicUsize::new(0));
    let mut roster: Roster<Perturbed> = Roster::new()
        .with("A", Perturbed::new(0.0, &fits))
        .with("B", Perturbed::new(0.0, &fits));
    let (x_train, y_train, x_test, y_test) = identity_split();

    for grids in [empty_grids(&["A"]), empty_grids(&["A", "B", "Z"])] {
        let err = quiet()
            .evaluate(&x_train, &y_train, &x_test, &y_test, &mut roster, &grids)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
    assert_eq!(fits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_grid_search_picks_best_noise() {
    let fits = Arc::new(AtomicUsize::new(0));
    let mut roster: Roster<Perturbed> = Roster::new().with("A", Perturbed::new(5.0, &fits));
    let grids = GridSet::new().with("A", ParamGrid::new().floats("noise", &[2.0, 0.0, 1.0]));
    let (x_train, y_train, x_test, y_test) = identity_split();

    let report = quiet()
        .evaluate(&x_train, &y_train, &x_test, &y_test, &mut roster, &grids)
        .unwrap();
    let entry = report.get("A").unwrap();
    assert_eq!(entry.best_params.get("noise"), Some(&ParamValue::Float(0.0)));
    assert_eq!(entry.n_combinations, 3);
    assert_eq!(entry.r2, 1.0);
    // 3 combinations x 3 folds, plus the final refit
    assert_eq!(fits.load(Ordering::SeqCst), 10);
    assert_eq!(roster.get("A").unwrap().noise, 0.0);
}

fn seeded_roster() -> (Roster<Regressor>, GridSet) {
    let roster: Roster<Regressor> = Roster::new()
        .with("Linear Regression", LinearRegression::new())
        .with("Decision Tree", DecisionTreeRegressor::new())
        .with("Random Forest", RandomForestRegressor::new(10));
    let grids = GridSet::new()
        .with("Linear Regression", ParamGrid::new())
        .with(
            "Decision Tree",
            ParamGrid::new().categorical("criterion", &["squared_error", "absolute_error"]),
        )
        .with("Random Forest", ParamGrid::new().ints("n_estimators", &[4, 8]));
    (roster, grids)
}

fn noisy_split() -> (Array2<f64>, Array1<f64>, Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((48, 2), |(i, j)| ((i * (j + 5)) % 19) as f64);
    let y = Array1::from_iter(
        x.rows()
            .into_iter()
            .enumerate()
            .map(|(i, row)| (row[0] * 0.3).sin() * 4.0 + row[1] + (i % 3) as f64),
    );
    let split = 36;
    (
        x.slice(ndarray::s![..split, ..]).to_owned(),
        y.slice(ndarray::s![..split]).to_owned(),
        x.slice(ndarray::s![split.., ..]).to_owned(),
        y.slice(ndarray::s![split..]).to_owned(),
    )
}

#[test]
fn test_evaluate_is_idempotent() {
    let (x_train, y_train, x_test, y_test) = noisy_split();

    let run = || {
        let (mut roster, grids) = seeded_roster();
        quiet()
            .evaluate(&x_train, &y_train, &x_test, &y_test, &mut roster, &grids)
            .unwrap()
    };
    let first = run();
    let second = run();

    assert_eq!(first.names(), second.names());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.r2, b.r2);
        assert_eq!(a.best_params, b.best_params);
    }
}

#[test]
fn test_empty_grid_still_fits_and_scores() {
    let (x_train, y_train, x_test, y_test) = noisy_split();
    let mut roster: Roster<Regressor> = Roster::new().with("Linear Regression", LinearRegression::new());
    let grids = GridSet::new().with("Linear Regression", ParamGrid::new());

    let report = quiet()
        .evaluate(&x_train, &y_train, &x_test, &y_test, &mut roster, &grids)
        .unwrap();
    assert!(report.score("Linear Regression").unwrap().is_finite());
    assert!(roster.get("Linear Regression").unwrap().predict(&x_test).is_ok());
}
