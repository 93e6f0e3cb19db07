//! Integration test: default roster end-to-end

use model_selector::config::TrainerConfig;
use model_selector::logging::{self, LogConfig};
use model_selector::training::{default_grids, ModelTrainer, SavedModel};
use ndarray::{s, Array2};

/// Small positive-target table: `y = 3 + 2*a + b - 0.5*c` plus a wobble
fn table(n: usize, offset: usize) -> Array2<f64> {
    Array2::from_shape_fn((n, 4), |(i, j)| {
        let r = i + offset;
        let a = (r % 7) as f64;
        let b = ((r * 3) % 5) as f64;
        let c = ((r * 2) % 3) as f64;
        match j {
            0 => a,
            1 => b,
            2 => c,
            _ => 3.0 + 2.0 * a + b - 0.5 * c + 0.1 * ((r % 2) as f64),
        }
    })
}

#[test]
fn test_default_roster_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = dir.path().join("artifacts").join("model.bin");
    let handle = logging::init(LogConfig::default().with_directory(dir.path().join("logs"))).unwrap();
    let log_path = handle.path().to_path_buf();

    let config = TrainerConfig::default()
        .with_artifact_path(&artifact)
        .with_verbose(false);
    let trainer = ModelTrainer::new(config).with_logger(&handle);

    let train = table(30, 0);
    let test = table(12, 30);
    let outcome = trainer.train_detailed(&train, &test).unwrap();
    handle.teardown();

    // Report covers the roster, in roster order
    let expected: Vec<String> = default_grids().names().iter().map(|s| s.to_string()).collect();
    let names: Vec<String> = outcome.report.names().iter().map(|s| s.to_string()).collect();
    assert_eq!(names, expected);

    // Winner holds the first maximal score
    let max = outcome
        .report
        .iter()
        .map(|e| e.r2)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(outcome.best_score, max);
    let first_max = outcome.report.iter().find(|e| e.r2 == max).unwrap();
    assert_eq!(outcome.best_model_name, first_max.name);
    assert!(outcome.best_score > 0.9);

    // Artifact round trip
    let saved = SavedModel::load(&artifact).unwrap();
    assert_eq!(saved.metadata.name, outcome.best_model_name);
    assert_eq!(saved.metadata.n_features, 3);
    let x_test = test.slice(s![.., ..3]).to_owned();
    assert_eq!(saved.predict(&x_test).unwrap().len(), 12);

    // Log sink received the run
    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("Splitting training and test input data"));
    assert!(log.contains(&format!("Best Model saved as {}", outcome.best_model_name)));
}

#[test]
fn test_train_returns_identifier_and_overwrites_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = dir.path().join("model.bin");
    let trainer = ModelTrainer::new(
        TrainerConfig::default()
            .with_artifact_path(&artifact)
            .with_random_state(11)
            .with_verbose(false),
    );

    let first = trainer.train(&table(24, 0), &table(9, 24)).unwrap();
    let second = trainer.train(&table(24, 0), &table(9, 24)).unwrap();
    assert_eq!(first, second);
    assert_eq!(SavedModel::load(&artifact).unwrap().metadata.name, second);
}
