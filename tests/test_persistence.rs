//! Integration test: artifact persistence

use model_selector::error::ErrorKind;
use model_selector::persistence::{load_object, save_object};
use model_selector::training::{
    Fittable, GradientBoostingConfig, GradientBoostingRegressor, RandomForestRegressor, Regressor,
};
use ndarray::{Array1, Array2};

fn make_data() -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((40, 3), |(i, j)| ((i * (j + 1) + j) % 9) as f64);
    let y = Array1::from_iter(x.rows().into_iter().map(|r| r[0] * 2.0 - r[1] + 0.5 * r[2]));
    (x, y)
}

#[test]
fn test_loaded_model_predicts_identically() {
    let dir = tempfile::tempdir().unwrap();
    let (x, y) = make_data();

    let mut forest: Regressor = RandomForestRegressor::new(12).with_random_state(5).into();
    forest.fit(&x, &y).unwrap();
    let path = dir.path().join("forest.bin");
    save_object(&path, &forest).unwrap();
    let restored: Regressor = load_object(&path).unwrap();
    assert_eq!(restored.predict(&x).unwrap(), forest.predict(&x).unwrap());
    assert_eq!(restored.get_params(), forest.get_params());

    let mut boosted: Regressor = GradientBoostingRegressor::new(GradientBoostingConfig::default()).into();
    boosted.fit(&x, &y).unwrap();
    let path = dir.path().join("boosted.bin");
    save_object(&path, &boosted).unwrap();
    let restored: Regressor = load_object(&path).unwrap();
    assert_eq!(restored.predict(&x).unwrap(), boosted.predict(&x).unwrap());
}

#[test]
fn test_save_creates_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a").join("b").join("model.bin");
    assert!(!path.parent().unwrap().exists());

    save_object(&path, &vec![1.0f64, 2.0]).unwrap();
    assert!(path.exists());
}

#[test]
fn test_second_save_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");

    save_object(&path, &vec![0u8; 4096]).unwrap();
    save_object(&path, &"second".to_string()).unwrap();
    let restored: String = load_object(&path).unwrap();
    assert_eq!(restored, "second");
}

#[test]
fn test_absent_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_object::<Regressor>(dir.path().join("missing.bin")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().starts_with("Error occurred in Rust script name ["));
}

#[test]
fn test_corrupt_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.bin");
    std::fs::write(&path, b"definitely not an artifact").unwrap();
    let err = load_object::<Regressor>(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);

    save_object(&path, &vec![3u32; 8]).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    let err = load_object::<Vec<u32>>(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}
