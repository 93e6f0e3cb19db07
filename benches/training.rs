use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use model_selector::training::{
    DecisionTreeRegressor, EngineConfig, Fittable, GridSearchCV, GridSet, KFold, LinearRegression,
    ParamGrid, RandomForestRegressor, Regressor, Roster, SearchEngine,
};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_regression_data(n_rows: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let x = Array2::from_shape_fn((n_rows, n_features), |_| rng.gen::<f64>() * 10.0);
    // Target as sum of features + noise
    let y = Array1::from_iter(
        x.rows()
            .into_iter()
            .map(|row| row.sum() + rng.gen::<f64>() * 0.1),
    );
    (x, y)
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [500, 2000].iter() {
        let (x, y) = create_regression_data(*n_rows, 10);

        group.bench_with_input(BenchmarkId::new("decision_tree", n_rows), &(&x, &y), |b, (x, y)| {
            b.iter(|| {
                let mut model = DecisionTreeRegressor::new();
                model.fit(black_box(x), black_box(y)).unwrap();
            })
        });

        group.bench_with_input(BenchmarkId::new("random_forest", n_rows), &(&x, &y), |b, (x, y)| {
            b.iter(|| {
                let mut model = RandomForestRegressor::new(32);
                model.fit(black_box(x), black_box(y)).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_grid_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_search");
    group.sample_size(10);

    let (x, y) = create_regression_data(1000, 8);
    let grid = ParamGrid::new()
        .categorical("criterion", &["squared_error", "friedman_mse"])
        .ints("max_depth", &[4, 8, 12]);

    for parallel in [false, true] {
        let search = GridSearchCV::new(KFold::new(3)).with_parallel(parallel);
        group.bench_function(BenchmarkId::new("decision_tree", parallel), |b| {
            b.iter(|| {
                search
                    .fit(&DecisionTreeRegressor::new(), &grid, black_box(&x), black_box(&y))
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    group.sample_size(10);

    let (x, y) = create_regression_data(1200, 6);
    let x_train = x.slice(ndarray::s![..1000, ..]).to_owned();
    let y_train = y.slice(ndarray::s![..1000]).to_owned();
    let x_test = x.slice(ndarray::s![1000.., ..]).to_owned();
    let y_test = y.slice(ndarray::s![1000..]).to_owned();

    let engine = SearchEngine::new(EngineConfig {
        verbose: false,
        ..EngineConfig::default()
    });
    let grids = GridSet::new()
        .with("Linear Regression", ParamGrid::new())
        .with("Random Forest", ParamGrid::new().ints("n_estimators", &[8, 16]));

    group.bench_function("two_candidates", |b| {
        b.iter(|| {
            let mut roster: Roster<Regressor> = Roster::new()
                .with("Linear Regression", LinearRegression::new())
                .with("Random Forest", RandomForestRegressor::default());
            engine
                .evaluate(&x_train, &y_train, &x_test, &y_test, &mut roster, &grids)
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_fit, bench_grid_search, bench_evaluate);
criterion_main!(benches);
