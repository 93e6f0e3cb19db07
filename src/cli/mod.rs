//! Command-line interface for training, prediction and artifact inspection

use clap::{Args, Parser, Subcommand};
use colored::*;
use ndarray::s;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::TrainerConfig;
use crate::dataset::{write_predictions, Dataset};
use crate::logging::{self, LogConfig};
use crate::training::{EvaluationReport, ModelTrainer, SavedModel};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "model-selector")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Grid-searched regression model selection")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tune every candidate, pick the best by test R² and save it
    Train(TrainOptions),

    /// Make predictions using a saved model
    Predict {
        /// Saved model artifact
        #[arg(short, long)]
        model: PathBuf,

        /// Input CSV; a trailing target column is ignored
        #[arg(short, long)]
        data: PathBuf,

        /// Output predictions CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the metadata of a saved model
    Info {
        /// Saved model artifact
        #[arg(short, long)]
        model: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct TrainOptions {
    /// Training CSV; the last column is the target
    #[arg(long)]
    pub train: PathBuf,

    /// Test CSV with the same columns
    #[arg(long)]
    pub test: PathBuf,

    /// Artifact path (default artifacts/model.bin)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of cross-validation folds
    #[arg(long)]
    pub cv_folds: Option<usize>,

    /// Refuse to save a model whose test R² is below this
    #[arg(long)]
    pub min_score: Option<f64>,

    /// Write the evaluation report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Trainer configuration JSON; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log directory
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,
}

impl TrainOptions {
    /// File configuration with command-line overrides applied
    pub fn trainer_config(&self) -> anyhow::Result<TrainerConfig> {
        let mut config = match &self.config {
            Some(path) => TrainerConfig::from_file(path)?,
            None => TrainerConfig::default(),
        };
        if let Some(output) = &self.output {
            config.artifact_path = output.clone();
        }
        if let Some(folds) = self.cv_folds {
            config.cv_folds = folds;
        }
        if let Some(min_score) = self.min_score {
            config.min_score = Some(min_score);
        }
        config.validate()?;
        Ok(config)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(opts: &TrainOptions) -> anyhow::Result<()> {
    section("Train");
    let config = opts.trainer_config()?;

    step_run("Loading data");
    let start = Instant::now();
    let train = Dataset::from_csv(&opts.train)?;
    let test = Dataset::from_csv(&opts.test)?;
    step_done(&format!(
        "train {} × {}, test {} × {} in {:?}",
        train.n_rows(),
        train.n_cols(),
        test.n_rows(),
        test.n_cols(),
        start.elapsed()
    ));

    let handle = logging::init(LogConfig::from_env().with_directory(&opts.log_dir))?;
    step_ok(&format!("Logging to {}", handle.path().display()));
    println!();

    let trainer = ModelTrainer::new(config).with_logger(&handle);
    let outcome = trainer.train_detailed(&train.data, &test.data);
    handle.teardown();
    let outcome = outcome?;

    print_report(&outcome.report);

    println!();
    println!(
        "  {} {} {} {:.4}",
        ok("best"),
        outcome.best_model_name.white().bold(),
        muted("R²:"),
        outcome.best_score
    );
    step_ok(&format!("Saved → {}", outcome.artifact_path.display()));

    if let Some(path) = &opts.report {
        write_report(path, &outcome.report)?;
        step_ok(&format!("Report → {}", path.display()));
    }

    println!();
    Ok(())
}

fn print_report(report: &EvaluationReport) {
    section("Results");
    println!(
        "  {:<24} {:>8} {:>16} {:>8} {:>9}",
        muted("Model"),
        muted("R²"),
        muted("CV R²"),
        muted("Grid"),
        muted("Time")
    );
    println!("  {}", dim(&"─".repeat(69)));
    for entry in report {
        println!(
            "  {:<24} {:>8.4} {:>9.4} ± {:<4.3} {:>8} {:>8.2}s",
            entry.name,
            entry.r2,
            entry.cv_mean,
            entry.cv_std,
            entry.n_combinations,
            entry.timings.total
        );
    }
    println!("  {}", dim(&"─".repeat(69)));
    println!("  {:<24} {:>53.2}s", muted("Total"), report.total_time);
}

fn write_report(path: &Path, report: &EvaluationReport) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}

pub fn cmd_predict(model_path: &Path, data_path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading model");
    let saved = SavedModel::load(model_path)?;
    step_done(&saved.metadata.name);

    step_run("Loading data");
    let data = Dataset::from_csv(data_path)?;
    step_done(&format!("{} rows × {} cols", data.n_rows(), data.n_cols()));

    let n_features = saved.metadata.n_features;
    let x = if data.n_cols() == n_features + 1 {
        data.data.slice(s![.., ..n_features]).to_owned()
    } else {
        data.data
    };

    step_run("Predicting");
    let start = Instant::now();
    let predictions = saved.predict(&x)?;
    step_done(&format!("{} rows in {:?}", predictions.len(), start.elapsed()));

    match output {
        Some(path) => {
            write_predictions(path, &predictions)?;
            step_ok(&format!("Saved → {}", path.display()));
        }
        None => {
            println!();
            for value in predictions.iter().take(10) {
                println!("  {:.6}", value);
            }
            if predictions.len() > 10 {
                println!("  {}", dim(&format!("… {} more", predictions.len() - 10)));
            }
        }
    }

    println!();
    Ok(())
}

pub fn cmd_info(model_path: &Path) -> anyhow::Result<()> {
    section("Model Info");

    let saved = SavedModel::load(model_path)?;
    let meta = &saved.metadata;

    println!("  {:<12} {}", muted("File"), model_path.display());
    println!("  {:<12} {}", muted("Name"), meta.name.white().bold());
    println!("  {:<12} {}", muted("Type"), meta.model_type);
    println!("  {:<12} {:.4}", muted("Test R²"), meta.score);
    println!("  {:<12} {}", muted("Features"), meta.n_features);
    println!("  {:<12} {}", muted("Trained"), meta.trained_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  {:<12} {}", muted("Version"), meta.version);
    println!();

    println!("  {:<24} {}", muted("Parameter"), muted("Value"));
    println!("  {}", dim(&"─".repeat(40)));
    for (name, value) in meta.params.iter() {
        println!("  {:<24} {}", name, value);
    }

    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_train_command() {
        let cli = Cli::try_parse_from([
            "model-selector",
            "train",
            "--train",
            "train.csv",
            "--test",
            "test.csv",
            "--cv-folds",
            "5",
            "--min-score",
            "0.5",
        ])
        .unwrap();
        match cli.command {
            Commands::Train(opts) => {
                assert_eq!(opts.train, PathBuf::from("train.csv"));
                assert_eq!(opts.log_dir, PathBuf::from("logs"));
                let config = opts.trainer_config().unwrap();
                assert_eq!(config.cv_folds, 5);
                assert_eq!(config.min_score, Some(0.5));
                assert_eq!(config.artifact_path, PathBuf::from("artifacts").join("model.bin"));
            }
            _ => panic!("expected train"),
        }
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trainer.json");
        std::fs::write(&path, r#"{"cv_folds": 4, "artifact_path": "a/b.bin"}"#).unwrap();

        let cli = Cli::try_parse_from([
            "model-selector",
            "train",
            "--train",
            "t.csv",
            "--test",
            "v.csv",
            "--config",
            path.to_str().unwrap(),
            "--output",
            "out/model.bin",
        ])
        .unwrap();
        let Commands::Train(opts) = cli.command else {
            panic!("expected train");
        };
        let config = opts.trainer_config().unwrap();
        assert_eq!(config.cv_folds, 4);
        assert_eq!(config.artifact_path, PathBuf::from("out/model.bin"));
    }

    #[test]
    fn test_cv_folds_below_two_rejected() {
        let cli = Cli::try_parse_from([
            "model-selector", "train", "--train", "t.csv", "--test", "v.csv", "--cv-folds", "1",
        ])
        .unwrap();
        let Commands::Train(opts) = cli.command else {
            panic!("expected train");
        };
        assert!(opts.trainer_config().is_err());
    }
}
