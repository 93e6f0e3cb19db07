//! CSV loading and feature/target splitting

use crate::error::{Result, SelectorError};
use ndarray::{s, Array1, Array2};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Numeric table read from a CSV file
#[derive(Debug, Clone)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub data: Array2<f64>,
}

impl Dataset {
    /// Read a headed CSV whose every column is numeric
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let df = load_csv(path.as_ref())?;
        Self::from_dataframe(&df)
    }

    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let data = dataframe_to_array(df, &columns)?;
        Ok(Self { columns, data })
    }

    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }
}

/// Load a CSV file with a header row
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .map_err(|e| SelectorError::DataError(format!("{}: {}", path.display(), e)))?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| SelectorError::DataError(format!("{}: {}", path.display(), e)))?;

    debug!(path = %path.display(), rows = df.height(), cols = df.width(), "CSV loaded");
    Ok(df)
}

/// Convert the named columns to a row-major `f64` matrix
///
/// Missing or non-numeric cells are rejected; the input is expected to be
/// fully prepared.
pub fn dataframe_to_array(df: &DataFrame, columns: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();

    let col_data: Vec<Vec<f64>> = columns
        .iter()
        .map(|name| {
            let column = df
                .column(name)
                .map_err(|_| SelectorError::DataError(format!("column '{}' not found", name)))?;
            let cast = column
                .cast(&DataType::Float64)
                .map_err(|e| SelectorError::DataError(format!("column '{}': {}", name, e)))?;
            cast.f64()
                .map_err(|e| SelectorError::DataError(format!("column '{}': {}", name, e)))?
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    value.ok_or_else(|| {
                        SelectorError::DataError(format!(
                            "column '{}' row {} is missing or not numeric",
                            name, row
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<_>>()?;

    Ok(Array2::from_shape_fn((n_rows, columns.len()), |(r, c)| col_data[c][r]))
}

/// Split a matrix into features (all but the last column) and target (last column)
pub fn split_features_target(data: &Array2<f64>) -> Result<(Array2<f64>, Array1<f64>)> {
    if data.ncols() < 2 {
        return Err(SelectorError::ShapeError {
            expected: "at least 2 columns (features and target)".to_string(),
            actual: format!("{} columns", data.ncols()),
        });
    }
    let last = data.ncols() - 1;
    Ok((data.slice(s![.., ..last]).to_owned(), data.column(last).to_owned()))
}

/// Write predictions as a single `prediction` column
pub fn write_predictions(path: &Path, predictions: &Array1<f64>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut df = DataFrame::new(vec![Column::new("prediction".into(), predictions.to_vec())])?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).finish(&mut df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ndarray::array;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv(lines: &[&str]) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_load_numeric_csv() {
        let file = csv(&["a,b,target", "1,2,3", "4,5.5,6", "7,8,9"]);
        let dataset = Dataset::from_csv(file.path()).unwrap();
        assert_eq!(dataset.columns, vec!["a", "b", "target"]);
        assert_eq!(dataset.data, array![[1.0, 2.0, 3.0], [4.0, 5.5, 6.0], [7.0, 8.0, 9.0]]);
    }

    #[test]
    fn test_non_numeric_rejected() {
        let file = csv(&["a,b", "1,x", "2,y"]);
        let err = Dataset::from_csv(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[test]
    fn test_split_features_target() {
        let data = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let (x, y) = split_features_target(&data).unwrap();
        assert_eq!(x, array![[1.0, 2.0], [4.0, 5.0]]);
        assert_eq!(y, array![3.0, 6.0]);

        let err = split_features_target(&array![[1.0], [2.0]]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputShape);
    }

    #[test]
    fn test_write_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("pred.csv");
        write_predictions(&path, &array![1.5, 2.5]).unwrap();
        let dataset = Dataset::from_csv(&path).unwrap();
        assert_eq!(dataset.columns, vec!["prediction"]);
        assert_eq!(dataset.data.column(0).to_vec(), vec![1.5, 2.5]);
    }
}
