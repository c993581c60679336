use crate::error::{AppError, Result};
use crate::models::{DataTable, Value};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Standard deviations below this are treated as zero
pub const MIN_STD: f64 = 1e-12;

/// Per-feature standardization frozen at training time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<String>,
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl StandardScaler {
    /// Fit mean and population standard deviation (ddof = 0) per column
    pub fn fit(columns: &[String], matrix: &Array2<f64>) -> Result<Self> {
        let (n_rows, n_cols) = matrix.dim();
        if n_cols != columns.len() {
            return Err(AppError::Validation(format!(
                "scaler fit on {} columns but matrix has {}",
                columns.len(),
                n_cols
            )));
        }
        if n_rows == 0 {
            return Err(AppError::Validation(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        let mean = matrix
            .mean_axis(Axis(0))
            .ok_or_else(|| AppError::Internal("mean of an empty matrix".to_string()))?;
        let std = matrix.std_axis(Axis(0), 0.0);

        Ok(Self {
            columns: columns.to_vec(),
            mean,
            std,
        })
    }

    /// Fit then scale the same matrix
    pub fn fit_transform(columns: &[String], matrix: &Array2<f64>) -> Result<(Self, Array2<f64>)> {
        let scaler = Self::fit(columns, matrix)?;
        let scaled = scaler.scale(matrix);
        Ok((scaler, scaled))
    }

    /// Scale a matrix whose columns must be exactly the fitted ones, in order
    pub fn transform(&self, columns: &[String], matrix: &Array2<f64>) -> Result<Array2<f64>> {
        if columns != self.columns.as_slice() {
            let position = columns
                .iter()
                .zip(self.columns.iter())
                .position(|(given, fitted)| given != fitted)
                .unwrap_or_else(|| columns.len().min(self.columns.len()));
            return Err(AppError::Inference(format!(
                "feature columns do not match the fitted order at position {} (got {}, fitted {})",
                position,
                columns.len(),
                self.columns.len()
            )));
        }
        if matrix.ncols() != self.columns.len() {
            return Err(AppError::Inference(format!(
                "matrix has {} columns, scaler was fit on {}",
                matrix.ncols(),
                self.columns.len()
            )));
        }

        Ok(self.scale(matrix))
    }

    fn scale(&self, matrix: &Array2<f64>) -> Array2<f64> {
        let mut scaled = matrix.to_owned();
        for (j, mut column) in scaled.axis_iter_mut(Axis(1)).enumerate() {
            let (mean, std) = (self.mean[j], self.std[j]);
            if std < MIN_STD {
                column.fill(0.0);
            } else {
                column.mapv_inplace(|x| (x - mean) / std);
            }
        }
        scaled
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn std(&self) -> &Array1<f64> {
        &self.std
    }
}

/// Dense matrix of a fully numeric table.
///
/// Missing cells read as 0.0. Text that does not parse as a number is an
/// inference error naming the column.
pub fn feature_matrix(table: &DataTable) -> Result<Array2<f64>> {
    let (n_rows, n_cols) = (table.len(), table.columns().len());
    let mut matrix = Array2::zeros((n_rows, n_cols));

    for (i, row) in table.rows().iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            matrix[[i, j]] = match value {
                Value::Missing => 0.0,
                other => other.as_f64().ok_or_else(|| {
                    AppError::Inference(format!(
                        "column '{}' holds non-numeric value '{}' in row {}",
                        table.columns()[j],
                        other,
                        i + 1
                    ))
                })?,
            };
        }
    }

    Ok(matrix)
}
