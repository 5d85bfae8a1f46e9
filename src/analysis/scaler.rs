use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Standard deviations below this are treated as a constant column.
const STD_EPSILON: f64 = 1e-12;

/// Per-column mean and population standard deviation from the training matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl ScalerState {
    /// Fit on every row of `matrix`; rows must all have the same width.
    pub fn fit(matrix: &[Vec<f64>]) -> Result<Self, AppError> {
        let first = matrix.first().ok_or_else(|| {
            AppError::ScalingError("cannot fit a scaler on an empty matrix".to_string())
        })?;
        let width = first.len();
        check_width(matrix, width)?;

        let n = matrix.len() as f64;
        let mut means = vec![0.0; width];
        for row in matrix {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut stds = vec![0.0; width];
        for row in matrix {
            for ((s, v), m) in stds.iter_mut().zip(row).zip(&means) {
                let d = v - m;
                *s += d * d;
            }
        }
        for s in &mut stds {
            *s = (*s / n).sqrt();
        }

        Ok(ScalerState { means, stds })
    }

    pub fn width(&self) -> usize {
        self.means.len()
    }

    /// Scale one row. Constant columns map to 0.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, AppError> {
        if row.len() != self.width() {
            return Err(AppError::ScalingError(format!(
                "row has {} columns, scaler was fitted on {}",
                row.len(),
                self.width()
            )));
        }
        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(v, (mean, std))| {
                if *std < STD_EPSILON {
                    0.0
                } else {
                    (v - mean) / std
                }
            })
            .collect())
    }

    pub fn transform(&self, matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, AppError> {
        matrix.iter().map(|row| self.transform_row(row)).collect()
    }
}

fn check_width(matrix: &[Vec<f64>], width: usize) -> Result<(), AppError> {
    match matrix.iter().position(|row| row.len() != width) {
        Some(idx) => Err(AppError::ScalingError(format!(
            "row {} has {} columns, expected {}",
            idx,
            matrix[idx].len(),
            width
        ))),
        None => Ok(()),
    }
}
