//! L2-regularised logistic regression fitted with damped Newton steps.
//!
//! Objective: sum of log-losses + ||w||^2 / (2C). The intercept is not
//! penalised.

use crate::error::AppError;
use log::debug;
use serde::{Deserialize, Serialize};

const MAX_STEP_HALVINGS: usize = 30;
const PROB_EPSILON: f64 = 1e-15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl TrainedModel {
    pub fn feature_count(&self) -> usize {
        self.coefficients.len()
    }

    pub fn decision(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }

    /// P(label = 1) for an already scaled row.
    pub fn predict_proba(&self, row: &[f64]) -> Result<f64, AppError> {
        if row.len() != self.feature_count() {
            return Err(AppError::DataError(format!(
                "feature vector has {} columns, model expects {}",
                row.len(),
                self.feature_count()
            )));
        }
        Ok(sigmoid(self.decision(row)))
    }
}

pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SolverOptions {
    pub inverse_regularization: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
}

pub fn fit(x: &[Vec<f64>], y: &[u8], options: SolverOptions) -> Result<TrainedModel, AppError> {
    if x.is_empty() {
        return Err(AppError::DataError("no rows to fit the classifier on".to_string()));
    }
    if x.len() != y.len() {
        return Err(AppError::DataError(format!(
            "{} feature rows but {} labels",
            x.len(),
            y.len()
        )));
    }

    let d = x[0].len();
    let lambda = 1.0 / options.inverse_regularization;
    // theta = [w_0 .. w_{d-1}, b]
    let mut theta = vec![0.0; d + 1];
    let mut loss = objective(x, y, &theta, lambda);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < options.max_iterations {
        iterations += 1;
        let (grad, hessian) = gradient_and_hessian(x, y, &theta, lambda);
        let step = solve(hessian, grad).ok_or_else(|| {
            AppError::DataError("logistic regression Hessian is singular".to_string())
        })?;

        let mut scale = 1.0;
        let mut candidate = theta.clone();
        let mut candidate_loss = f64::INFINITY;
        for _ in 0..MAX_STEP_HALVINGS {
            for ((c, t), s) in candidate.iter_mut().zip(&theta).zip(&step) {
                *c = t - scale * s;
            }
            candidate_loss = objective(x, y, &candidate, lambda);
            if candidate_loss <= loss {
                break;
            }
            scale *= 0.5;
        }

        let max_change = step.iter().map(|s| (s * scale).abs()).fold(0.0, f64::max);
        if candidate_loss <= loss {
            theta = candidate;
            loss = candidate_loss;
        }
        debug!(
            "newton iter {}: loss {:.6}, max change {:.3e}",
            iterations, loss, max_change
        );

        if max_change < options.tolerance {
            converged = true;
            break;
        }
    }

    let intercept = theta[d];
    theta.truncate(d);
    Ok(TrainedModel {
        coefficients: theta,
        intercept,
        iterations,
        converged,
    })
}

fn linear(row: &[f64], theta: &[f64]) -> f64 {
    let d = row.len();
    theta[d] + row.iter().zip(theta).map(|(x, w)| x * w).sum::<f64>()
}

fn objective(x: &[Vec<f64>], y: &[u8], theta: &[f64], lambda: f64) -> f64 {
    let d = theta.len() - 1;
    let mut total = 0.0;
    for (row, label) in x.iter().zip(y) {
        let p = sigmoid(linear(row, theta)).clamp(PROB_EPSILON, 1.0 - PROB_EPSILON);
        total -= if *label == 1 { p.ln() } else { (1.0 - p).ln() };
    }
    let penalty: f64 = theta[..d].iter().map(|w| w * w).sum();
    total + 0.5 * lambda * penalty
}

fn gradient_and_hessian(
    x: &[Vec<f64>],
    y: &[u8],
    theta: &[f64],
    lambda: f64,
) -> (Vec<f64>, Vec<Vec<f64>>) {
    let k = theta.len();
    let d = k - 1;
    let mut grad = vec![0.0; k];
    let mut hessian = vec![vec![0.0; k]; k];

    for (row, label) in x.iter().zip(y) {
        let p = sigmoid(linear(row, theta));
        let residual = p - *label as f64;
        let weight = p * (1.0 - p);

        for i in 0..k {
            let xi = if i < d { row[i] } else { 1.0 };
            grad[i] += residual * xi;
            for j in i..k {
                let xj = if j < d { row[j] } else { 1.0 };
                hessian[i][j] += weight * xi * xj;
            }
        }
    }

    for i in 0..k {
        for j in 0..i {
            let mirrored = hessian[j][i];
            hessian[i][j] = mirrored;
        }
    }
    for i in 0..d {
        grad[i] += lambda * theta[i];
        hessian[i][i] += lambda;
    }
    hessian[d][d] += 1e-10;

    (grad, hessian)
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-14 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                let upper = a[col][k];
                a[row][k] -= factor * upper;
            }
            let upper_b = b[col];
            b[row] -= factor * upper_b;
        }
    }

    let mut out = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * out[k]).sum();
        out[row] = (b[row] - tail) / a[row][row];
    }
    Some(out)
}
