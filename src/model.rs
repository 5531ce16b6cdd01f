//! Fitted model components: standardization transform, linear regressor,
//! and the composed pipeline that maps raw features to a price.
//!
//! All parameter structs are plain vectors so a fitted model round-trips
//! through bincode byte-identically.

use crate::schema::FeatureSchema;
use serde::{Deserialize, Serialize};

/// Per-feature standardization fitted on the training subset only.
///
/// Uses the population standard deviation; a zero-variance feature keeps a
/// deviation of 1.0 so transformation stays a no-op for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>], arity: usize) -> Self {
        let n = rows.len().max(1) as f64;

        let mut means = vec![0.0; arity];
        for row in rows {
            for (acc, v) in means.iter_mut().zip(row) {
                *acc += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut variances = vec![0.0; arity];
        for row in rows {
            for ((acc, v), m) in variances.iter_mut().zip(row).zip(&means) {
                let d = v - m;
                *acc += d * d;
            }
        }
        let stds = variances
            .into_iter()
            .map(|s| {
                let sd = (s / n).sqrt();
                if sd > 0.0 {
                    sd
                } else {
                    1.0
                }
            })
            .collect();

        Self { means, stds }
    }

    pub fn transform(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }
}

/// Ordinary least squares over standardized features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct LinearRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegression {
    /// Fit via the normal equations with an implicit intercept column.
    /// Returns `None` when the system is singular (degenerate features).
    pub fn fit(rows: &[Vec<f64>], targets: &[f64]) -> Option<Self> {
        let arity = rows.first().map(|r| r.len())?;
        let dim = arity + 1;

        let mut xtx = vec![vec![0.0; dim]; dim];
        let mut xty = vec![0.0; dim];
        for (row, &y) in rows.iter().zip(targets) {
            for i in 0..dim {
                let xi = if i == 0 { 1.0 } else { row[i - 1] };
                xty[i] += xi * y;
                for j in 0..dim {
                    let xj = if j == 0 { 1.0 } else { row[j - 1] };
                    xtx[i][j] += xi * xj;
                }
            }
        }

        let beta = solve_linear_system(xtx, xty)?;
        Some(Self {
            intercept: beta[0],
            coefficients: beta[1..].to_vec(),
        })
    }

    pub fn predict_one(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}

/// The published unit of serving: transform + regressor + the schema both
/// were fitted against, composed so one call maps raw features to a price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct FittedPipeline {
    pub schema: FeatureSchema,
    pub scaler: StandardScaler,
    pub regressor: LinearRegression,
}

impl FittedPipeline {
    pub fn predict_one(&self, features: &[f64]) -> f64 {
        self.regressor.predict_one(&self.scaler.transform(features))
    }
}

/// Gaussian elimination with partial pivoting. `None` when singular.
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut acc = b[row];
        for k in (row + 1)..n {
            acc -= a[row][k] * x[k];
        }
        x[row] = acc / a[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaler_centers_and_scales() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows, 2);
        assert_eq!(scaler.means, vec![2.0, 10.0]);
        // population std of {1, 3} is 1; zero-variance column maps to 1.0
        assert_eq!(scaler.stds, vec![1.0, 1.0]);
        assert_eq!(scaler.transform(&[3.0, 10.0]), vec![1.0, 0.0]);
    }

    #[test]
    fn ols_recovers_exact_linear_relationship() {
        // y = 3 + 2*a - 0.5*b
        let rows: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![i as f64, (i * i % 7) as f64])
            .collect();
        let targets: Vec<f64> = rows.iter().map(|r| 3.0 + 2.0 * r[0] - 0.5 * r[1]).collect();
        let model = LinearRegression::fit(&rows, &targets).unwrap();
        assert!((model.intercept - 3.0).abs() < 1e-8);
        assert!((model.coefficients[0] - 2.0).abs() < 1e-8);
        assert!((model.coefficients[1] + 0.5).abs() < 1e-8);
    }

    #[test]
    fn degenerate_features_fail_to_fit() {
        // second column is a copy of the first: singular normal equations
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, i as f64]).collect();
        let targets: Vec<f64> = rows.iter().map(|r| r[0]).collect();
        assert!(LinearRegression::fit(&rows, &targets).is_none());
    }

    #[test]
    fn pipeline_round_trips_through_bincode() {
        let pipeline = FittedPipeline {
            schema: FeatureSchema::default(),
            scaler: StandardScaler {
                means: vec![1.0, 2.0, 3.0],
                stds: vec![0.5, 1.5, 2.5],
            },
            regressor: LinearRegression {
                coefficients: vec![10.0, -4.0, 0.25],
                intercept: 100.0,
            },
        };
        let bytes = bincode::encode_to_vec(&pipeline, bincode::config::standard()).unwrap();
        let (decoded, _): (FittedPipeline, usize) =
            bincode::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
        assert_eq!(decoded, pipeline);
        let input = [1200.0, 2.0, 8.0];
        assert_eq!(decoded.predict_one(&input), pipeline.predict_one(&input));
    }
}
