// Standard Scaler - Per-Column Standardization
//
// z = (x - mean) / std, population std. Constant columns get std 1.0 so they
// pass through centered instead of dividing by zero.

use super::TrainingError;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit column statistics on `rows`
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, TrainingError> {
        let first = rows.first().ok_or(TrainingError::EmptyCorpus)?;
        let width = first.len();
        let n = rows.len() as f64;

        let mut mean = vec![0.0; width];
        for row in rows {
            if row.len() != width {
                return Err(TrainingError::DimensionMismatch {
                    expected: width,
                    found: row.len(),
                });
            }
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut variance = vec![0.0; width];
        for row in rows {
            for ((v, x), m) in variance.iter_mut().zip(row).zip(&mean) {
                *v += (x - m) * (x - m);
            }
        }

        let scale = variance
            .into_iter()
            .map(|v| {
                let std = (v / n).sqrt();
                if std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_transform() {
        let rows = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();

        assert_eq!(scaler.transform(&[1.0, 5.0]), vec![-1.0, 0.0]);
        assert_eq!(scaler.transform(&[3.0, 7.0]), vec![1.0, 2.0]);
    }

    #[test]
    fn test_fit_rejects_empty_and_ragged() {
        assert!(matches!(
            StandardScaler::fit(&[]),
            Err(TrainingError::EmptyCorpus)
        ));
        assert!(matches!(
            StandardScaler::fit(&[vec![1.0, 2.0], vec![1.0]]),
            Err(TrainingError::DimensionMismatch { expected: 2, found: 1 })
        ));
    }
}
