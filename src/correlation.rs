use crate::error::{AnalysisError, Result};

/// Pearson correlation matrix. `None` marks an entry involving a zero-variance column.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
    pub zero_variance: Vec<String>,
}

impl CorrelationMatrix {
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i).and_then(|row| row.get(j)).copied().flatten()
    }

    pub fn by_label(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        self.get(i, j)
    }

    pub fn size(&self) -> usize {
        self.labels.len()
    }
}

/// Builds the correlation matrix of equally long numeric columns, using the sample (n - 1)
/// covariance and standard deviations.
pub fn correlation_matrix(columns: &[(String, Vec<f64>)]) -> Result<CorrelationMatrix> {
    let n = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
    for (label, values) in columns {
        if values.len() != n {
            return Err(AnalysisError::LengthMismatch {
                column: label.clone(),
                expected: n,
                actual: values.len(),
            });
        }
    }

    let m = columns.len();
    let centered: Vec<Vec<f64>> = columns
        .iter()
        .map(|(_, values)| {
            let mean = values.iter().sum::<f64>() / n.max(1) as f64;
            values.iter().map(|v| v - mean).collect()
        })
        .collect();
    let denom = n.saturating_sub(1) as f64;
    // Constancy is judged on the raw values; centering leaves rounding residue behind.
    let std_devs: Vec<Option<f64>> = columns
        .iter()
        .zip(&centered)
        .map(|((_, raw), c)| {
            if denom <= 0.0 || is_constant(raw) {
                return None;
            }
            let var = c.iter().map(|v| v * v).sum::<f64>() / denom;
            (var > 0.0).then(|| var.sqrt())
        })
        .collect();

    let mut values = vec![vec![None; m]; m];
    for i in 0..m {
        let Some(si) = std_devs[i] else {
            continue;
        };
        values[i][i] = Some(1.0);
        for j in (i + 1)..m {
            let Some(sj) = std_devs[j] else {
                continue;
            };
            let cov = centered[i]
                .iter()
                .zip(&centered[j])
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / denom;
            let r = (cov / (si * sj)).clamp(-1.0, 1.0);
            values[i][j] = Some(r);
            values[j][i] = Some(r);
        }
    }

    let zero_variance = columns
        .iter()
        .zip(&std_devs)
        .filter(|(_, sd)| sd.is_none())
        .map(|((label, _), _)| label.clone())
        .collect::<Vec<_>>();
    if !zero_variance.is_empty() {
        log::warn!("zero-variance columns in correlation: {zero_variance:?}");
    }

    Ok(CorrelationMatrix {
        labels: columns.iter().map(|(l, _)| l.clone()).collect(),
        values,
        zero_variance,
    })
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

#[cfg(test)]
mod tests {
    use super::correlation_matrix;

    fn cols(data: &[(&str, &[f64])]) -> Vec<(String, Vec<f64>)> {
        data.iter()
            .map(|(l, v)| (l.to_string(), v.to_vec()))
            .collect()
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let m = correlation_matrix(&cols(&[
            ("a", &[1.0, 2.0, 3.0, 4.0, 5.0]),
            ("b", &[2.0, 1.0, 4.0, 3.0, 6.0]),
            ("c", &[9.0, 7.0, 4.0, 4.5, 1.0]),
        ]))
        .expect("matrix");
        for i in 0..3 {
            assert_eq!(m.get(i, i), Some(1.0));
            for j in 0..3 {
                assert_eq!(m.get(i, j), m.get(j, i));
            }
        }
        assert!(m.zero_variance.is_empty());
    }

    #[test]
    fn perfectly_linear_columns_correlate_fully() {
        let m = correlation_matrix(&cols(&[
            ("x", &[1.0, 2.0, 3.0, 4.0]),
            ("up", &[3.0, 5.0, 7.0, 9.0]),
            ("down", &[0.0, -1.0, -2.0, -3.0]),
        ]))
        .expect("matrix");
        assert!((m.by_label("x", "up").unwrap() - 1.0).abs() < 1e-12);
        assert!((m.by_label("x", "down").unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn known_value_matches_hand_computation() {
        // x = [1,2,3,4], y = [1,3,2,4]: sum dx*dy = 4.5, sxx = syy = 5 -> r = 0.9
        let m = correlation_matrix(&cols(&[
            ("x", &[1.0, 2.0, 3.0, 4.0]),
            ("y", &[1.0, 3.0, 2.0, 4.0]),
        ]))
        .expect("matrix");
        let r = m.get(0, 1).unwrap();
        assert!((r - 0.9).abs() < 1e-12);
    }

    #[test]
    fn zero_variance_column_is_flagged() {
        let m = correlation_matrix(&cols(&[
            ("flat", &[2.0, 2.0, 2.0]),
            ("x", &[1.0, 2.0, 4.0]),
        ]))
        .expect("matrix");
        assert_eq!(m.zero_variance, vec!["flat".to_string()]);
        assert_eq!(m.get(0, 0), None);
        assert_eq!(m.get(0, 1), None);
        assert_eq!(m.get(1, 1), Some(1.0));
    }

    #[test]
    fn constant_decimal_column_is_flagged_despite_rounding() {
        let m = correlation_matrix(&cols(&[
            ("flat", &[0.1, 0.1, 0.1]),
            ("x", &[1.0, 2.0, 4.0]),
        ]))
        .expect("matrix");
        assert_eq!(m.zero_variance, vec!["flat".to_string()]);
        assert_eq!(m.get(0, 0), None);
        assert_eq!(m.get(1, 0), None);
    }

    #[test]
    fn ragged_columns_are_rejected() {
        assert!(
            correlation_matrix(&cols(&[("a", &[1.0, 2.0]), ("b", &[1.0])])).is_err()
        );
    }
}
