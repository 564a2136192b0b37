use std::fmt;

use serde::Serialize;

use crate::distributions;
use crate::error::{AnalysisError, Result};

pub const INTERCEPT: &str = "Intercept";

// |R_jj| / ||x_j|| below this means column j lies in the span of the columns before it.
const RANK_TOLERANCE: f64 = 1.0e-9;
// RSS at or below this share of sum(y^2) is an exact fit: what remains is rounding.
const EXACT_FIT_TOLERANCE: f64 = 1.0e-24;

/// A named column that can appear in a regression formula.
pub trait Term: Copy + PartialEq + fmt::Debug {
    fn name(self) -> &'static str;
}

/// A record that can supply a value for every term of type `T`.
pub trait Observation<T: Term> {
    fn value(&self, term: T) -> f64;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Formula<T> {
    pub response: T,
    pub predictors: Vec<T>,
    pub intercept: bool,
}

impl<T: Term> Formula<T> {
    pub fn new(response: T, predictors: impl IntoIterator<Item = T>) -> Self {
        Self {
            response,
            predictors: predictors.into_iter().collect(),
            intercept: true,
        }
    }

    pub fn without_intercept(mut self) -> Self {
        self.intercept = false;
        self
    }

    pub fn parameter_count(&self) -> usize {
        self.predictors.len() + usize::from(self.intercept)
    }

    pub fn term_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.parameter_count());
        if self.intercept {
            names.push(INTERCEPT.to_string());
        }
        names.extend(self.predictors.iter().map(|p| p.name().to_string()));
        names
    }

    pub fn design_for<R: Observation<T>>(&self, rows: &[R]) -> Result<DesignMatrix> {
        let mut design = DesignMatrix::new(rows.len());
        if self.intercept {
            design = design.with_intercept();
        }
        for predictor in &self.predictors {
            let values = rows.iter().map(|r| r.value(*predictor)).collect();
            design.push_column(predictor.name(), values)?;
        }
        Ok(design)
    }
}

impl<T: Term> fmt::Display for Formula<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ ", self.response.name())?;
        if self.predictors.is_empty() {
            write!(f, "1")?;
        } else {
            let names: Vec<&str> = self.predictors.iter().map(|p| p.name()).collect();
            write!(f, "{}", names.join(" + "))?;
        }
        if !self.intercept {
            write!(f, " - 1")?;
        }
        Ok(())
    }
}

/// Column-major n x p design matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    rows: usize,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    intercept: bool,
}

impl DesignMatrix {
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            names: Vec::new(),
            columns: Vec::new(),
            intercept: false,
        }
    }

    /// Prepends a constant column of ones.
    pub fn with_intercept(mut self) -> Self {
        if !self.intercept {
            self.names.insert(0, INTERCEPT.to_string());
            self.columns.insert(0, vec![1.0; self.rows]);
            self.intercept = true;
        }
        self
    }

    pub fn push_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.rows {
            return Err(AnalysisError::LengthMismatch {
                column: name.to_string(),
                expected: self.rows,
                actual: values.len(),
            });
        }
        self.names.push(name.to_string());
        self.columns.push(values);
        Ok(())
    }

    fn product(&self, beta: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.rows];
        for (column, b) in self.columns.iter().zip(beta) {
            for (o, x) in out.iter_mut().zip(column) {
                *o += b * x;
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coefficient {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    /// `None` for an exact fit, where the standard error is zero.
    pub t_stat: Option<f64>,
    pub p_value: Option<f64>,
    pub ci_low: f64,
    pub ci_high: f64,
}

/// Moments of the residuals. Absent for an exact fit, where every residual is zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResidualDiagnostics {
    pub durbin_watson: f64,
    pub skew: f64,
    pub kurtosis: f64,
    pub jarque_bera: f64,
    pub jarque_bera_p: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitStatistics {
    pub observations: usize,
    pub parameters: usize,
    pub df_model: usize,
    pub df_resid: usize,
    pub rss: f64,
    pub tss: f64,
    /// False when the intercept is suppressed: TSS is then taken about zero.
    pub centered: bool,
    /// Uncentered when `centered` is false, and then not comparable with a centered value.
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_stat: Option<f64>,
    pub f_p_value: Option<f64>,
    /// Unbounded for an exact fit, so `None` there along with AIC and BIC.
    pub log_likelihood: Option<f64>,
    pub aic: Option<f64>,
    pub bic: Option<f64>,
    pub residual_std_error: f64,
    pub diagnostics: Option<ResidualDiagnostics>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    pub coefficients: Vec<Coefficient>,
    pub fitted: Vec<f64>,
    pub residuals: Vec<f64>,
    pub stats: FitStatistics,
}

impl OlsFit {
    pub fn estimates(&self) -> Vec<f64> {
        self.coefficients.iter().map(|c| c.estimate).collect()
    }

    /// X_new * beta. The design must carry the same terms, in order, as the fitted one.
    pub fn predict(&self, design: &DesignMatrix) -> Result<Vec<f64>> {
        if design.names.len() != self.coefficients.len() {
            return Err(AnalysisError::LengthMismatch {
                column: "design terms".to_string(),
                expected: self.coefficients.len(),
                actual: design.names.len(),
            });
        }
        for (name, coef) in design.names.iter().zip(&self.coefficients) {
            if *name != coef.term {
                return Err(AnalysisError::TermMismatch {
                    expected: coef.term.clone(),
                    actual: name.clone(),
                });
            }
        }
        Ok(design.product(&self.estimates()))
    }
}

/// Least squares through a Householder QR of the design matrix.
pub fn fit_ols(response: &[f64], design: &DesignMatrix) -> Result<OlsFit> {
    let n = design.rows;
    let p = design.columns.len();
    if response.len() != n {
        return Err(AnalysisError::LengthMismatch {
            column: "response".to_string(),
            expected: n,
            actual: response.len(),
        });
    }
    if p == 0 {
        return Err(AnalysisError::InsufficientObservations {
            observations: n,
            parameters: 0,
        });
    }
    if n <= p {
        return Err(AnalysisError::InsufficientObservations {
            observations: n,
            parameters: p,
        });
    }

    let qr = householder_qr(design, response)?;
    let beta = back_substitute(&qr.r, &qr.qty[..p]);
    let xtx_inv = normal_inverse(&qr.r);

    let fitted = design.product(&beta);
    let residuals: Vec<f64> = response.iter().zip(&fitted).map(|(y, f)| y - f).collect();
    let rss: f64 = residuals.iter().map(|e| e * e).sum();

    let centered = design.intercept;
    let tss = if centered {
        let mean = response.iter().sum::<f64>() / n as f64;
        response.iter().map(|y| (y - mean).powi(2)).sum::<f64>()
    } else {
        response.iter().map(|y| y * y).sum::<f64>()
    };
    let constant = if centered {
        response.windows(2).all(|w| w[0] == w[1])
    } else {
        response.iter().all(|y| *y == 0.0)
    };
    if constant || tss <= 0.0 {
        return Err(AnalysisError::ConstantResponse {
            response: "response".to_string(),
        });
    }

    let df_resid = n - p;
    let k_const = usize::from(centered);
    let df_model = p - k_const;
    let sigma2 = rss / df_resid as f64;
    let exact_fit = rss <= EXACT_FIT_TOLERANCE * response.iter().map(|y| y * y).sum::<f64>();
    let t_crit = distributions::student_t_upper_quantile(0.025, df_resid as f64);

    let coefficients = design
        .names
        .iter()
        .enumerate()
        .map(|(j, term)| {
            let estimate = beta[j];
            let std_error = (sigma2 * xtx_inv[j][j]).max(0.0).sqrt();
            let t_stat = (!exact_fit && std_error > 0.0).then(|| estimate / std_error);
            Coefficient {
                term: term.clone(),
                estimate,
                std_error,
                t_stat,
                p_value: t_stat.map(|t| distributions::student_t_two_tailed(t, df_resid as f64)),
                ci_low: estimate - t_crit * std_error,
                ci_high: estimate + t_crit * std_error,
            }
        })
        .collect();

    let r_squared = 1.0 - rss / tss;
    let adj_r_squared = 1.0 - (n - k_const) as f64 / df_resid as f64 * (1.0 - r_squared);
    let (f_stat, f_p_value) = if df_model > 0 && !exact_fit {
        let f = ((tss - rss) / df_model as f64) / sigma2;
        let p_f = distributions::f_upper_tail(f, df_model as f64, df_resid as f64);
        (Some(f), Some(p_f))
    } else {
        (None, None)
    };

    let nf = n as f64;
    let log_likelihood = (!exact_fit)
        .then(|| -nf / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (rss / nf).ln() + 1.0));
    let aic = log_likelihood.map(|ll| -2.0 * ll + 2.0 * p as f64);
    let bic = log_likelihood.map(|ll| -2.0 * ll + p as f64 * nf.ln());

    let stats = FitStatistics {
        observations: n,
        parameters: p,
        df_model,
        df_resid,
        rss,
        tss,
        centered,
        r_squared,
        adj_r_squared,
        f_stat,
        f_p_value,
        log_likelihood,
        aic,
        bic,
        residual_std_error: sigma2.sqrt(),
        diagnostics: if exact_fit {
            None
        } else {
            residual_diagnostics(&residuals, rss)
        },
    };

    Ok(OlsFit {
        coefficients,
        fitted,
        residuals,
        stats,
    })
}

/// A fitted [`Formula`]. Immutable once built.
#[derive(Debug, Clone)]
pub struct LinearModel<T> {
    pub name: String,
    pub formula: Formula<T>,
    pub fit: OlsFit,
}

impl<T: Term> LinearModel<T> {
    pub fn fit<R: Observation<T>>(
        name: impl Into<String>,
        formula: Formula<T>,
        rows: &[R],
    ) -> Result<Self> {
        let design = formula.design_for(rows)?;
        let response: Vec<f64> = rows.iter().map(|r| r.value(formula.response)).collect();
        let fit = fit_ols(&response, &design).map_err(|err| match err {
            AnalysisError::ConstantResponse { .. } => AnalysisError::ConstantResponse {
                response: formula.response.name().to_string(),
            },
            other => other,
        })?;
        let name = name.into();
        log::info!(
            "fitted {name}: {} (n={}, R2={:.3})",
            formula,
            fit.stats.observations,
            fit.stats.r_squared
        );
        Ok(Self { name, formula, fit })
    }

    pub fn predict<R: Observation<T>>(&self, rows: &[R]) -> Vec<f64> {
        let intercept = self.intercept().unwrap_or(0.0);
        let offset = usize::from(self.formula.intercept);
        rows.iter()
            .map(|row| {
                self.formula
                    .predictors
                    .iter()
                    .enumerate()
                    .fold(intercept, |acc, (i, term)| {
                        acc + self.fit.coefficients[i + offset].estimate * row.value(*term)
                    })
            })
            .collect()
    }

    pub fn coefficient(&self, term: T) -> Option<&Coefficient> {
        let offset = usize::from(self.formula.intercept);
        self.formula
            .predictors
            .iter()
            .position(|p| *p == term)
            .map(|i| &self.fit.coefficients[i + offset])
    }

    pub fn intercept(&self) -> Option<f64> {
        if self.formula.intercept {
            self.fit.coefficients.first().map(|c| c.estimate)
        } else {
            None
        }
    }

    pub fn stats(&self) -> &FitStatistics {
        &self.fit.stats
    }
}

struct QrFactors {
    // Upper-triangular p x p factor, row-major.
    r: Vec<Vec<f64>>,
    // Q^T y (length n); its first p entries feed the back substitution.
    qty: Vec<f64>,
}

fn householder_qr(design: &DesignMatrix, response: &[f64]) -> Result<QrFactors> {
    let p = design.columns.len();
    let mut a = design.columns.clone();
    let mut qty = response.to_vec();
    let norms: Vec<f64> = a.iter().map(|c| norm(c)).collect();

    for j in 0..p {
        let sub_norm = norm(&a[j][j..]);
        if norms[j] == 0.0 || sub_norm <= RANK_TOLERANCE * norms[j] {
            return Err(AnalysisError::RankDeficient {
                term: design.names[j].clone(),
            });
        }
        let alpha = if a[j][j] > 0.0 { -sub_norm } else { sub_norm };
        let mut v: Vec<f64> = a[j][j..].to_vec();
        v[0] -= alpha;
        let v_norm2: f64 = v.iter().map(|x| x * x).sum();
        if v_norm2 == 0.0 {
            continue;
        }

        for col in a.iter_mut().skip(j) {
            reflect(&mut col[j..], &v, v_norm2);
        }
        reflect(&mut qty[j..], &v, v_norm2);
    }

    let r = (0..p)
        .map(|i| (0..p).map(|k| if k >= i { a[k][i] } else { 0.0 }).collect())
        .collect();
    Ok(QrFactors { r, qty })
}

fn reflect(x: &mut [f64], v: &[f64], v_norm2: f64) {
    let dot: f64 = x.iter().zip(v).map(|(a, b)| a * b).sum();
    let scale = 2.0 * dot / v_norm2;
    for (xi, vi) in x.iter_mut().zip(v) {
        *xi -= scale * vi;
    }
}

fn norm(values: &[f64]) -> f64 {
    values.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn back_substitute(r: &[Vec<f64>], rhs: &[f64]) -> Vec<f64> {
    let p = rhs.len();
    let mut x = vec![0.0; p];
    for i in (0..p).rev() {
        let mut s = rhs[i];
        for k in (i + 1)..p {
            s -= r[i][k] * x[k];
        }
        x[i] = s / r[i][i];
    }
    x
}

// (X^T X)^-1 = R^-1 R^-T
fn normal_inverse(r: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let p = r.len();
    let mut r_inv = vec![vec![0.0; p]; p];
    for c in 0..p {
        let mut e = vec![0.0; p];
        e[c] = 1.0;
        let col = back_substitute(r, &e);
        for (i, v) in col.into_iter().enumerate() {
            r_inv[i][c] = v;
        }
    }
    let mut out = vec![vec![0.0; p]; p];
    for i in 0..p {
        for j in 0..p {
            out[i][j] = (0..p).map(|k| r_inv[i][k] * r_inv[j][k]).sum();
        }
    }
    out
}

fn residual_diagnostics(residuals: &[f64], rss: f64) -> Option<ResidualDiagnostics> {
    if rss <= 0.0 || residuals.len() < 2 {
        return None;
    }
    let n = residuals.len() as f64;
    let durbin_watson = residuals
        .windows(2)
        .map(|w| (w[1] - w[0]).powi(2))
        .sum::<f64>()
        / rss;

    let mean = residuals.iter().sum::<f64>() / n;
    let m2 = residuals.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n;
    let m3 = residuals.iter().map(|e| (e - mean).powi(3)).sum::<f64>() / n;
    let m4 = residuals.iter().map(|e| (e - mean).powi(4)).sum::<f64>() / n;
    if m2 <= 0.0 {
        return None;
    }
    let skew = m3 / m2.powf(1.5);
    let kurtosis = m4 / (m2 * m2);
    let jarque_bera = n / 6.0 * (skew * skew + (kurtosis - 3.0).powi(2) / 4.0);

    Some(ResidualDiagnostics {
        durbin_watson,
        skew,
        kurtosis,
        jarque_bera,
        jarque_bera_p: distributions::chi2_df2_upper_tail(jarque_bera),
    })
}
