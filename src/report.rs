use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use crate::correlation::CorrelationMatrix;
use crate::error::AnalysisError;
use crate::ols::{LinearModel, Term};

pub const RULE_WIDTH: usize = 80;
const SUMMARY_WIDTH: usize = 78;

struct Sink<'a> {
    writer: Box<dyn Write + 'a>,
    required: bool,
    live: bool,
}

/// Writes every buffer to all sinks and flushes each one immediately, so a run that dies
/// part-way still leaves everything written so far on disk.
///
/// Every sink sees every write. An error from a required sink is returned once the others
/// have been written; a best-effort sink that fails is dropped with a warning.
pub struct Tee<'a> {
    sinks: Vec<Sink<'a>>,
}

impl<'a> Tee<'a> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sink(self, sink: impl Write + 'a) -> Self {
        self.push(sink, true)
    }

    pub fn with_best_effort_sink(self, sink: impl Write + 'a) -> Self {
        self.push(sink, false)
    }

    fn push(mut self, sink: impl Write + 'a, required: bool) -> Self {
        self.sinks.push(Sink {
            writer: Box::new(sink),
            required,
            live: true,
        });
        self
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.iter().filter(|s| s.live).count()
    }

    fn each_sink(&mut self, mut op: impl FnMut(&mut dyn Write) -> io::Result<()>) -> io::Result<()> {
        let mut first_err = None;
        for (idx, sink) in self.sinks.iter_mut().enumerate() {
            if !sink.live {
                continue;
            }
            if let Err(err) = op(sink.writer.as_mut()) {
                if sink.required {
                    first_err.get_or_insert(err);
                } else {
                    log::warn!("report sink {idx} dropped: {err}");
                    sink.live = false;
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl Default for Tee<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for Tee<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.each_sink(|w| {
            w.write_all(buf)?;
            w.flush()
        })?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.each_sink(|w| w.flush())
    }
}

/// Runs `body` with a writer that mirrors to `path` (truncated first) and to stdout. The file
/// handle is released before this returns, whether or not `body` succeeded. A broken stdout
/// does not stop the file copy.
pub fn with_report_file<T, E>(
    path: &Path,
    body: impl FnOnce(&mut Tee<'_>) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<AnalysisError>,
{
    let io_err = |source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = File::create(path).map_err(io_err)?;
    let mut tee = Tee::new()
        .with_sink(file)
        .with_best_effort_sink(io::stdout());
    let out = body(&mut tee);
    let flushed = tee.flush();
    drop(tee);
    let value = out?;
    flushed.map_err(io_err)?;
    log::info!("report written: {}", path.display());
    Ok(value)
}

pub fn write_banner(out: &mut impl Write, title: &str) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(out, "{rule}")?;
    writeln!(out, "{title}")?;
    writeln!(out, "{rule}")
}

pub fn write_section(out: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(out)?;
    write_banner(out, title)
}

/// statsmodels-style summary: fit statistics, the coefficient table, residual diagnostics.
pub fn write_model_summary<T: Term>(
    out: &mut impl Write,
    model: &LinearModel<T>,
) -> io::Result<()> {
    let s = model.stats();
    let heavy = "=".repeat(SUMMARY_WIDTH);
    let light = "-".repeat(SUMMARY_WIDTH);
    let suffix = if s.centered { "" } else { " (uncentered)" };

    writeln!(out, "{heavy}")?;
    writeln!(
        out,
        "{:^width$}",
        format!("OLS Regression Results: {}", model.name),
        width = SUMMARY_WIDTH
    )?;
    writeln!(out, "{heavy}")?;
    writeln!(out, "Formula: {}", model.formula)?;
    pair(
        out,
        ("Dep. Variable:", model.formula.response.name().to_string()),
        (&format!("R-squared{suffix}:"), format!("{:.3}", s.r_squared)),
    )?;
    pair(
        out,
        ("Model:", "OLS".to_string()),
        (
            &format!("Adj. R-squared{suffix}:"),
            format!("{:.3}", s.adj_r_squared),
        ),
    )?;
    pair(
        out,
        ("No. Observations:", s.observations.to_string()),
        ("F-statistic:", opt(s.f_stat, |v| format!("{v:.2}"))),
    )?;
    pair(
        out,
        ("Df Residuals:", s.df_resid.to_string()),
        ("Prob (F-statistic):", opt(s.f_p_value, |v| format!("{v:.3e}"))),
    )?;
    pair(
        out,
        ("Df Model:", s.df_model.to_string()),
        ("Log-Likelihood:", opt(s.log_likelihood, |v| format!("{v:.2}"))),
    )?;
    pair(
        out,
        ("Covariance Type:", "nonrobust".to_string()),
        ("AIC:", opt(s.aic, |v| format!("{v:.1}"))),
    )?;
    pair(
        out,
        ("Resid. Std. Err.:", format!("{:.3}", s.residual_std_error)),
        ("BIC:", opt(s.bic, |v| format!("{v:.1}"))),
    )?;
    writeln!(out, "{heavy}")?;
    writeln!(
        out,
        "{:<12}{:>10}{:>11}{:>11}{:>11}{:>12}{:>11}",
        "", "coef", "std err", "t", "P>|t|", "[0.025", "0.975]"
    )?;
    writeln!(out, "{light}")?;
    for c in &model.fit.coefficients {
        writeln!(
            out,
            "{:<12}{:>10.4}{:>11.3}{:>11}{:>11}{:>12.3}{:>11.3}",
            c.term,
            c.estimate,
            c.std_error,
            opt(c.t_stat, |v| format!("{v:.3}")),
            opt(c.p_value, |v| format!("{v:.3}")),
            c.ci_low,
            c.ci_high
        )?;
    }
    writeln!(out, "{heavy}")?;
    match s.diagnostics {
        Some(d) => {
            pair(
                out,
                ("Durbin-Watson:", format!("{:.3}", d.durbin_watson)),
                ("Jarque-Bera (JB):", format!("{:.3}", d.jarque_bera)),
            )?;
            pair(
                out,
                ("Skew:", format!("{:.3}", d.skew)),
                ("Prob(JB):", format!("{:.3}", d.jarque_bera_p)),
            )?;
            pair(
                out,
                ("Kurtosis:", format!("{:.3}", d.kurtosis)),
                ("", String::new()),
            )?;
        }
        None => writeln!(out, "Residual diagnostics: exact fit, all residuals are zero.")?,
    }
    writeln!(out, "{heavy}")?;
    if !s.centered {
        writeln!(out)?;
        writeln!(out, "Notes:")?;
        writeln!(
            out,
            "[1] R-squared is computed without centering (uncentered) since the model does not"
        )?;
        writeln!(
            out,
            "    contain a constant. It is not comparable with the centered R-squared of models"
        )?;
        writeln!(out, "    that include an intercept.")?;
    }
    writeln!(out)
}

fn pair(out: &mut impl Write, left: (&str, String), right: (&str, String)) -> io::Result<()> {
    let line = format!(
        "{:<20}{:>14}    {:<26}{:>14}",
        left.0, left.1, right.0, right.1
    );
    writeln!(out, "{}", line.trim_end())
}

fn opt(value: Option<f64>, f: impl Fn(f64) -> String) -> String {
    value.map(f).unwrap_or_else(|| "n/a".to_string())
}

/// Aligned grid with row and column labels; undefined entries are spelled out.
pub fn write_correlation(out: &mut impl Write, matrix: &CorrelationMatrix) -> io::Result<()> {
    let width = matrix
        .labels
        .iter()
        .map(|l| l.len())
        .max()
        .unwrap_or(0)
        .max(9)
        + 2;

    write!(out, "{:<width$}", "")?;
    for label in &matrix.labels {
        write!(out, "{label:>width$}")?;
    }
    writeln!(out)?;
    for (i, label) in matrix.labels.iter().enumerate() {
        write!(out, "{label:<width$}")?;
        for j in 0..matrix.size() {
            match matrix.get(i, j) {
                Some(r) => write!(out, "{r:>width$.6}")?,
                None => write!(out, "{:>width$}", "undefined")?,
            }
        }
        writeln!(out)?;
    }
    if !matrix.zero_variance.is_empty() {
        writeln!(
            out,
            "note: zero variance, correlation undefined for: {}",
            matrix.zero_variance.join(", ")
        )?;
    }
    Ok(())
}

/// Boxed table with a header row. Cells that parse as numbers are right-aligned.
pub fn write_table(out: &mut impl Write, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let border = |edge: &str| {
        let inner: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
        format!("{edge}{}{edge}", inner.join("+"))
    };

    writeln!(out, "{}", border("+"))?;
    let header_cells: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!(" {h:<w$} "))
        .collect();
    writeln!(out, "|{}|", header_cells.join("|"))?;
    writeln!(out, "{}", border("|"))?;
    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| {
                if cell.parse::<f64>().is_ok() {
                    format!(" {cell:>w$} ")
                } else {
                    format!(" {cell:<w$} ")
                }
            })
            .collect();
        writeln!(out, "|{}|", cells.join("|"))?;
    }
    writeln!(out, "{}", border("+"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use std::io;

    use super::{Tee, with_report_file, write_correlation, write_model_summary, write_table};
    use crate::correlation::correlation_matrix;
    use crate::dataset::{TeamSeasonRecord, TeamStat};
    use crate::error::AnalysisError;
    use crate::ols::{Formula, LinearModel};

    struct BrokenPipe;

    impl io::Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn season(year: i32, pass_ypa: f64, margin: f64) -> TeamSeasonRecord {
        TeamSeasonRecord {
            team: "Seattle".to_string(),
            year,
            return_tds: 0,
            penalty_diff: 0,
            pass_ypa,
            def_pass_ypa: 6.0,
            rush_ypa: 4.0,
            def_rush_ypa: 4.0,
            turnovers: 20,
            turnovers_forced: 20,
            margin,
        }
    }

    #[test]
    fn tee_writes_every_sink() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        {
            let mut tee = Tee::new().with_sink(&mut a).with_sink(&mut b);
            assert_eq!(tee.sink_count(), 2);
            write!(tee, "margin {:+.1}", 3.21).unwrap();
        }
        assert_eq!(a, b"margin +3.2");
        assert_eq!(a, b);
    }

    #[test]
    fn failed_best_effort_sink_does_not_stop_the_others() {
        let mut file = Vec::new();
        {
            let mut tee = Tee::new()
                .with_best_effort_sink(BrokenPipe)
                .with_sink(&mut file);
            writeln!(tee, "line one").expect("best-effort failure is absorbed");
            assert_eq!(tee.sink_count(), 1);
            writeln!(tee, "line two").expect("file still live");
        }
        assert_eq!(file, b"line one\nline two\n");
    }

    #[test]
    fn failed_required_sink_is_reported_after_the_rest_are_written() {
        let mut console = Vec::new();
        {
            let mut tee = Tee::new().with_sink(BrokenPipe).with_sink(&mut console);
            assert!(writeln!(tee, "margin").is_err());
        }
        assert!(console.starts_with(b"margin"));
    }

    #[test]
    fn exact_fit_summary_prints_no_infinities() {
        let rows: Vec<TeamSeasonRecord> = (0..6)
            .map(|i| {
                let ypa = 5.5 + 0.5 * i as f64;
                season(2010 + i, ypa, 4.0 * ypa - 25.0)
            })
            .collect();
        let formula = Formula::new(TeamStat::Margin, [TeamStat::PassYardsPerAttempt]);
        let model = LinearModel::fit("exact", formula, &rows).expect("fit");
        let mut buf = Vec::new();
        write_model_summary(&mut buf, &model).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(!text.contains("inf") && !text.contains("NaN"), "{text}");
        assert!(text.contains("n/a"));
        assert!(text.contains("exact fit"));
    }

    #[test]
    fn report_file_is_overwritten_and_closed() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("report.txt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale contents that are longer").unwrap();

        with_report_file::<_, AnalysisError>(&path, |out| {
            writeln!(out, "fresh").map_err(|source| AnalysisError::Io {
                path: "report.txt".into(),
                source,
            })
        })
        .expect("report");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\n");
    }

    #[test]
    fn partial_output_survives_a_failing_body() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("partial.txt");
        let result = with_report_file::<(), AnalysisError>(&path, |out| {
            writeln!(out, "first line").unwrap();
            Err(AnalysisError::UnknownTeam {
                team: "Nowhere".to_string(),
            })
        });
        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first line\n");
    }

    #[test]
    fn table_aligns_text_left_and_numbers_right() {
        let mut buf = Vec::new();
        write_table(
            &mut buf,
            &["Player", "OurRating"],
            &[
                vec!["Brady".to_string(), "11.0".to_string()],
                vec!["Rodgers".to_string(), "9.5".to_string()],
            ],
        )
        .unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "+---------+-----------+");
        assert_eq!(lines[1], "| Player  | OurRating |");
        assert_eq!(lines[2], "|---------+-----------|");
        assert_eq!(lines[3], "| Brady   |      11.0 |");
        assert_eq!(lines[4], "| Rodgers |       9.5 |");
        assert_eq!(lines[5], "+---------+-----------+");
    }

    #[test]
    fn correlation_grid_marks_undefined_entries() {
        let m = correlation_matrix(&[
            ("flat".to_string(), vec![1.0, 1.0, 1.0]),
            ("x".to_string(), vec![1.0, 2.0, 3.0]),
        ])
        .unwrap();
        let mut buf = Vec::new();
        write_correlation(&mut buf, &m).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("undefined"));
        assert!(text.contains("1.000000"));
        assert!(text.contains("zero variance, correlation undefined for: flat"));
    }
}
