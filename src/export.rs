use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::correlation::CorrelationMatrix;
use crate::dataset::TeamStat;
use crate::league::LeagueAnalysis;
use crate::ols::LinearModel;
use crate::qb_rating::QbComparison;
use crate::team_trend::TeamTrend;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map(Cell::Number).unwrap_or_else(|| Cell::from("undefined"))
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::Number(value as f64)
    }
}

pub fn export_league_workbook(path: &Path, analysis: &LeagueAnalysis) -> Result<()> {
    let mut workbook = Workbook::new();
    for model in analysis.models() {
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name(&model.name))?;
        write_rows(sheet, &coefficient_rows(model))?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Correlation")?;
        write_rows(sheet, &correlation_rows(&analysis.correlation))?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    log::info!("workbook written: {}", path.display());
    Ok(())
}

pub fn export_team_workbook(path: &Path, trend: &TeamTrend) -> Result<()> {
    let mut rows = vec![vec![
        Cell::from("Year"),
        Cell::from("Margin"),
        Cell::from("Predicted"),
        Cell::from("Residual"),
    ]];
    rows[0].extend(TeamStat::PREDICTORS.iter().map(|s| Cell::from(s.header())));
    for season in &trend.seasons {
        let mut row = vec![
            Cell::from(season.record.year),
            Cell::from(season.record.margin),
            Cell::from(season.predicted),
            Cell::from(season.residual),
        ];
        row.extend(
            TeamStat::PREDICTORS
                .iter()
                .map(|s| Cell::from(season.record.stat(*s))),
        );
        rows.push(row);
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name(&trend.team))?;
        write_rows(sheet, &rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    log::info!("workbook written: {}", path.display());
    Ok(())
}

pub fn export_qb_workbook(path: &Path, comparison: &QbComparison) -> Result<()> {
    let mut rows = vec![
        ["Player", "TRUOPASS", "OINTRATE", "OldQBR", "TOTALQBR", "OurRating"]
            .into_iter()
            .map(Cell::from)
            .collect::<Vec<_>>(),
    ];
    for r in &comparison.ratings {
        rows.push(vec![
            Cell::from(r.player.clone()),
            Cell::from(r.true_net_ypa),
            Cell::from(r.interception_rate),
            Cell::from(r.old_qbr),
            Cell::from(r.total_qbr),
            Cell::from(r.rating),
        ]);
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Ratings")?;
        write_rows(sheet, &rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Correlation")?;
        write_rows(sheet, &correlation_rows(&comparison.correlation))?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    log::info!("workbook written: {}", path.display());
    Ok(())
}

pub fn coefficient_rows(model: &LinearModel<TeamStat>) -> Vec<Vec<Cell>> {
    let mut rows = vec![
        ["Term", "Coef", "Std Err", "t", "P>|t|", "CI 2.5%", "CI 97.5%"]
            .into_iter()
            .map(Cell::from)
            .collect::<Vec<_>>(),
    ];
    for c in &model.fit.coefficients {
        rows.push(vec![
            Cell::from(c.term.clone()),
            Cell::from(c.estimate),
            Cell::from(c.std_error),
            Cell::from(c.t_stat),
            Cell::from(c.p_value),
            Cell::from(c.ci_low),
            Cell::from(c.ci_high),
        ]);
    }
    let s = model.stats();
    rows.push(Vec::new());
    rows.push(vec![Cell::from("R-squared"), Cell::from(s.r_squared)]);
    rows.push(vec![Cell::from("Adj. R-squared"), Cell::from(s.adj_r_squared)]);
    rows.push(vec![
        Cell::from("Centered"),
        Cell::from(if s.centered { "yes" } else { "no" }),
    ]);
    rows.push(vec![
        Cell::from("Observations"),
        Cell::from(s.observations as f64),
    ]);
    rows.push(vec![Cell::from("Df Residuals"), Cell::from(s.df_resid as f64)]);
    rows
}

pub fn correlation_rows(matrix: &CorrelationMatrix) -> Vec<Vec<Cell>> {
    let mut header = vec![Cell::from("")];
    header.extend(matrix.labels.iter().map(|l| Cell::from(l.clone())));
    let mut rows = vec![header];
    for (i, label) in matrix.labels.iter().enumerate() {
        let mut row = vec![Cell::from(label.clone())];
        row.extend((0..matrix.size()).map(|j| match matrix.get(i, j) {
            Some(r) => Cell::from(r),
            None => Cell::from("undefined"),
        }));
        rows.push(row);
    }
    rows
}

// Excel caps sheet names at 31 characters and rejects []:*?/\ in them.
fn sheet_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .take(31)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            match value {
                Cell::Number(v) if v.is_finite() => {
                    worksheet.write_number(r, c, *v)
                }
                Cell::Number(v) => worksheet.write_string(r, c, v.to_string()),
                Cell::Text(s) => worksheet.write_string(r, c, s),
            }
            .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
