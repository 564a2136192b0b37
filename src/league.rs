use std::io::{self, Write};

use crate::correlation::{CorrelationMatrix, correlation_matrix};
use crate::dataset::{TeamSeasonRecord, TeamStat, team_column};
use crate::error::Result;
use crate::ols::{Formula, LinearModel};
use crate::report;

pub const CORRELATION_HEADING: &str =
    "++++++++++++++++++++++ Correlation Matrix ++++++++++++++++++++++";

/// All eight predictors with the intercept suppressed.
pub fn full_formula() -> Formula<TeamStat> {
    Formula::new(TeamStat::Margin, TeamStat::PREDICTORS).without_intercept()
}

pub fn passing_formula() -> Formula<TeamStat> {
    Formula::new(
        TeamStat::Margin,
        [
            TeamStat::PassYardsPerAttempt,
            TeamStat::DefPassYardsPerAttempt,
        ],
    )
}

pub fn rushing_formula() -> Formula<TeamStat> {
    Formula::new(
        TeamStat::Margin,
        [
            TeamStat::RushYardsPerAttempt,
            TeamStat::DefRushYardsPerAttempt,
        ],
    )
}

pub fn fit_full_model(records: &[TeamSeasonRecord]) -> Result<LinearModel<TeamStat>> {
    LinearModel::fit("full", full_formula(), records)
}

#[derive(Debug, Clone)]
pub struct LeagueAnalysis {
    pub full: LinearModel<TeamStat>,
    pub passing: LinearModel<TeamStat>,
    pub rushing: LinearModel<TeamStat>,
    pub correlation: CorrelationMatrix,
}

impl LeagueAnalysis {
    pub fn models(&self) -> [&LinearModel<TeamStat>; 3] {
        [&self.full, &self.passing, &self.rushing]
    }
}

pub fn analyze(records: &[TeamSeasonRecord]) -> Result<LeagueAnalysis> {
    Ok(LeagueAnalysis {
        full: fit_full_model(records)?,
        passing: LinearModel::fit("passing", passing_formula(), records)?,
        rushing: LinearModel::fit("rushing", rushing_formula(), records)?,
        correlation: predictor_correlation(records)?,
    })
}

/// Correlation among the predictors only; team, year and margin are left out.
pub fn predictor_correlation(records: &[TeamSeasonRecord]) -> Result<CorrelationMatrix> {
    let columns: Vec<(String, Vec<f64>)> = TeamStat::PREDICTORS
        .iter()
        .map(|stat| (stat.header().to_string(), team_column(records, *stat)))
        .collect();
    correlation_matrix(&columns)
}

pub fn write_report(out: &mut impl Write, analysis: &LeagueAnalysis) -> io::Result<()> {
    for model in analysis.models() {
        report::write_model_summary(out, model)?;
    }
    writeln!(out, "{CORRELATION_HEADING}")?;
    report::write_correlation(out, &analysis.correlation)
}
