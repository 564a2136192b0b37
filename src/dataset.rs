use std::fs::File;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::ols::{Observation, Term};

/// Team-season statistics used as regression terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamStat {
    ReturnTouchdowns,
    PenaltyDifferential,
    PassYardsPerAttempt,
    DefPassYardsPerAttempt,
    RushYardsPerAttempt,
    DefRushYardsPerAttempt,
    Turnovers,
    TurnoversForced,
    Margin,
}

impl TeamStat {
    /// The eight candidate predictors in table order.
    pub const PREDICTORS: [TeamStat; 8] = [
        TeamStat::ReturnTouchdowns,
        TeamStat::PenaltyDifferential,
        TeamStat::PassYardsPerAttempt,
        TeamStat::DefPassYardsPerAttempt,
        TeamStat::RushYardsPerAttempt,
        TeamStat::DefRushYardsPerAttempt,
        TeamStat::Turnovers,
        TeamStat::TurnoversForced,
    ];

    pub fn header(self) -> &'static str {
        match self {
            TeamStat::ReturnTouchdowns => "RET TD",
            TeamStat::PenaltyDifferential => "PENDIF",
            TeamStat::PassYardsPerAttempt => "PY/A",
            TeamStat::DefPassYardsPerAttempt => "DPY/A",
            TeamStat::RushYardsPerAttempt => "RY/A",
            TeamStat::DefRushYardsPerAttempt => "DRY/A",
            TeamStat::Turnovers => "TO",
            TeamStat::TurnoversForced => "DTO",
            TeamStat::Margin => "Margin",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TeamStat::ReturnTouchdowns => "Return TDs",
            TeamStat::PenaltyDifferential => "Penalty Differential",
            TeamStat::PassYardsPerAttempt => "Pass Yards/Attempt",
            TeamStat::DefPassYardsPerAttempt => "Def Pass Yards/Att",
            TeamStat::RushYardsPerAttempt => "Rush Yards/Attempt",
            TeamStat::DefRushYardsPerAttempt => "Def Rush Yards/Att",
            TeamStat::Turnovers => "Turnovers",
            TeamStat::TurnoversForced => "Defensive TOs",
            TeamStat::Margin => "Point Margin",
        }
    }
}

impl Term for TeamStat {
    fn name(self) -> &'static str {
        self.header()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSeasonRecord {
    #[serde(rename = "Team")]
    pub team: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "RET TD")]
    pub return_tds: i32,
    #[serde(rename = "PENDIF")]
    pub penalty_diff: i32,
    #[serde(rename = "PY/A")]
    pub pass_ypa: f64,
    #[serde(rename = "DPY/A")]
    pub def_pass_ypa: f64,
    #[serde(rename = "RY/A")]
    pub rush_ypa: f64,
    #[serde(rename = "DRY/A")]
    pub def_rush_ypa: f64,
    #[serde(rename = "TO")]
    pub turnovers: i32,
    #[serde(rename = "DTO")]
    pub turnovers_forced: i32,
    #[serde(rename = "Margin")]
    pub margin: f64,
}

impl TeamSeasonRecord {
    pub const HEADERS: [&'static str; 11] = [
        "Team", "Year", "RET TD", "PENDIF", "PY/A", "DPY/A", "RY/A", "DRY/A", "TO", "DTO", "Margin",
    ];

    pub fn stat(&self, stat: TeamStat) -> f64 {
        match stat {
            TeamStat::ReturnTouchdowns => self.return_tds as f64,
            TeamStat::PenaltyDifferential => self.penalty_diff as f64,
            TeamStat::PassYardsPerAttempt => self.pass_ypa,
            TeamStat::DefPassYardsPerAttempt => self.def_pass_ypa,
            TeamStat::RushYardsPerAttempt => self.rush_ypa,
            TeamStat::DefRushYardsPerAttempt => self.def_rush_ypa,
            TeamStat::Turnovers => self.turnovers as f64,
            TeamStat::TurnoversForced => self.turnovers_forced as f64,
            TeamStat::Margin => self.margin,
        }
    }
}

impl Observation<TeamStat> for TeamSeasonRecord {
    fn value(&self, term: TeamStat) -> f64 {
        self.stat(term)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterbackSeasonRecord {
    #[serde(rename = "Player")]
    pub player: String,
    #[serde(rename = "Yds")]
    pub yards: i32,
    #[serde(rename = "SackYards")]
    pub sack_yards: i32,
    #[serde(rename = "Att")]
    pub attempts: i32,
    #[serde(rename = "Int")]
    pub interceptions: i32,
    #[serde(rename = "OldQBR")]
    pub old_qbr: f64,
    #[serde(rename = "TOTALQBR")]
    pub total_qbr: f64,
}

impl QuarterbackSeasonRecord {
    pub const HEADERS: [&'static str; 7] = [
        "Player", "Yds", "SackYards", "Att", "Int", "OldQBR", "TOTALQBR",
    ];
}

pub fn load_team_seasons(path: &Path) -> Result<Vec<TeamSeasonRecord>> {
    load_table(path, &TeamSeasonRecord::HEADERS)
}

pub fn load_quarterback_seasons(path: &Path) -> Result<Vec<QuarterbackSeasonRecord>> {
    load_table(path, &QuarterbackSeasonRecord::HEADERS)
}

pub fn team_column(records: &[TeamSeasonRecord], stat: TeamStat) -> Vec<f64> {
    records.iter().map(|r| r.stat(stat)).collect()
}

fn load_table<R: DeserializeOwned>(path: &Path, required: &[&str]) -> Result<Vec<R>> {
    let file = File::open(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| AnalysisError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(AnalysisError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            });
        }
    }

    let mut rows = Vec::new();
    for row in reader.deserialize::<R>() {
        rows.push(row.map_err(|source| AnalysisError::Csv {
            path: path.to_path_buf(),
            source,
        })?);
    }
    if rows.is_empty() {
        return Err(AnalysisError::EmptyTable {
            path: path.to_path_buf(),
        });
    }
    log::info!("loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}
