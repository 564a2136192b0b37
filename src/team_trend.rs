use std::io::{self, Write};

use crate::dataset::{TeamSeasonRecord, TeamStat};
use crate::error::{AnalysisError, Result};
use crate::ols::LinearModel;
use crate::report;

/// Order in which model coefficients are listed in the trend report.
pub const COEFFICIENT_ORDER: [TeamStat; 8] = [
    TeamStat::PassYardsPerAttempt,
    TeamStat::DefPassYardsPerAttempt,
    TeamStat::RushYardsPerAttempt,
    TeamStat::DefRushYardsPerAttempt,
    TeamStat::ReturnTouchdowns,
    TeamStat::Turnovers,
    TeamStat::TurnoversForced,
    TeamStat::PenaltyDifferential,
];

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonTrend {
    pub record: TeamSeasonRecord,
    pub predicted: f64,
    pub residual: f64,
}

impl SeasonTrend {
    pub fn verdict(&self) -> &'static str {
        if self.residual > 0.0 {
            "overperformed"
        } else {
            "underperformed"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamAverages {
    pub margin: f64,
    pub pass_ypa: f64,
    pub def_pass_ypa: f64,
    pub rush_ypa: f64,
    pub def_rush_ypa: f64,
    pub return_tds_total: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamTrend {
    pub team: String,
    pub seasons: Vec<SeasonTrend>,
    pub averages: TeamAverages,
    pub league_mean_margin: f64,
}

impl TeamTrend {
    /// Filters `records` to `team`, sorts by year and scores each season with `model`.
    pub fn build(
        records: &[TeamSeasonRecord],
        model: &LinearModel<TeamStat>,
        team: &str,
    ) -> Result<Self> {
        let mut subset: Vec<TeamSeasonRecord> = records
            .iter()
            .filter(|r| r.team == team)
            .cloned()
            .collect();
        if subset.is_empty() {
            return Err(AnalysisError::UnknownTeam {
                team: team.to_string(),
            });
        }
        subset.sort_by_key(|r| r.year);

        let predicted = model.predict(&subset);
        let seasons: Vec<SeasonTrend> = subset
            .into_iter()
            .zip(predicted)
            .map(|(record, predicted)| SeasonTrend {
                residual: record.margin - predicted,
                record,
                predicted,
            })
            .collect();

        let averages = TeamAverages {
            margin: mean(seasons.iter().map(|s| s.record.margin)),
            pass_ypa: mean(seasons.iter().map(|s| s.record.pass_ypa)),
            def_pass_ypa: mean(seasons.iter().map(|s| s.record.def_pass_ypa)),
            rush_ypa: mean(seasons.iter().map(|s| s.record.rush_ypa)),
            def_rush_ypa: mean(seasons.iter().map(|s| s.record.def_rush_ypa)),
            return_tds_total: seasons.iter().map(|s| s.record.return_tds as i64).sum(),
        };

        Ok(Self {
            team: team.to_string(),
            seasons,
            averages,
            league_mean_margin: mean(records.iter().map(|r| r.margin)),
        })
    }

    /// Team mean margin minus league mean margin.
    pub fn margin_delta(&self) -> f64 {
        self.averages.margin - self.league_mean_margin
    }

    pub fn year_span(&self) -> (i32, i32) {
        let first = self.seasons.first().map(|s| s.record.year).unwrap_or_default();
        let last = self.seasons.last().map(|s| s.record.year).unwrap_or_default();
        (first, last)
    }

    pub fn span_label(&self) -> String {
        let (first, last) = self.year_span();
        if first == last {
            first.to_string()
        } else {
            format!("{first}-{last}")
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

pub fn write_report(
    out: &mut impl Write,
    trend: &TeamTrend,
    model: &LinearModel<TeamStat>,
) -> io::Result<()> {
    let team_upper = trend.team.to_uppercase();
    let span = trend.span_label();

    report::write_banner(out, &format!("{team_upper} PERFORMANCE ANALYSIS ({span})"))?;
    writeln!(out)?;

    report::write_section(out, &format!("{team_upper} YEAR-BY-YEAR PERFORMANCE"))?;
    for season in &trend.seasons {
        let r = &season.record;
        writeln!(out, "\n{} Season:", r.year)?;
        writeln!(out, "  Actual Margin:    {:>6.1} points", r.margin)?;
        writeln!(out, "  Predicted Margin: {:>6.1} points", season.predicted)?;
        writeln!(
            out,
            "  Difference:       {:>6.1} points ({})",
            season.residual,
            season.verdict()
        )?;
        writeln!(out, "\n  Key Stats:")?;
        writeln!(out, "    Return TDs:     {}", r.return_tds)?;
        writeln!(out, "    Penalty Diff:   {}", r.penalty_diff)?;
        writeln!(
            out,
            "    Pass Yards/Att: {:.1} (Def: {:.1})",
            r.pass_ypa, r.def_pass_ypa
        )?;
        writeln!(
            out,
            "    Rush Yards/Att: {:.1} (Def: {:.1})",
            r.rush_ypa, r.def_rush_ypa
        )?;
        writeln!(
            out,
            "    Turnovers:      {} (Forced: {})",
            r.turnovers, r.turnovers_forced
        )?;
    }

    let avg = &trend.averages;
    let n = trend.seasons.len();
    report::write_section(
        out,
        &format!("{team_upper} {n}-SEASON AVERAGES ({span})"),
    )?;
    writeln!(out, "Average Margin:       {:>6.1}", avg.margin)?;
    writeln!(out, "Average Pass Yards/A: {:>6.2}", avg.pass_ypa)?;
    writeln!(out, "Average Def Pass Y/A: {:>6.2}", avg.def_pass_ypa)?;
    writeln!(out, "Average Rush Yards/A: {:>6.2}", avg.rush_ypa)?;
    writeln!(out, "Average Def Rush Y/A: {:>6.2}", avg.def_rush_ypa)?;
    writeln!(out, "Total Return TDs:     {}", avg.return_tds_total)?;

    report::write_section(out, "COMPARISON TO LEAGUE")?;
    let delta = trend.margin_delta();
    writeln!(out, "{:<22}{:>6.1}", format!("{} Avg Margin:", trend.team), avg.margin)?;
    writeln!(out, "{:<22}{:>6.1}", "League Avg Margin:", trend.league_mean_margin)?;
    writeln!(
        out,
        "{:<22}{:>+6.1} points {}",
        format!("{} vs League:", trend.team),
        delta,
        if delta >= 0.0 { "better" } else { "worse" }
    )?;

    report::write_section(out, "MODEL COEFFICIENTS (What Matters Most)")?;
    for stat in COEFFICIENT_ORDER {
        if let Some(c) = model.coefficient(stat) {
            writeln!(
                out,
                "{:<22}{:>+7.2}",
                format!("{}:", stat.description()),
                c.estimate
            )?;
        }
    }

    report::write_section(out, "ANALYSIS COMPLETE")
}
