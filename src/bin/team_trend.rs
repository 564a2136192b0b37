use anyhow::{Context, Result};

use gridiron_factors::config::AnalysisConfig;
use gridiron_factors::team_trend::{self, TeamTrend};
use gridiron_factors::{charts, dataset, export, league, report};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AnalysisConfig::from_env();
    let records = dataset::load_team_seasons(&config.nfl_data_path)
        .with_context(|| format!("loading {}", config.nfl_data_path.display()))?;

    // Coefficients come from every team-season, not just the trend team's.
    let model = league::fit_full_model(&records)?;
    let trend = TeamTrend::build(&records, &model, &config.trend_team)?;
    log::info!(
        "{}: {} seasons ({})",
        trend.team,
        trend.seasons.len(),
        trend.span_label()
    );

    let slug = config.team_slug();
    report::with_report_file(&config.output_path(&format!("{slug}_output.txt")), |out| {
        team_trend::write_report(out, &trend, &model).context("writing team trend report")
    })?;

    if config.workbook {
        let path = config.output_path(&format!("{slug}_seasons.xlsx"));
        if let Err(err) = export::export_team_workbook(&path, &trend) {
            log::warn!("workbook export failed: {err:#}");
        }
    }
    if config.charts {
        for (name, outcome) in charts::render_team_charts(&config.output_dir, &slug, &trend) {
            match outcome {
                Ok(path) => log::info!("{name} chart: {}", path.display()),
                Err(err) => log::warn!("{name} chart skipped: {err:#}"),
            }
        }
    }
    Ok(())
}
