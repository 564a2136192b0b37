use anyhow::{Context, Result};

use gridiron_factors::artifact::{self, LeagueModelsArtifact};
use gridiron_factors::config::AnalysisConfig;
use gridiron_factors::{charts, dataset, export, league, report};

const REPORT_FILE: &str = "nfl_regression_output.txt";
const WORKBOOK_FILE: &str = "nfl_regression.xlsx";
const ARTIFACT_FILE: &str = "league_models.json";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AnalysisConfig::from_env();
    let records = dataset::load_team_seasons(&config.nfl_data_path)
        .with_context(|| format!("loading {}", config.nfl_data_path.display()))?;
    let analysis = league::analyze(&records)?;

    report::with_report_file(&config.output_path(REPORT_FILE), |out| {
        league::write_report(out, &analysis).context("writing regression report")
    })?;

    if config.workbook {
        let path = config.output_path(WORKBOOK_FILE);
        if let Err(err) = export::export_league_workbook(&path, &analysis) {
            log::warn!("workbook export failed: {err:#}");
        }
    }
    if config.charts {
        for (name, outcome) in charts::render_league_charts(&config.output_dir, &analysis, &records)
        {
            match outcome {
                Ok(path) => log::info!("{name} chart: {}", path.display()),
                Err(err) => log::warn!("{name} chart skipped: {err:#}"),
            }
        }
    }

    let source = Some(config.nfl_data_path.display().to_string());
    let models = LeagueModelsArtifact::from_analysis(&analysis, source);
    artifact::save_artifact(&config.output_path(ARTIFACT_FILE), &models)?;
    Ok(())
}
