use anyhow::{Context, Result};

use gridiron_factors::config::AnalysisConfig;
use gridiron_factors::{dataset, export, qb_rating, report};

const REPORT_FILE: &str = "qb_rating_output.txt";
const WORKBOOK_FILE: &str = "qb_rating.xlsx";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AnalysisConfig::from_env();
    let records = dataset::load_quarterback_seasons(&config.qb_data_path)
        .with_context(|| format!("loading {}", config.qb_data_path.display()))?;
    let comparison = qb_rating::analyze(&records)?;

    report::with_report_file(&config.output_path(REPORT_FILE), |out| {
        qb_rating::write_report(out, &comparison).context("writing quarterback report")
    })?;

    if config.workbook {
        let path = config.output_path(WORKBOOK_FILE);
        if let Err(err) = export::export_qb_workbook(&path, &comparison) {
            log::warn!("workbook export failed: {err:#}");
        }
    }
    Ok(())
}
