use std::env;
use std::path::PathBuf;

const DEFAULT_NFL_DATA: &str = "NFLdata.csv";
const DEFAULT_QB_DATA: &str = "QBdata.csv";
const DEFAULT_OUTPUT_DIR: &str = "outputs";
const DEFAULT_TREND_TEAM: &str = "Seattle";

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub nfl_data_path: PathBuf,
    pub qb_data_path: PathBuf,
    pub output_dir: PathBuf,
    pub trend_team: String,
    pub charts: bool,
    pub workbook: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            nfl_data_path: PathBuf::from(DEFAULT_NFL_DATA),
            qb_data_path: PathBuf::from(DEFAULT_QB_DATA),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            trend_team: DEFAULT_TREND_TEAM.to_string(),
            charts: true,
            workbook: true,
        }
    }
}

impl AnalysisConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            nfl_data_path: env_path("NFL_DATA_PATH").unwrap_or(defaults.nfl_data_path),
            qb_data_path: env_path("QB_DATA_PATH").unwrap_or(defaults.qb_data_path),
            output_dir: env_path("ANALYSIS_OUTPUT_DIR").unwrap_or(defaults.output_dir),
            trend_team: env::var("TREND_TEAM")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.trend_team),
            charts: env_bool("ANALYSIS_CHARTS", defaults.charts),
            workbook: env_bool("ANALYSIS_WORKBOOK", defaults.workbook),
        }
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    /// File-name stem for the trend team, e.g. "New England" -> "new_england".
    pub fn team_slug(&self) -> String {
        slugify(&self.trend_team)
    }
}

pub fn slugify(input: &str) -> String {
    let lower = input.trim().to_ascii_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut prev_us = false;
    for ch in lower.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            prev_us = false;
        } else if !prev_us && !out.is_empty() {
            out.push('_');
            prev_us = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| {
            let t = v.trim().to_ascii_lowercase();
            !(t.is_empty() || t == "0" || t == "false" || t == "off" || t == "no")
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Seattle"), "seattle");
        assert_eq!(slugify("  New England "), "new_england");
        assert_eq!(slugify("L.A. Rams"), "l_a_rams");
    }
}
