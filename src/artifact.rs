use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dataset::TeamStat;
use crate::league::LeagueAnalysis;
use crate::ols::{LinearModel, Term};

pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientEntry {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    #[serde(default)]
    pub p_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    pub formula: String,
    pub response: String,
    pub intercept: bool,
    pub observations: usize,
    pub r_squared: f64,
    #[serde(default)]
    pub adj_r_squared: f64,
    pub centered: bool,
    #[serde(default)]
    pub coefficients: Vec<CoefficientEntry>,
}

impl ModelArtifact {
    pub fn from_model(model: &LinearModel<TeamStat>) -> Self {
        let s = model.stats();
        Self {
            name: model.name.clone(),
            formula: model.formula.to_string(),
            response: model.formula.response.name().to_string(),
            intercept: model.formula.intercept,
            observations: s.observations,
            r_squared: s.r_squared,
            adj_r_squared: s.adj_r_squared,
            centered: s.centered,
            coefficients: model
                .fit
                .coefficients
                .iter()
                .map(|c| CoefficientEntry {
                    term: c.term.clone(),
                    estimate: c.estimate,
                    std_error: c.std_error,
                    p_value: c.p_value,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueModelsArtifact {
    pub version: u32,
    pub generated_at: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub models: Vec<ModelArtifact>,
}

impl LeagueModelsArtifact {
    pub fn from_analysis(analysis: &LeagueAnalysis, source: Option<String>) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            generated_at: chrono::Utc::now().to_rfc3339(),
            source,
            models: analysis
                .models()
                .into_iter()
                .map(ModelArtifact::from_model)
                .collect(),
        }
    }

    pub fn model(&self, name: &str) -> Option<&ModelArtifact> {
        self.models.iter().find(|m| m.name == name)
    }
}

pub fn save_artifact(path: &Path, artifact: &LeagueModelsArtifact) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }
    let tmp = path.with_extension("json.tmp");
    let raw = serde_json::to_string_pretty(artifact).context("serialize model artifact")?;
    fs::write(&tmp, raw).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    log::info!("model artifact written: {}", path.display());
    Ok(())
}

pub fn load_artifact(path: &Path) -> Result<LeagueModelsArtifact> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let artifact: LeagueModelsArtifact =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    anyhow::ensure!(
        artifact.version == ARTIFACT_VERSION,
        "unsupported model artifact version {}",
        artifact.version
    );
    Ok(artifact)
}
