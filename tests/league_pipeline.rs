use std::path::PathBuf;

use gridiron_factors::dataset::{TeamSeasonRecord, TeamStat, load_team_seasons};
use gridiron_factors::league::{self, LeagueAnalysis};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn load_fixture() -> (Vec<TeamSeasonRecord>, LeagueAnalysis) {
    let records = load_team_seasons(&fixture_path("nfl_sample.csv")).expect("fixture should load");
    let analysis = league::analyze(&records).expect("fixture should fit");
    (records, analysis)
}

fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() <= tol,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn fits_three_models_over_every_team_season() {
    let (records, analysis) = load_fixture();
    assert_eq!(records.len(), 40);

    let names: Vec<&str> = analysis.models().iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["full", "passing", "rushing"]);
    assert_eq!(analysis.full.fit.coefficients.len(), 8);
    assert_eq!(analysis.passing.fit.coefficients.len(), 3);
    assert_eq!(analysis.rushing.fit.coefficients.len(), 3);
    for model in analysis.models() {
        assert_eq!(model.stats().observations, 40);
        let r2 = model.stats().r_squared;
        if model.stats().centered {
            assert!((0.0..=1.0).contains(&r2), "{} R2 out of range: {r2}", model.name);
        } else {
            // Taken about zero; only finiteness is guaranteed to be meaningful.
            assert!(r2.is_finite());
        }
    }
    assert!(!analysis.full.stats().centered);
    assert!(analysis.passing.stats().centered);
    assert_eq!(analysis.full.intercept(), None);
}

#[test]
fn passing_model_matches_normal_equations() {
    let (_, analysis) = load_fixture();
    let model = &analysis.passing;
    assert_close(model.intercept().expect("intercept"), -2.0770627297114292, 1e-6);
    assert_close(
        model.coefficient(TeamStat::PassYardsPerAttempt).expect("PY/A").estimate,
        7.3801331592183494,
        1e-6,
    );
    assert_close(
        model.coefficient(TeamStat::DefPassYardsPerAttempt).expect("DPY/A").estimate,
        -6.525978855378327,
        1e-6,
    );
    assert_close(model.stats().rss, 86555.31429788451, 1e-4);
    assert_close(model.stats().r_squared, 0.02028120563227853, 1e-9);
}

#[test]
fn full_model_reports_uncentered_r_squared() {
    let (_, analysis) = load_fixture();
    let model = &analysis.full;
    assert_close(model.stats().r_squared, 0.7129923695935172, 1e-9);
    assert_close(
        model.coefficient(TeamStat::Turnovers).expect("TO").estimate,
        -4.911282552039519,
        1e-6,
    );
    assert_close(
        model.coefficient(TeamStat::TurnoversForced).expect("DTO").estimate,
        3.845243688106333,
        1e-6,
    );
}

#[test]
fn residuals_are_orthogonal_to_every_predictor() {
    let (records, analysis) = load_fixture();
    let residuals = &analysis.full.fit.residuals;
    for stat in TeamStat::PREDICTORS {
        let dot: f64 = records
            .iter()
            .zip(residuals)
            .map(|(r, e)| r.stat(stat) * e)
            .sum();
        assert!(dot.abs() < 1e-6, "{} not orthogonal: {dot}", stat.header());
    }

    let intercept_model_sum: f64 = analysis.rushing.fit.residuals.iter().sum();
    assert!(intercept_model_sum.abs() < 1e-8);
}

#[test]
fn prediction_reproduces_the_residual_sum_of_squares() {
    let (records, analysis) = load_fixture();
    for model in analysis.models() {
        let predicted = model.predict(&records);
        let rss: f64 = records
            .iter()
            .zip(&predicted)
            .map(|(r, p)| (r.margin - p).powi(2))
            .sum();
        assert_close(rss, model.stats().rss, 1e-6 * model.stats().rss.max(1.0));
    }
}

#[test]
fn predictor_correlation_is_symmetric_with_unit_diagonal() {
    let (_, analysis) = load_fixture();
    let m = &analysis.correlation;
    assert_eq!(m.size(), 8);
    assert_eq!(m.labels[0], "RET TD");
    assert!(m.zero_variance.is_empty());
    for i in 0..m.size() {
        assert_close(m.get(i, i).expect("diagonal"), 1.0, 1e-12);
        for j in 0..m.size() {
            let (a, b) = (m.get(i, j).expect("defined"), m.get(j, i).expect("defined"));
            assert_eq!(a, b);
            assert!((-1.0..=1.0).contains(&a));
        }
    }
}

#[test]
fn report_lists_each_model_then_the_correlation_grid() {
    let (_, analysis) = load_fixture();
    let mut out = Vec::new();
    league::write_report(&mut out, &analysis).expect("write to memory");
    let text = String::from_utf8(out).expect("utf8");

    let full = text.find("OLS Regression Results: full").expect("full summary");
    let passing = text.find("OLS Regression Results: passing").expect("passing summary");
    let rushing = text.find("OLS Regression Results: rushing").expect("rushing summary");
    let grid = text.find(league::CORRELATION_HEADING).expect("correlation heading");
    assert!(full < passing && passing < rushing && rushing < grid);
    assert!(text.contains("R-squared (uncentered):"));
    assert!(text.contains("Formula: Margin ~ PY/A + DPY/A"));
    assert!(!text.contains("undefined"));
}
