use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

use gridiron_factors::correlation::correlation_matrix;
use gridiron_factors::dataset::{TeamSeasonRecord, TeamStat, team_column};
use gridiron_factors::league;
use gridiron_factors::ols::{DesignMatrix, fit_ols};

fn synthetic_seasons(n: usize) -> Vec<TeamSeasonRecord> {
    let mut rng = StdRng::seed_from_u64(18);
    (0..n)
        .map(|i| {
            let pass_ypa = rng.gen_range(5.5..8.5);
            let def_pass_ypa = rng.gen_range(5.5..8.0);
            let turnovers = rng.gen_range(10..35);
            let turnovers_forced = rng.gen_range(10..35);
            let noise: f64 = rng.gen_range(-30.0..30.0);
            TeamSeasonRecord {
                team: format!("Team {}", i % 32),
                year: 2000 + (i / 32) as i32,
                return_tds: rng.gen_range(0..6),
                penalty_diff: rng.gen_range(-25..25),
                pass_ypa,
                def_pass_ypa,
                rush_ypa: rng.gen_range(3.5..5.0),
                def_rush_ypa: rng.gen_range(3.5..5.0),
                turnovers,
                turnovers_forced,
                margin: 7.0 * pass_ypa - 8.0 * def_pass_ypa - 4.0 * turnovers as f64
                    + 4.0 * turnovers_forced as f64
                    + noise,
            }
        })
        .collect()
}

fn bench_fit_ols(c: &mut Criterion) {
    let records = synthetic_seasons(2_000);
    let mut design = DesignMatrix::new(records.len()).with_intercept();
    for stat in TeamStat::PREDICTORS {
        design
            .push_column(stat.header(), team_column(&records, stat))
            .unwrap();
    }
    let response = team_column(&records, TeamStat::Margin);
    c.bench_function("fit_ols_2000x9", |b| {
        b.iter(|| {
            let fit = fit_ols(black_box(&response), black_box(&design)).unwrap();
            black_box(fit.stats.r_squared);
        })
    });
}

fn bench_league_analysis(c: &mut Criterion) {
    let records = synthetic_seasons(320);
    c.bench_function("league_analyze_320", |b| {
        b.iter(|| {
            let analysis = league::analyze(black_box(&records)).unwrap();
            black_box(analysis.full.stats().r_squared);
        })
    });
}

fn bench_correlation(c: &mut Criterion) {
    let records = synthetic_seasons(2_000);
    let columns: Vec<(String, Vec<f64>)> = TeamStat::PREDICTORS
        .iter()
        .map(|s| (s.header().to_string(), team_column(&records, *s)))
        .collect();
    c.bench_function("correlation_8x2000", |b| {
        b.iter(|| {
            let m = correlation_matrix(black_box(&columns)).unwrap();
            black_box(m.get(0, 1));
        })
    });
}

criterion_group!(
    perf,
    bench_fit_ols,
    bench_league_analysis,
    bench_correlation
);
criterion_main!(perf);
