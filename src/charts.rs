use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::correlation::CorrelationMatrix;
use crate::dataset::{TeamSeasonRecord, TeamStat};
use crate::league::LeagueAnalysis;
use crate::ols::LinearModel;
use crate::team_trend::TeamTrend;

const NAVY: RGBColor = RGBColor(0, 34, 68);
const ACTION_GREEN: RGBColor = RGBColor(105, 190, 40);
const LOSS_RED: RGBColor = RGBColor(200, 16, 46);
const GAIN_GREEN: RGBColor = RGBColor(0, 177, 64);
const PENALTY_ORANGE: RGBColor = RGBColor(255, 140, 0);
const UNDEFINED_GREY: RGBColor = RGBColor(190, 190, 190);

pub type ChartResult = (&'static str, Result<PathBuf>);

pub fn render_league_charts(
    dir: &Path,
    analysis: &LeagueAnalysis,
    records: &[TeamSeasonRecord],
) -> Vec<ChartResult> {
    vec![
        (
            "coefficients",
            render(dir, "nfl_full_coefficients.svg", |p| {
                coefficient_chart(p, &analysis.full)
            }),
        ),
        (
            "actual vs predicted",
            render(dir, "nfl_actual_vs_predicted.svg", |p| {
                actual_vs_predicted_chart(p, &analysis.full, records)
            }),
        ),
        (
            "correlation heatmap",
            render(dir, "nfl_correlation_heatmap.svg", |p| {
                correlation_heatmap(p, &analysis.correlation)
            }),
        ),
        (
            "model comparison",
            render(dir, "nfl_model_r2.svg", |p| r_squared_chart(p, analysis)),
        ),
    ]
}

pub fn render_team_charts(dir: &Path, slug: &str, trend: &TeamTrend) -> Vec<ChartResult> {
    vec![
        (
            "margin",
            render(dir, &format!("{slug}_margin.svg"), |p| margin_chart(p, trend)),
        ),
        (
            "stats timeline",
            render(dir, &format!("{slug}_stats_timeline.svg"), |p| {
                timeline_chart(p, trend)
            }),
        ),
        (
            "residuals",
            render(dir, &format!("{slug}_residuals.svg"), |p| {
                residual_chart(p, trend)
            }),
        ),
    ]
}

fn render(dir: &Path, file_name: &str, draw: impl FnOnce(&Path) -> Result<()>) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(file_name);
    draw(&path).with_context(|| format!("render {}", path.display()))?;
    Ok(path)
}

fn coefficient_chart(path: &Path, model: &LinearModel<TeamStat>) -> Result<()> {
    let coefs = &model.fit.coefficients;
    let labels: Vec<String> = coefs.iter().map(|c| c.term.clone()).collect();
    let y = padded_range(coefs.iter().map(|c| c.estimate).chain([0.0]));

    let root = SVGBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Margin per unit of each factor ({} model)", model.name),
            ("sans-serif", 24),
        )
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d((0..labels.len() as i32).into_segmented(), y)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len() + 1)
        .x_label_formatter(&|v| segment_label(v, &labels))
        .y_desc("Coefficient (points)")
        .draw()?;

    chart.draw_series(coefs.iter().enumerate().map(|(i, c)| {
        let color = if c.estimate >= 0.0 { GAIN_GREEN } else { LOSS_RED };
        let mut bar = Rectangle::new(
            [
                (SegmentValue::Exact(i as i32), 0.0),
                (SegmentValue::Exact(i as i32 + 1), c.estimate),
            ],
            color.filled(),
        );
        bar.set_margin(0, 0, 12, 12);
        bar
    }))?;
    root.present()?;
    Ok(())
}

fn actual_vs_predicted_chart(
    path: &Path,
    model: &LinearModel<TeamStat>,
    records: &[TeamSeasonRecord],
) -> Result<()> {
    let predicted = model.predict(records);
    let points: Vec<(f64, f64)> = records.iter().map(|r| r.margin).zip(predicted).collect();
    let axis = padded_range(points.iter().flat_map(|(a, p)| [*a, *p]));

    let root = SVGBackend::new(path, (800, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Actual vs predicted point margin", ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(axis.clone(), axis.clone())?;
    chart
        .configure_mesh()
        .x_desc("Predicted margin")
        .y_desc("Actual margin")
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            vec![(axis.start, axis.start), (axis.end, axis.end)],
            BLACK.stroke_width(1),
        ))?
        .label("perfect prediction")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));
    chart
        .draw_series(
            points
                .iter()
                .map(|(actual, pred)| Circle::new((*pred, *actual), 4, NAVY.mix(0.6).filled())),
        )?
        .label("team-season")
        .legend(|(x, y)| Circle::new((x + 10, y), 4, NAVY.filled()));
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

fn correlation_heatmap(path: &Path, matrix: &CorrelationMatrix) -> Result<()> {
    let m = matrix.size() as i32;
    let labels = &matrix.labels;
    // Row 0 is drawn at the top.
    let row_labels: Vec<String> = labels.iter().rev().cloned().collect();

    let root = SVGBackend::new(path, (900, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Predictor correlation matrix", ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d((0..m).into_segmented(), (0..m).into_segmented())?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(labels.len() + 1)
        .y_labels(labels.len() + 1)
        .x_label_formatter(&|v| segment_label(v, labels))
        .y_label_formatter(&|v| segment_label(v, &row_labels))
        .draw()?;

    let cells: Vec<(i32, i32, Option<f64>)> = (0..m)
        .flat_map(|i| (0..m).map(move |j| (i, j)))
        .map(|(i, j)| (i, j, matrix.get(i as usize, j as usize)))
        .collect();

    chart.draw_series(cells.iter().map(|(i, j, r)| {
        let row = m - 1 - i;
        let color = r.map(diverging).unwrap_or(UNDEFINED_GREY);
        Rectangle::new(
            [
                (SegmentValue::Exact(*j), SegmentValue::Exact(row)),
                (SegmentValue::Exact(j + 1), SegmentValue::Exact(row + 1)),
            ],
            color.filled(),
        )
    }))?;

    let centered = TextStyle::from(("sans-serif", 14).into_font())
        .pos(Pos::new(HPos::Center, VPos::Center));
    chart.draw_series(cells.iter().map(|(i, j, r)| {
        let text = r.map(|v| format!("{v:.2}")).unwrap_or_else(|| "n/a".to_string());
        Text::new(
            text,
            (SegmentValue::CenterOf(*j), SegmentValue::CenterOf(m - 1 - i)),
            centered.clone(),
        )
    }))?;
    root.present()?;
    Ok(())
}

fn r_squared_chart(path: &Path, analysis: &LeagueAnalysis) -> Result<()> {
    let models = analysis.models();
    let labels: Vec<String> = models
        .iter()
        .map(|m| {
            if m.stats().centered {
                m.name.clone()
            } else {
                format!("{} (uncentered)", m.name)
            }
        })
        .collect();
    let low = models
        .iter()
        .map(|m| m.stats().r_squared)
        .fold(0.0_f64, f64::min);

    let root = SVGBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Variance in margin explained", ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d((0..models.len() as i32).into_segmented(), low..1.05)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(models.len() + 1)
        .x_label_formatter(&|v| segment_label(v, &labels))
        .y_desc("R-squared")
        .draw()?;
    chart.draw_series(models.iter().enumerate().map(|(i, model)| {
        let mut bar = Rectangle::new(
            [
                (SegmentValue::Exact(i as i32), 0.0),
                (SegmentValue::Exact(i as i32 + 1), model.stats().r_squared),
            ],
            NAVY.filled(),
        );
        bar.set_margin(0, 0, 30, 30);
        bar
    }))?;
    root.present()?;
    Ok(())
}

fn margin_chart(path: &Path, trend: &TeamTrend) -> Result<()> {
    let years = season_axis(trend);
    let y = padded_range(
        trend
            .seasons
            .iter()
            .flat_map(|s| [s.record.margin, s.predicted])
            .chain([0.0]),
    );

    let root = SVGBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!(
                "{}: actual vs predicted point margin ({})",
                trend.team,
                trend.span_label()
            ),
            ("sans-serif", 24),
        )
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(years, y)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(trend.seasons.len() * 2 + 1)
        .x_label_formatter(&year_label)
        .x_desc("Season")
        .y_desc("Point Differential")
        .draw()?;

    let width = 0.35;
    chart
        .draw_series(trend.seasons.iter().map(|s| {
            let x = s.record.year as f64;
            Rectangle::new([(x - width, 0.0), (x, s.record.margin)], NAVY.filled())
        }))?
        .label("Actual Margin")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], NAVY.filled()));
    chart
        .draw_series(trend.seasons.iter().map(|s| {
            let x = s.record.year as f64;
            Rectangle::new(
                [(x, 0.0), (x + width, s.predicted)],
                ACTION_GREEN.mix(0.8).filled(),
            )
        }))?
        .label("Predicted Margin")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], ACTION_GREEN.filled()));
    draw_zero_line(&mut chart, &season_axis(trend))?;
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

fn timeline_chart(path: &Path, trend: &TeamTrend) -> Result<()> {
    let root = SVGBackend::new(path, (1400, 1000)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(
        &format!("{} performance metrics over time", trend.team),
        ("sans-serif", 28),
    )?;
    let panels = root.split_evenly((2, 2));
    let seasons = &trend.seasons;
    let col = |f: fn(&TeamSeasonRecord) -> f64| -> Vec<f64> {
        seasons.iter().map(|s| f(&s.record)).collect()
    };

    timeline_panel(
        &panels[0],
        trend,
        "Passing Yards per Attempt",
        "Yards/Attempt",
        &[
            ("Offense", col(|r| r.pass_ypa), NAVY),
            ("Defense (allowed)", col(|r| r.def_pass_ypa), ACTION_GREEN),
        ],
    )?;
    timeline_panel(
        &panels[1],
        trend,
        "Rushing Yards per Attempt",
        "Yards/Attempt",
        &[
            ("Offense", col(|r| r.rush_ypa), NAVY),
            ("Defense (allowed)", col(|r| r.def_rush_ypa), ACTION_GREEN),
        ],
    )?;
    timeline_panel(
        &panels[2],
        trend,
        "Turnovers",
        "Count",
        &[
            ("Turnovers (bad)", col(|r| r.turnovers as f64), LOSS_RED),
            ("Forced TOs (good)", col(|r| r.turnovers_forced as f64), GAIN_GREEN),
        ],
    )?;
    timeline_panel(
        &panels[3],
        trend,
        "Special Teams & Penalties",
        "Return TDs / Penalty Diff",
        &[
            ("Return TDs", col(|r| r.return_tds as f64), NAVY),
            ("Penalty Diff", col(|r| r.penalty_diff as f64), PENALTY_ORANGE),
        ],
    )?;
    root.present()?;
    Ok(())
}

fn timeline_panel(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    trend: &TeamTrend,
    title: &str,
    y_desc: &str,
    series: &[(&str, Vec<f64>, RGBColor)],
) -> Result<()> {
    let years: Vec<f64> = trend.seasons.iter().map(|s| s.record.year as f64).collect();
    let y = padded_range(series.iter().flat_map(|(_, v, _)| v.iter().copied()));
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(50)
        .build_cartesian_2d(season_axis(trend), y)?;
    chart
        .configure_mesh()
        .x_labels(trend.seasons.len() * 2 + 1)
        .x_label_formatter(&year_label)
        .y_desc(y_desc)
        .draw()?;

    for (label, values, color) in series {
        let color = *color;
        let points: Vec<(f64, f64)> = years.iter().copied().zip(values.iter().copied()).collect();
        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(3)))?
            .label(*label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart.draw_series(points.iter().map(|p| Circle::new(*p, 5, color.filled())))?;
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn residual_chart(path: &Path, trend: &TeamTrend) -> Result<()> {
    let y = padded_range(trend.seasons.iter().map(|s| s.residual).chain([0.0]));

    let root = SVGBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{}: over/under performance vs model prediction", trend.team),
            ("sans-serif", 24),
        )
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(season_axis(trend), y)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(trend.seasons.len() * 2 + 1)
        .x_label_formatter(&year_label)
        .x_desc("Season")
        .y_desc("Residual (Actual - Predicted)")
        .draw()?;

    chart.draw_series(trend.seasons.iter().map(|s| {
        let x = s.record.year as f64;
        let color = if s.residual > 0.0 { ACTION_GREEN } else { LOSS_RED };
        Rectangle::new([(x - 0.3, 0.0), (x + 0.3, s.residual)], color.filled())
    }))?;
    let label_style = TextStyle::from(("sans-serif", 16).into_font())
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_series(trend.seasons.iter().map(|s| {
        Text::new(
            format!("{:+.1}", s.residual),
            (s.record.year as f64, s.residual),
            label_style.clone(),
        )
    }))?;
    draw_zero_line(&mut chart, &season_axis(trend))?;
    root.present()?;
    Ok(())
}

fn draw_zero_line(
    chart: &mut ChartContext<'_, SVGBackend<'_>, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    x: &Range<f64>,
) -> Result<()> {
    chart.draw_series(LineSeries::new(
        vec![(x.start, 0.0), (x.end, 0.0)],
        BLACK.stroke_width(1),
    ))?;
    Ok(())
}

fn season_axis(trend: &TeamTrend) -> Range<f64> {
    let (first, last) = trend.year_span();
    (first as f64 - 0.6)..(last as f64 + 0.6)
}

fn year_label(x: &f64) -> String {
    if (x - x.round()).abs() < 1e-6 {
        format!("{}", x.round() as i64)
    } else {
        String::new()
    }
}

fn segment_label(value: &SegmentValue<i32>, labels: &[String]) -> String {
    match value {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

/// Min/max of `values` widened by 10%, never narrower than one unit.
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return -1.0..1.0;
    }
    let pad = ((hi - lo) * 0.1).max(0.5);
    (lo - pad)..(hi + pad)
}

fn diverging(r: f64) -> RGBColor {
    let t = r.clamp(-1.0, 1.0);
    let (target, weight) = if t >= 0.0 {
        ((178.0, 24.0, 43.0), t)
    } else {
        ((33.0, 102.0, 172.0), -t)
    };
    let mix = |to: f64| (255.0 + (to - 255.0) * weight).round() as u8;
    RGBColor(mix(target.0), mix(target.1), mix(target.2))
}
