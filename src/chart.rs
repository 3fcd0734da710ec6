use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use plotters::prelude::*;
use tracing::debug;
use uuid::Uuid;

use crate::error::ChartError;
use crate::util::tick_date;

/// Cumulative lines for one or more regions.
#[derive(Debug, Clone)]
pub struct TotalsChart {
    pub title: String,
    pub y_label: String,
    pub dates: Vec<NaiveDate>,
    pub lines: Vec<(String, Vec<i64>)>,
}

/// Daily bars with a rolling-average overlay.
#[derive(Debug, Clone)]
pub struct DailyChart {
    pub title: String,
    pub y_label: String,
    pub dates: Vec<NaiveDate>,
    pub daily: Vec<i64>,
    pub average: Vec<f64>,
}

#[derive(Debug, Clone)]
pub enum Chart {
    Totals(TotalsChart),
    Daily(DailyChart),
}

impl Chart {
    fn frame(&self) -> (&str, &str, &[NaiveDate]) {
        match self {
            Chart::Totals(c) => (c.title.as_str(), c.y_label.as_str(), c.dates.as_slice()),
            Chart::Daily(c) => (c.title.as_str(), c.y_label.as_str(), c.dates.as_slice()),
        }
    }

    fn y_range(&self) -> (f64, f64) {
        let (min, max) = match self {
            Chart::Totals(c) => c
                .lines
                .iter()
                .flat_map(|(_, v)| v.iter().map(|x| *x as f64))
                .fold((0.0f64, 0.0f64), |(lo, hi), x| (lo.min(x), hi.max(x))),
            Chart::Daily(c) => c
                .daily
                .iter()
                .map(|x| *x as f64)
                .chain(c.average.iter().copied())
                .fold((0.0f64, 0.0f64), |(lo, hi), x| (lo.min(x), hi.max(x))),
        };
        (min * 1.05, max.max(1.0) * 1.05)
    }

    fn is_empty(&self) -> bool {
        match self {
            Chart::Totals(c) => c.dates.is_empty() || c.lines.is_empty(),
            Chart::Daily(c) => c.dates.is_empty(),
        }
    }
}

/// Produces a chart artifact and returns its location.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, chart: &Chart) -> Result<PathBuf, ChartError>;
}

/// Writes each chart to its own `covid_plot_<uuid>.svg`, so concurrent
/// commands never share an artifact.
pub struct SvgChartRenderer {
    dir: PathBuf,
}

impl SvgChartRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn render(&self, chart: &Chart) -> Result<PathBuf, ChartError> {
        if chart.is_empty() {
            return Err(ChartError::Empty);
        }
        std::fs::create_dir_all(&self.dir).map_err(|source| ChartError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.dir.join(format!("covid_plot_{}.svg", Uuid::new_v4()));
        match draw(&path, chart) {
            Ok(()) => {
                debug!(path = %path.display(), "rendered chart");
                Ok(path)
            }
            Err(e) => {
                // Never leave a half-written artifact behind.
                let _ = std::fs::remove_file(&path);
                Err(e)
            }
        }
    }
}

const LINE_COLORS: [RGBColor; 8] = [
    RGBColor(214, 39, 40),
    RGBColor(31, 119, 180),
    RGBColor(44, 160, 44),
    RGBColor(255, 127, 14),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(23, 190, 207),
];
const BAR_FILL: RGBColor = RGBColor(173, 216, 230);

/// Roughly one x label every four weeks, plus the last date.
fn tick_count(days: usize) -> usize {
    days.div_ceil(28) + 1
}

fn draw_err(e: impl std::fmt::Display) -> ChartError {
    ChartError::Draw(e.to_string())
}

fn draw(path: &Path, chart: &Chart) -> Result<(), ChartError> {
    let (title, y_label, dates) = chart.frame();
    let (y_min, y_max) = chart.y_range();
    let n = dates.len();

    let root = SVGBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(-0.5f64..(n as f64 + 4.5), y_min..y_max)
        .map_err(draw_err)?;

    let label_for = |x: &f64| -> String {
        let i = x.round();
        if i < 0.0 || (i as usize) >= n {
            return String::new();
        }
        tick_date(dates[i as usize])
    };
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_desc("Date")
        .y_desc(y_label)
        .x_labels(tick_count(n))
        .x_label_formatter(&label_for)
        .draw()
        .map_err(draw_err)?;

    match chart {
        Chart::Totals(c) => {
            for (i, (label, values)) in c.lines.iter().enumerate() {
                let color = LINE_COLORS[i % LINE_COLORS.len()];
                let points = values.iter().enumerate().map(|(x, y)| (x as f64, *y as f64));
                let anno = ctx
                    .draw_series(LineSeries::new(points, color.stroke_width(2)))
                    .map_err(draw_err)?;
                if c.lines.len() > 1 {
                    anno.label(label.as_str()).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
                }
            }
            if c.lines.len() > 1 {
                ctx.configure_series_labels()
                    .position(SeriesLabelPosition::UpperLeft)
                    .background_style(WHITE.mix(0.8))
                    .border_style(&BLACK)
                    .draw()
                    .map_err(draw_err)?;
            }
        }
        Chart::Daily(c) => {
            ctx.draw_series(c.daily.iter().enumerate().map(|(x, v)| {
                let x = x as f64;
                Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *v as f64)], BAR_FILL.filled())
            }))
            .map_err(draw_err)?;
            let points = c.average.iter().enumerate().map(|(x, y)| (x as f64, *y));
            ctx.draw_series(LineSeries::new(points, LINE_COLORS[0].stroke_width(2)))
                .map_err(draw_err)?;
        }
    }

    root.present().map_err(draw_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        (0..n)
            .map(|i| start + chrono::Days::new(i as u64))
            .collect()
    }

    #[test]
    fn renders_daily_chart_to_unique_svg() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = SvgChartRenderer::new(dir.path());
        let chart = Chart::Daily(DailyChart {
            title: "Daily Reported Covid Cases For Vermont".to_string(),
            y_label: "Number of cases".to_string(),
            dates: dates(4),
            daily: vec![0, 5, -1, 5],
            average: vec![0.0, 2.5, 2.0, 2.0],
        });
        let first = renderer.render(&chart).unwrap();
        let second = renderer.render(&chart).unwrap();
        assert_ne!(first, second);
        let body = std::fs::read_to_string(&first).unwrap();
        assert!(body.contains("<svg"));
    }

    #[test]
    fn renders_multi_line_totals() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = SvgChartRenderer::new(dir.path().join("nested"));
        let chart = Chart::Totals(TotalsChart {
            title: "Totals".to_string(),
            y_label: "Total Cases".to_string(),
            dates: dates(3),
            lines: vec![
                ("Vermont".to_string(), vec![1, 2, 3]),
                ("Maine".to_string(), vec![0, 4, 9]),
            ],
        });
        let path = renderer.render(&chart).unwrap();
        assert!(path.starts_with(dir.path().join("nested")));
        assert!(path.exists());
    }

    #[test]
    fn empty_chart_is_rejected_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = SvgChartRenderer::new(dir.path());
        let chart = Chart::Totals(TotalsChart {
            title: "Empty".to_string(),
            y_label: String::new(),
            dates: Vec::new(),
            lines: Vec::new(),
        });
        assert!(matches!(renderer.render(&chart), Err(ChartError::Empty)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn ticks_are_spaced_about_four_weeks_apart() {
        assert_eq!(tick_count(1), 2);
        assert_eq!(tick_count(28), 2);
        assert_eq!(tick_count(29), 3);
    }
}
