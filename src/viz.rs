//! Chart rendering for the sales reports using Plotters

use crate::config::{ChartFormat, MonthlyAxis, ReportConfig};
use crate::error::Result;
use crate::report::{CustomerRevenue, MonthlySales, ProductSales, Reports, YearMonth};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const PRODUCT_COLOR: RGBColor = RGBColor(59, 82, 139);
const CUSTOMER_COLOR: RGBColor = RGBColor(180, 4, 38);
const TREND_COLOR: RGBColor = RGBColor(33, 145, 140);

const BAR_CHART_SIZE: (u32, u32) = (1000, 600);
const LINE_CHART_SIZE: (u32, u32) = (1000, 500);

/// Horizontal bar chart, first category drawn at the top
#[derive(Debug, Clone)]
pub struct BarChart {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub color: RGBColor,
}

/// Line chart with point markers over an integer x axis
#[derive(Debug, Clone)]
pub struct LineChart {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub points: Vec<(i64, f64)>,
    pub axis: MonthlyAxis,
}

#[derive(Debug, Clone)]
pub enum Chart {
    Bars(BarChart),
    Line(LineChart),
}

impl Chart {
    fn size(&self) -> (u32, u32) {
        match self {
            Chart::Bars(_) => BAR_CHART_SIZE,
            Chart::Line(_) => LINE_CHART_SIZE,
        }
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        match self {
            Chart::Bars(chart) => draw_bars(root, chart),
            Chart::Line(chart) => draw_line(root, chart),
        }
    }
}

pub fn top_products_chart(rows: &[ProductSales]) -> Chart {
    Chart::Bars(BarChart {
        title: format!("Top {} Best Selling Products", rows.len()),
        x_desc: "Total Quantity Sold".to_string(),
        y_desc: "Product Name".to_string(),
        labels: rows.iter().map(|r| r.description.clone()).collect(),
        values: rows.iter().map(|r| r.total_sales as f64).collect(),
        color: PRODUCT_COLOR,
    })
}

pub fn top_customers_chart(rows: &[CustomerRevenue]) -> Chart {
    Chart::Bars(BarChart {
        title: format!("Top {} Customers by Revenue", rows.len()),
        x_desc: "Total Revenue (£)".to_string(),
        y_desc: "Customer ID".to_string(),
        labels: rows.iter().map(|r| r.customer_id.to_string()).collect(),
        values: rows.iter().map(|r| r.total_revenue).collect(),
        color: CUSTOMER_COLOR,
    })
}

pub fn monthly_sales_chart(rows: &[MonthlySales], axis: MonthlyAxis) -> Chart {
    let points = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let x = match axis {
                MonthlyAxis::Calendar => row.period.ordinal(),
                MonthlyAxis::Positional => index as i64,
            };
            (x, row.total_sales)
        })
        .collect();

    Chart::Line(LineChart {
        title: "Monthly Sales Trends".to_string(),
        x_desc: "Month".to_string(),
        y_desc: "Total Sales".to_string(),
        points,
        axis,
    })
}

/// Render one chart to `path` in the requested format
pub fn render_chart(chart: &Chart, path: &Path, format: ChartFormat) -> Result<()> {
    match format {
        ChartFormat::Png => {
            let root = BitMapBackend::new(path, chart.size()).into_drawing_area();
            chart.draw(&root)?;
            root.present()?;
        }
        ChartFormat::Svg => {
            let root = SVGBackend::new(path, chart.size()).into_drawing_area();
            chart.draw(&root)?;
            root.present()?;
        }
    }
    info!(path = %path.display(), "chart saved");
    Ok(())
}

fn draw_bars<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, chart: &BarChart) -> Result<()> {
    root.fill(&WHITE)?;

    let n = chart.values.len();
    let max_value = chart.values.iter().fold(0.0_f64, |a, &b| a.max(b));
    let x_max = if max_value > 0.0 { max_value * 1.1 } else { 1.0 };
    let y_max = n.max(1) as f64 - 0.5;

    let mut plot = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(280)
        .build_cartesian_2d(0f64..x_max, -0.5f64..y_max)?;

    // Row `rank` is drawn at y = n - 1 - rank so the largest bar is on top
    let format_y = |y: &f64| {
        let slot = y.round();
        if (y - slot).abs() > 0.01 || slot < 0.0 || slot as usize >= n {
            return String::new();
        }
        chart.labels[n - 1 - slot as usize].clone()
    };

    plot.configure_mesh()
        .disable_y_mesh()
        .y_labels(n.max(1))
        .y_label_formatter(&format_y)
        .x_desc(chart.x_desc.as_str())
        .y_desc(chart.y_desc.as_str())
        .axis_desc_style(("sans-serif", 15))
        .label_style(("sans-serif", 12))
        .draw()?;

    plot.draw_series(chart.values.iter().enumerate().map(|(rank, &value)| {
        let y = (n - 1 - rank) as f64;
        Rectangle::new([(0.0, y - 0.4), (value, y + 0.4)], chart.color.filled())
    }))?;

    Ok(())
}

fn draw_line<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, chart: &LineChart) -> Result<()> {
    root.fill(&WHITE)?;

    let (x_min, x_max) = match (chart.points.first(), chart.points.last()) {
        (Some(first), Some(last)) => (first.0 - 1, last.0 + 1),
        _ => (0, 1),
    };
    let y_max = chart.points.iter().fold(0.0_f64, |a, p| a.max(p.1));
    let y_min = chart.points.iter().fold(0.0_f64, |a, p| a.min(p.1));
    let y_max = if y_max > y_min { y_max * 1.1 } else { y_min + 1.0 };

    let mut plot = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    let axis = chart.axis;
    let format_x = move |x: &i64| match axis {
        MonthlyAxis::Calendar => YearMonth::from_ordinal(*x).to_string(),
        MonthlyAxis::Positional => x.to_string(),
    };

    plot.configure_mesh()
        .x_labels(chart.points.len().clamp(2, 24))
        .x_label_formatter(&format_x)
        .x_desc(chart.x_desc.as_str())
        .y_desc(chart.y_desc.as_str())
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    plot.draw_series(LineSeries::new(
        chart.points.iter().copied(),
        TREND_COLOR.stroke_width(2),
    ))?;
    plot.draw_series(
        chart
            .points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 4, TREND_COLOR.filled())),
    )?;

    Ok(())
}

/// Render all three reports into `config.output_dir`
///
/// # Returns
/// * Paths of the written chart files, in report order
pub fn render_reports(reports: &Reports, config: &ReportConfig) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(&config.output_dir)?;
    let extension = config.format.extension();

    let charts = [
        ("top_products", top_products_chart(&reports.top_products)),
        (
            "monthly_sales",
            monthly_sales_chart(&reports.monthly_sales, config.monthly_axis),
        ),
        ("top_customers", top_customers_chart(&reports.top_customers)),
    ];

    let mut written = Vec::with_capacity(charts.len());
    for (name, chart) in &charts {
        let path = config.output_dir.join(format!("{}.{}", name, extension));
        render_chart(chart, &path, config.format)?;
        written.push(path);
    }
    Ok(written)
}
