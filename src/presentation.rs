use crate::error::{Result, SalesReportError};
use crate::schema::{AggregateBundle, RevenueEntry};
use plotters::prelude::*;
use serde::Serialize;

const CHART_SIZE: (u32, u32) = (640, 320);

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl ChartSpec {
    pub fn new(title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
        }
    }
}

/// Turns a non-empty revenue table into an embeddable HTML fragment.
pub trait ChartRenderer: Send + Sync {
    fn line_chart(&self, spec: &ChartSpec, series: &[RevenueEntry]) -> Result<String>;
    fn bar_chart(&self, spec: &ChartSpec, series: &[RevenueEntry]) -> Result<String>;
}

/// Embeddable chart fragments for one report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFragments {
    pub monthly_chart: String,
    pub product_chart: String,
    pub salesperson_chart: String,
}

/// HTML tables for one report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTables {
    pub product: String,
    pub salesperson: String,
    pub monthly: String,
}

pub fn build_figures(
    aggregates: &AggregateBundle,
    renderer: &dyn ChartRenderer,
) -> Result<ChartFragments> {
    let monthly_chart = if aggregates.monthly.is_empty() {
        placeholder("monthly")
    } else {
        renderer.line_chart(
            &ChartSpec::new("Monthly Revenue", "YearMonth", "Revenue"),
            &aggregates.monthly,
        )?
    };

    let product_chart = if aggregates.per_product.is_empty() {
        placeholder("product")
    } else {
        renderer.bar_chart(
            &ChartSpec::new("Revenue by Product", "Product", "Revenue"),
            &aggregates.per_product,
        )?
    };

    let salesperson_chart = if aggregates.per_salesperson.is_empty() {
        placeholder("salesperson")
    } else {
        renderer.bar_chart(
            &ChartSpec::new("Revenue by Salesperson", "Salesperson", "Revenue"),
            &aggregates.per_salesperson,
        )?
    };

    Ok(ChartFragments {
        monthly_chart,
        product_chart,
        salesperson_chart,
    })
}

pub fn build_tables(aggregates: &AggregateBundle) -> ReportTables {
    ReportTables {
        product: render_table("Product", &aggregates.per_product),
        salesperson: render_table("Salesperson", &aggregates.per_salesperson),
        monthly: render_table("YearMonth", &aggregates.monthly),
    }
}

/// Two-column sortable HTML table: `label_header` and `Revenue`.
pub fn render_table(label_header: &str, rows: &[RevenueEntry]) -> String {
    let mut html = String::from(
        "<table class=\"table table-striped table-hover sortable\">\n  <thead>\n",
    );
    html.push_str(&format!(
        "    <tr><th>{}</th><th>Revenue</th></tr>\n  </thead>\n  <tbody>\n",
        escape_html(label_header)
    ));
    for row in rows {
        html.push_str(&format!(
            "    <tr><td>{}</td><td>{:.2}</td></tr>\n",
            escape_html(&row.label),
            row.revenue
        ));
    }
    html.push_str("  </tbody>\n</table>");
    html
}

fn placeholder(kind: &str) -> String {
    format!("<p>No {} data available.</p>", kind)
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders charts as inline SVG documents drawn with plotters.
///
/// Revenue that overflowed to a non-finite value is left undrawn; its label
/// still gets an axis slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgChartRenderer;

fn chart_error<E: std::fmt::Display>(err: E) -> SalesReportError {
    SalesReportError::Chart(err.to_string())
}

/// Top of the y axis: the largest finite revenue plus headroom, at least 1.0
/// so all-zero series still draw.
fn y_upper(series: &[RevenueEntry]) -> f64 {
    let max = series
        .iter()
        .map(|e| e.revenue)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max)
        .max(1.0);
    let padded = max * 1.1;
    if padded.is_finite() {
        padded
    } else {
        max
    }
}

fn finite_points(series: &[RevenueEntry]) -> impl Iterator<Item = (i32, f64)> + '_ {
    series
        .iter()
        .enumerate()
        .filter(|(_, e)| e.revenue.is_finite())
        .map(|(i, e)| (i as i32, e.revenue.max(0.0)))
}

impl ChartRenderer for SvgChartRenderer {
    fn line_chart(&self, spec: &ChartSpec, series: &[RevenueEntry]) -> Result<String> {
        let labels: Vec<&str> = series.iter().map(|e| e.label.as_str()).collect();
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
            root.fill(&WHITE).map_err(chart_error)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(&spec.title, ("sans-serif", 20))
                .margin(10)
                .x_label_area_size(50)
                .y_label_area_size(70)
                .build_cartesian_2d((0..series.len() as i32).into_segmented(), 0f64..y_upper(series))
                .map_err(chart_error)?;

            let label_for = |value: &SegmentValue<i32>| segment_label(&labels, value);
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(labels.len())
                .x_label_formatter(&label_for)
                .x_desc(spec.x_label.as_str())
                .y_desc(spec.y_label.as_str())
                .draw()
                .map_err(chart_error)?;

            let points: Vec<(SegmentValue<i32>, f64)> = finite_points(series)
                .map(|(i, v)| (SegmentValue::CenterOf(i), v))
                .collect();
            chart
                .draw_series(LineSeries::new(points.iter().cloned(), &BLUE))
                .map_err(chart_error)?;
            chart
                .draw_series(points.iter().map(|p| Circle::new(p.clone(), 3, BLUE.filled())))
                .map_err(chart_error)?;

            root.present().map_err(chart_error)?;
        }
        Ok(svg)
    }

    fn bar_chart(&self, spec: &ChartSpec, series: &[RevenueEntry]) -> Result<String> {
        let labels: Vec<&str> = series.iter().map(|e| e.label.as_str()).collect();
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
            root.fill(&WHITE).map_err(chart_error)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(&spec.title, ("sans-serif", 20))
                .margin(10)
                .x_label_area_size(50)
                .y_label_area_size(70)
                .build_cartesian_2d((0..series.len() as i32).into_segmented(), 0f64..y_upper(series))
                .map_err(chart_error)?;

            let label_for = |value: &SegmentValue<i32>| segment_label(&labels, value);
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(labels.len())
                .x_label_formatter(&label_for)
                .x_desc(spec.x_label.as_str())
                .y_desc(spec.y_label.as_str())
                .draw()
                .map_err(chart_error)?;

            chart
                .draw_series(
                    Histogram::vertical(&chart)
                        .style(BLUE.filled())
                        .margin(8)
                        .data(finite_points(series)),
                )
                .map_err(chart_error)?;

            root.present().map_err(chart_error)?;
        }
        Ok(svg)
    }
}

fn segment_label(labels: &[&str], value: &SegmentValue<i32>) -> String {
    match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => usize::try_from(*i)
            .ok()
            .and_then(|i| labels.get(i))
            .map(|label| label.to_string())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}
