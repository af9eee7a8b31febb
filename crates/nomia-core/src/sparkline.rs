//! SVG sparkline paths for the history charts.
//!
//! Each chart is a `100 x 40` viewBox: samples are spread evenly across the
//! width and already carry their y coordinate (see [`crate::history`]).

use std::fmt::Write;

use crate::history::{CHART_HEIGHT, HistoryBuffer, Series};

/// Width of the sparkline viewBox.
pub const CHART_WIDTH: f64 = 100.0;

/// Stroke path plus closed area-fill path for one series.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SparklinePaths {
    pub path: String,
    pub fill: String,
}

/// Build the line and fill paths for a series of chart-space samples.
///
/// Fewer than two samples cannot be spread across the width and yield empty
/// paths.
pub fn sparkline_paths<'a, I>(samples: I) -> SparklinePaths
where
    I: IntoIterator<Item = &'a f64>,
    I::IntoIter: ExactSizeIterator,
{
    let iter = samples.into_iter();
    let n = iter.len();
    if n < 2 {
        return SparklinePaths::default();
    }

    let mut path = String::with_capacity(n * 12);
    path.push('M');
    for (i, v) in iter.enumerate() {
        let x = (i as f64 / (n - 1) as f64) * CHART_WIDTH;
        if i > 0 {
            path.push_str(" L");
        }
        let _ = write!(path, " {},{}", fmt_coord(x), fmt_coord(*v));
    }
    let fill = format!(
        "{path} L {},{} L 0,{} Z",
        fmt_coord(CHART_WIDTH),
        fmt_coord(CHART_HEIGHT),
        fmt_coord(CHART_HEIGHT)
    );
    SparklinePaths { path, fill }
}

/// Trim float noise: at most three decimals, no trailing zeros.
fn fmt_coord(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Render both history series as a standalone SVG document.
pub fn render_svg(history: &HistoryBuffer) -> String {
    let panels = [Series::Distance, Series::Temperature];
    let panel_h = CHART_HEIGHT + 16.0;
    let total_h = panel_h * panels.len() as f64;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" preserveAspectRatio="none">"#,
        fmt_coord(CHART_WIDTH),
        fmt_coord(total_h)
    );
    svg.push_str(r##"  <rect width="100%" height="100%" fill="#000"/>"##);
    svg.push('\n');

    for (i, series) in panels.iter().enumerate() {
        let paths = sparkline_paths(history.series(*series));
        let y = i as f64 * panel_h;
        let _ = writeln!(svg, r#"  <g transform="translate(0,{})">"#, fmt_coord(y));
        let _ = writeln!(
            svg,
            r##"    <text x="1" y="10" font-family="monospace" font-size="6" fill="#fff">{} ({})</text>"##,
            series.label(),
            series.unit()
        );
        let _ = writeln!(svg, r#"    <g transform="translate(0,14)">"#);
        let _ = writeln!(
            svg,
            r##"      <path d="{}" fill="#fff" fill-opacity="0.1" stroke="none"/>"##,
            paths.fill
        );
        let _ = writeln!(
            svg,
            r##"      <path d="{}" fill="none" stroke="#fff" stroke-width="0.5"/>"##,
            paths.path
        );
        svg.push_str("    </g>\n  </g>\n");
    }
    svg.push_str("</svg>\n");
    svg
}
