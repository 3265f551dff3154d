//! Latency-over-time scatter chart rendered as SVG

use crate::error::{AppError, Result};
use crate::models::Sample;
use std::fmt::Write as _;
use std::path::Path;

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;
const TICKS: u32 = 5;

const SUCCESS_COLOR: &str = "#1f77b4";
const FAILURE_COLOR: &str = "#d62728";

/// Scatter of invocation duration (y) against start offset (x)
#[derive(Debug, Clone)]
pub struct LatencyChart {
    pub title: String,
    pub concurrency: u32,
    pub loop_count: u32,
    pub width: u32,
    pub height: u32,
}

impl LatencyChart {
    pub fn new(title: impl Into<String>, concurrency: u32, loop_count: u32) -> Self {
        Self {
            title: title.into(),
            concurrency,
            loop_count,
            width: 1000,
            height: 600,
        }
    }

    /// Legend lines shown in the chart's top-right corner
    pub fn legend(&self) -> [String; 2] {
        [
            format!("concurrency={}", self.concurrency),
            format!("loop={}", self.loop_count),
        ]
    }

    /// Render the chart; an empty sample set renders axes only
    pub fn render(&self, samples: &[Sample]) -> String {
        let width = f64::from(self.width);
        let height = f64::from(self.height);
        let plot_w = width - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = height - MARGIN_TOP - MARGIN_BOTTOM;

        let origin = samples.iter().map(|s| s.start_time).min();
        let points: Vec<(f64, f64, bool)> = samples
            .iter()
            .map(|s| {
                let offset = origin
                    .map(|o| (s.start_time - o).num_milliseconds().max(0) as f64)
                    .unwrap_or(0.0);
                (offset, s.duration_ms as f64, s.is_success())
            })
            .collect();

        let max_x = nice_ceiling(points.iter().map(|p| p.0).fold(0.0, f64::max));
        let max_y = nice_ceiling(points.iter().map(|p| p.1).fold(0.0, f64::max));

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="12">"#,
            w = self.width,
            h = self.height
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="28" text-anchor="middle" font-size="16">{}</text>"#,
            width / 2.0,
            escape_xml(&self.title)
        );

        // Axes
        let x_axis_y = MARGIN_TOP + plot_h;
        let _ = writeln!(
            svg,
            r#"<line x1="{l}" y1="{b}" x2="{r}" y2="{b}" stroke="black"/>"#,
            l = MARGIN_LEFT,
            r = MARGIN_LEFT + plot_w,
            b = x_axis_y
        );
        let _ = writeln!(
            svg,
            r#"<line x1="{l}" y1="{t}" x2="{l}" y2="{b}" stroke="black"/>"#,
            l = MARGIN_LEFT,
            t = MARGIN_TOP,
            b = x_axis_y
        );

        for i in 0..=TICKS {
            let fraction = f64::from(i) / f64::from(TICKS);

            let x = MARGIN_LEFT + fraction * plot_w;
            let _ = writeln!(
                svg,
                r#"<line x1="{x:.1}" y1="{b}" x2="{x:.1}" y2="{tb}" stroke="black"/><text x="{x:.1}" y="{ty}" text-anchor="middle">{v}</text>"#,
                x = x,
                b = x_axis_y,
                tb = x_axis_y + 5.0,
                ty = x_axis_y + 20.0,
                v = format_tick(fraction * max_x)
            );

            let y = x_axis_y - fraction * plot_h;
            let _ = writeln!(
                svg,
                r##"<line x1="{l}" y1="{y:.1}" x2="{r}" y2="{y:.1}" stroke="#e0e0e0"/><text x="{tx}" y="{ty:.1}" text-anchor="end">{v}</text>"##,
                l = MARGIN_LEFT,
                r = MARGIN_LEFT + plot_w,
                y = y,
                tx = MARGIN_LEFT - 8.0,
                ty = y + 4.0,
                v = format_tick(fraction * max_y)
            );
        }

        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="middle">start offset (ms)</text>"#,
            MARGIN_LEFT + plot_w / 2.0,
            height - 15.0
        );
        let _ = writeln!(
            svg,
            r#"<text x="18" y="{y}" text-anchor="middle" transform="rotate(-90 18 {y})">duration (ms)</text>"#,
            y = MARGIN_TOP + plot_h / 2.0
        );

        // Successes first so failures stay visible on top
        for &(x, y, ok) in points.iter().filter(|p| p.2).chain(points.iter().filter(|p| !p.2)) {
            let cx = MARGIN_LEFT + x / max_x * plot_w;
            let cy = x_axis_y - y / max_y * plot_h;
            let color = if ok { SUCCESS_COLOR } else { FAILURE_COLOR };
            let _ = writeln!(
                svg,
                r#"<circle class="{}" cx="{:.1}" cy="{:.1}" r="2.5" fill="{}" fill-opacity="0.7"/>"#,
                if ok { "sample" } else { "sample failed" },
                cx,
                cy,
                color
            );
        }

        self.render_legend(&mut svg, points.iter().any(|p| !p.2));
        svg.push_str("</svg>\n");
        svg
    }

    fn render_legend(&self, svg: &mut String, has_failures: bool) {
        let mut lines: Vec<(String, Option<&str>)> = self
            .legend()
            .into_iter()
            .map(|line| (line, None))
            .collect();
        lines.push(("success".to_string(), Some(SUCCESS_COLOR)));
        if has_failures {
            lines.push(("failed".to_string(), Some(FAILURE_COLOR)));
        }

        let box_w = 140.0;
        let box_h = 10.0 + 16.0 * lines.len() as f64;
        let x = f64::from(self.width) - MARGIN_RIGHT - box_w - 5.0;
        let y = MARGIN_TOP + 5.0;

        let _ = writeln!(
            svg,
            r##"<g class="legend"><rect x="{x}" y="{y}" width="{box_w}" height="{box_h}" fill="white" stroke="#999"/>"##
        );
        for (i, (text, color)) in lines.iter().enumerate() {
            let ty = y + 18.0 + 16.0 * i as f64;
            match color {
                Some(color) => {
                    let _ = writeln!(
                        svg,
                        r#"<circle cx="{}" cy="{}" r="4" fill="{}"/><text x="{}" y="{}">{}</text>"#,
                        x + 14.0,
                        ty - 4.0,
                        color,
                        x + 24.0,
                        ty,
                        text
                    );
                }
                None => {
                    let _ = writeln!(svg, r#"<text x="{}" y="{}">{}</text>"#, x + 10.0, ty, text);
                }
            }
        }
        svg.push_str("</g>\n");
    }

    /// Render and write the chart to `path`
    pub fn write(&self, path: &Path, samples: &[Sample]) -> Result<()> {
        std::fs::write(path, self.render(samples))
            .map_err(|e| AppError::io(format!("Failed to write chart {}: {}", path.display(), e)))
    }
}

/// Round up to 1, 2 or 5 times a power of ten so ticks land on round numbers
fn nice_ceiling(value: f64) -> f64 {
    if value <= 0.0 {
        return 1.0;
    }

    let magnitude = 10f64.powi(value.log10().floor() as i32);
    let normalized = value / magnitude;
    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn format_tick(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
