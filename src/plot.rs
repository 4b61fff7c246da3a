// SVG chart of measured and projected area over time

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const WIDTH: f64 = 1200.0;
const HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 100.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 70.0;
const TARGET_TICKS: f64 = 8.0;

const ACTUAL_COLOR: &str = "green";
const PREDICTED_COLOR: &str = "red";

/// Data range mapped onto the plotting area
#[derive(Debug, Clone, Copy)]
struct Axes {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Axes {
    fn fit(points: impl Iterator<Item = (f64, f64)>) -> Self {
        let mut axes = Axes {
            x_min: f64::MAX,
            x_max: f64::MIN,
            y_min: f64::MAX,
            y_max: f64::MIN,
        };
        for (x, y) in points.filter(|(x, y)| x.is_finite() && y.is_finite()) {
            axes.x_min = axes.x_min.min(x);
            axes.x_max = axes.x_max.max(x);
            axes.y_min = axes.y_min.min(y);
            axes.y_max = axes.y_max.max(y);
        }

        if axes.x_min > axes.x_max {
            // Default if no points
            return Axes {
                x_min: 0.0,
                x_max: 1.0,
                y_min: 0.0,
                y_max: 1.0,
            };
        }

        let (x_min, x_max) = pad(axes.x_min, axes.x_max, 0.0);
        let (y_min, y_max) = pad(axes.y_min, axes.y_max, 0.05);
        Axes {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    fn to_px(&self, x: f64, y: f64) -> (f64, f64) {
        let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        let px = MARGIN_LEFT + (x - self.x_min) / (self.x_max - self.x_min) * plot_w;
        let py = MARGIN_TOP + (self.y_max - y) / (self.y_max - self.y_min) * plot_h;
        (px, py)
    }
}

/// Widen a range by `fraction` on both ends, never leaving it empty
fn pad(min: f64, max: f64, fraction: f64) -> (f64, f64) {
    let span = max - min;
    if span <= f64::EPSILON {
        let half = (min.abs() * 0.1).max(1.0);
        return (min - half, max + half);
    }
    (min - span * fraction, max + span * fraction)
}

/// Round step size (1, 2 or 5 times a power of ten)
fn tick_step(span: f64) -> f64 {
    let raw = span / TARGET_TICKS;
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
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

fn ticks(min: f64, max: f64) -> Vec<f64> {
    let step = tick_step(max - min);
    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

fn write_polyline<W: Write>(
    out: &mut W,
    axes: &Axes,
    points: impl Iterator<Item = (f64, f64)>,
    color: &str,
    dash: Option<&str>,
) -> Result<()> {
    write!(out, r#"  <polyline fill="none" stroke="{}" stroke-width="2" "#, color)?;
    if let Some(dash) = dash {
        write!(out, r#"stroke-dasharray="{}" "#, dash)?;
    }
    write!(out, r#"points=""#)?;
    for (x, y) in points {
        let (px, py) = axes.to_px(x, y);
        write!(out, "{:.2},{:.2} ", px, py)?;
    }
    writeln!(out, r#"" />"#)?;
    Ok(())
}

/// Render the observed series (solid) and observed+predicted (dashed)
pub fn render_chart<W: Write>(
    out: &mut W,
    observed_frames: &[u64],
    observed_areas: &[u64],
    all_frames: &[u64],
    all_areas: &[f64],
) -> Result<()> {
    let observed = || {
        observed_frames
            .iter()
            .zip(observed_areas)
            .map(|(&f, &a)| (f as f64, a as f64))
    };
    let combined = || all_frames.iter().zip(all_areas).map(|(&f, &a)| (f as f64, a));

    let axes = Axes::fit(observed().chain(combined()));
    let (left, top) = (MARGIN_LEFT, MARGIN_TOP);
    let (right, bottom) = (WIDTH - MARGIN_RIGHT, HEIGHT - MARGIN_BOTTOM);

    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
    )?;
    writeln!(out, r#"  <title>Soap area over time</title>"#)?;
    writeln!(out, r#"  <rect width="100%" height="100%" fill="white" />"#)?;
    writeln!(out, r#"  <g font-family="sans-serif" font-size="12" fill="black">"#)?;

    for x in ticks(axes.x_min, axes.x_max) {
        let (px, _) = axes.to_px(x, axes.y_min);
        writeln!(
            out,
            r##"    <line x1="{px:.2}" y1="{top}" x2="{px:.2}" y2="{bottom}" stroke="#e0e0e0" />"##
        )?;
        writeln!(
            out,
            r#"    <text x="{px:.2}" y="{:.2}" text-anchor="middle">{x}</text>"#,
            bottom + 18.0
        )?;
    }
    for y in ticks(axes.y_min, axes.y_max) {
        let (_, py) = axes.to_px(axes.x_min, y);
        writeln!(
            out,
            r##"    <line x1="{left}" y1="{py:.2}" x2="{right}" y2="{py:.2}" stroke="#e0e0e0" />"##
        )?;
        writeln!(
            out,
            r#"    <text x="{:.2}" y="{:.2}" text-anchor="end">{y}</text>"#,
            left - 8.0,
            py + 4.0
        )?;
    }

    writeln!(
        out,
        r#"    <rect x="{left}" y="{top}" width="{:.2}" height="{:.2}" fill="none" stroke="black" />"#,
        right - left,
        bottom - top
    )?;
    writeln!(
        out,
        r#"    <text x="{:.2}" y="{:.2}" text-anchor="middle" font-size="14">TIME (frames)</text>"#,
        (left + right) / 2.0,
        HEIGHT - 20.0
    )?;
    writeln!(
        out,
        r#"    <text x="25" y="{0:.2}" text-anchor="middle" font-size="14" transform="rotate(-90 25 {0:.2})">SOAP AREA (pixels)</text>"#,
        (top + bottom) / 2.0
    )?;
    writeln!(out, "  </g>")?;

    write_polyline(out, &axes, observed(), ACTUAL_COLOR, None)?;
    write_polyline(out, &axes, combined(), PREDICTED_COLOR, Some("8,6"))?;

    // Legend
    let (lx, ly) = (right - 170.0, top + 15.0);
    writeln!(
        out,
        r#"  <rect x="{:.2}" y="{:.2}" width="160" height="50" fill="white" stroke="gray" />"#,
        lx - 10.0,
        ly - 12.0
    )?;
    for (row, (label, color, dash)) in [
        ("Actual", ACTUAL_COLOR, ""),
        ("Predicted", PREDICTED_COLOR, r#" stroke-dasharray="8,6""#),
    ]
    .into_iter()
    .enumerate()
    {
        let y = ly + row as f64 * 22.0;
        writeln!(
            out,
            r#"  <line x1="{lx:.2}" y1="{y:.2}" x2="{:.2}" y2="{y:.2}" stroke="{color}" stroke-width="2"{dash} />"#,
            lx + 40.0
        )?;
        writeln!(
            out,
            r#"  <text x="{:.2}" y="{:.2}" font-family="sans-serif" font-size="13">{label}</text>"#,
            lx + 50.0,
            y + 4.0
        )?;
    }

    writeln!(out, "</svg>")?;
    Ok(())
}

/// Write the chart to an SVG file
pub fn write_chart<P: AsRef<Path>>(
    path: P,
    observed_frames: &[u64],
    observed_areas: &[u64],
    all_frames: &[u64],
    all_areas: &[f64],
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create chart {}", path.display()))?;
    let mut out = BufWriter::new(file);

    render_chart(&mut out, observed_frames, observed_areas, all_frames, all_areas)?;
    out.flush()
        .with_context(|| format!("Failed to write chart {}", path.display()))?;

    tracing::info!("Wrote chart to {}", path.display());
    Ok(())
}
