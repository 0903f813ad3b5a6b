// plot.rs

use crate::analysis::Analysis;
use crate::conditions::LabelPosition;
use crate::error::{PhosphoPcaError, Result};
use log::info;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

pub const PLOT_SIZE: (u32, u32) = (800, 600);
/// Arrow head width in data units; head length is 1.5x this.
pub const ARROW_HEAD_WIDTH: f64 = 0.5;

const LABEL_FONT_SIZE: u32 = 16;
const AXIS_FONT_SIZE: u32 = 21;
const POINT_RADIUS: i32 = 4;

fn plot_err<E: std::fmt::Display>(e: E) -> PhosphoPcaError {
    PhosphoPcaError::Plot(e.to_string())
}

/// `PC1 (42.3%)`
pub fn axis_label(component: usize, ratio: f64) -> String {
    format!("PC{} ({:.1}%)", component, ratio * 100.0)
}

/// Shaft plus a V-shaped head whose tip sits exactly on `to`.
/// A zero-length step yields no paths.
pub fn arrow_paths(from: (f64, f64), to: (f64, f64), head_width: f64) -> Vec<Vec<(f64, f64)>> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let length = dx.hypot(dy);
    if length <= f64::EPSILON {
        return Vec::new();
    }
    let (ux, uy) = (dx / length, dy / length);
    let head_length = (1.5 * head_width).min(length);
    let half = head_width / 2.0;
    let base = (to.0 - ux * head_length, to.1 - uy * head_length);
    let left = (base.0 - uy * half, base.1 + ux * half);
    let right = (base.0 + uy * half, base.1 - ux * half);
    vec![vec![from, to], vec![left, to, right]]
}

/// Padded axis range covering every value.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    let pad = if hi > lo { (hi - lo) * 0.1 } else { 1.0 };
    (lo - pad, hi + pad)
}

/// Renders the PC1/PC2 score plot with labels, trajectory arrows and legend
/// to an SVG file.
pub fn render_score_plot(analysis: &Analysis, out_path: &Path) -> Result<()> {
    let coords = analysis.condition_coordinates();

    let mut xs: Vec<f64> = coords.iter().map(|(_, x, _)| *x).collect();
    let mut ys: Vec<f64> = coords.iter().map(|(_, _, y)| *y).collect();
    for (spec, _, _) in &coords {
        if let LabelPosition::Anchored { x, y } = spec.label_position {
            xs.push(x);
            ys.push(y);
        }
    }
    let x_range = padded_range(xs.into_iter());
    let y_range = padded_range(ys.into_iter());

    let ratios = &analysis.pca.explained_variance_ratio;

    info!("Writing score plot to {}", out_path.display());
    let root = SVGBackend::new(out_path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(axis_label(1, ratios[0]))
        .y_desc(axis_label(2, ratios[1]))
        .axis_desc_style(("sans-serif", AXIS_FONT_SIZE))
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(
            coords
                .iter()
                .map(|(_, x, y)| Circle::new((*x, *y), POINT_RADIUS, BLACK.filled())),
        )
        .map_err(plot_err)?;

    let label_style = ("sans-serif", LABEL_FONT_SIZE)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Bottom));
    chart
        .draw_series(coords.iter().map(|(spec, x, y)| {
            let at = match spec.label_position {
                LabelPosition::Anchored { x, y } => (x, y),
                LabelPosition::BesidePoint => (*x, *y),
            };
            Text::new(spec.text_for_plot(), at, label_style.clone())
        }))
        .map_err(plot_err)?;

    let steps = analysis.conditions.trajectory_steps();
    for group in analysis.conditions.groups() {
        let (r, g, b) = group.rgb();
        let color = RGBColor(r, g, b);
        let paths: Vec<Vec<(f64, f64)>> = steps
            .iter()
            .filter(|(from, _)| {
                analysis
                    .conditions
                    .get(*from)
                    .map_or(false, |c| c.group == group)
            })
            .flat_map(|&(from, to)| {
                let (_, x1, y1) = coords[from];
                let (_, x2, y2) = coords[to];
                arrow_paths((x1, y1), (x2, y2), ARROW_HEAD_WIDTH)
            })
            .collect();

        chart
            .draw_series(
                paths
                    .into_iter()
                    .map(|path| PathElement::new(path, color.stroke_width(2))),
            )
            .map_err(plot_err)?
            .label(group.legend_label())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font(("sans-serif", LABEL_FONT_SIZE))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_label_rounds_to_one_decimal() {
        assert_eq!(axis_label(1, 0.61234), "PC1 (61.2%)");
        assert_eq!(axis_label(2, 0.0999), "PC2 (10.0%)");
    }

    #[test]
    fn arrow_tip_lands_on_target() {
        let paths = arrow_paths((0.0, 0.0), (4.0, 0.0), 0.5);
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], vec![(0.0, 0.0), (4.0, 0.0)]);
        let head = &paths[1];
        assert_eq!(head[1], (4.0, 0.0));
        // head length 0.75 back along x, half width 0.25 either side
        assert!((head[0].0 - 3.25).abs() < 1e-12 && (head[0].1 - 0.25).abs() < 1e-12);
        assert!((head[2].0 - 3.25).abs() < 1e-12 && (head[2].1 + 0.25).abs() < 1e-12);
    }

    #[test]
    fn short_arrow_head_is_clamped_and_zero_length_skipped() {
        let paths = arrow_paths((0.0, 0.0), (0.0, 0.5), 0.5);
        assert!((paths[1][0].1 - 0.0).abs() < 1e-12);
        assert!(arrow_paths((1.0, 1.0), (1.0, 1.0), 0.5).is_empty());
    }

    #[test]
    fn ranges_are_padded() {
        let (lo, hi) = padded_range([0.0, 10.0].into_iter());
        assert_eq!((lo, hi), (-1.0, 11.0));
        assert_eq!(padded_range([3.0].into_iter()), (2.0, 4.0));
    }
}
