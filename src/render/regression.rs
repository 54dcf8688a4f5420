use plotters::prelude::*;

use super::{bold, color_or_black, font, padded_range, render_png};
use crate::config::{RegressionConfig, RenderStyle};
use crate::error::Result;
use crate::stats::LinearFit;

const POINT_RADIUS: u32 = 5;

/// Scatter of the complete `(x, y)` pairs with the fitted line on top.
pub fn render(
    pairs: &[(f64, f64)],
    fit: &LinearFit,
    cfg: &RegressionConfig,
    style: &RenderStyle,
) -> Result<()> {
    render_png(&cfg.output, (cfg.width, cfg.height), |root| {
        let family = style.font_family.as_str();
        let background = color_or_black(&style.background);
        let grid = color_or_black(&style.grid_color);
        let point_color = color_or_black(&cfg.point_color);
        let line_color = color_or_black(&cfg.line_color);
        root.fill(&background)?;

        let x_range = padded_range(pairs.iter().map(|p| p.0));
        let (x_min, x_max) = pairs
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.0), hi.max(p.0)));
        let line = [(x_min, fit.predict(x_min)), (x_max, fit.predict(x_max))];
        let y_range = padded_range(pairs.iter().map(|p| p.1).chain(line.iter().map(|p| p.1)));

        let mut chart = ChartBuilder::on(&root)
            .caption(cfg.title.as_str(), bold(family, style.title_size))
            .margin(style.margin as i32)
            .x_label_area_size(style.axis_label_size as i32 * 3)
            .y_label_area_size(style.axis_label_size as i32 * 4)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_desc(cfg.x_label.as_str())
            .y_desc(cfg.y_label.as_str())
            .label_style(font(family, style.tick_label_size))
            .axis_desc_style(bold(family, style.axis_label_size))
            .light_line_style(grid.mix(style.grid_alpha).stroke_width(1))
            .bold_line_style(grid.mix((style.grid_alpha * 2.0).min(1.0)).stroke_width(1))
            .draw()?;

        chart
            .draw_series(
                pairs
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), POINT_RADIUS, point_color.mix(0.6).filled())),
            )?
            .label(cfg.point_label.as_str())
            .legend(move |(x, y)| Circle::new((x + 15, y), POINT_RADIUS, point_color.filled()));

        chart
            .draw_series(LineSeries::new(
                line,
                line_color.stroke_width(style.line_width + 1),
            ))?
            .label(format!(
                "{} {fit} (R² = {:.2})",
                cfg.line_label,
                fit.r_squared()
            ))
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 30, y)], line_color.stroke_width(3))
            });

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .label_font(font(family, style.legend_size))
            .background_style(WHITE.mix(0.95).filled())
            .border_style(BLACK.mix(0.5).stroke_width(1))
            .draw()?;

        root.present()?;
        Ok(())
    })
}
