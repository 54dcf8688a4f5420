use chrono::{Duration, NaiveDateTime, Timelike};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;

use super::{bold, color_or_black, font, padded_range, render_png};
use crate::config::{RenderStyle, SeriesSpec, TimeSeriesConfig};
use crate::error::Result;

/// Pixel width reserved for one y-axis.
const AXIS_WIDTH: i32 = 110;
const THIRD_AXIS_TICKS: usize = 5;
/// Space between the secondary axis band and the third axis.
const THIRD_AXIS_GAP: i32 = 20;

/// One line of the overlay chart with the points it will draw.
#[derive(Debug, Clone)]
pub struct Series<'a> {
    pub spec: &'a SeriesSpec,
    pub points: Vec<(NaiveDateTime, f64)>,
    pub color: RGBColor,
}

impl Series<'_> {
    fn value_range(&self) -> std::ops::Range<f64> {
        padded_range(self.points.iter().map(|p| p.1))
    }
}

/// Hour-aligned origin of the x-axis, on a multiple of `tick_hours`.
fn axis_origin(first: NaiveDateTime, tick_hours: u32) -> NaiveDateTime {
    let tick = tick_hours.max(1);
    let hour = first.hour() / tick * tick;
    first
        .date()
        .and_hms_opt(hour, 0, 0)
        .unwrap_or(first)
}

/// Horizontal positions on the right of the plot when three axes are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ThirdAxisLayout {
    secondary_caption: i32,
    axis: i32,
    third_caption: i32,
}

fn third_axis_layout(plot_right: i32) -> ThirdAxisLayout {
    let axis = plot_right + AXIS_WIDTH + THIRD_AXIS_GAP;
    ThirdAxisLayout {
        secondary_caption: plot_right + AXIS_WIDTH - 10,
        axis,
        third_caption: axis + AXIS_WIDTH - 10,
    }
}

fn hours_since(origin: NaiveDateTime, t: NaiveDateTime) -> f64 {
    (t - origin).num_seconds() as f64 / 3600.0
}

/// Tick positions (hours from origin) every `tick_hours` across `[lo, hi]`.
fn tick_positions(lo: f64, hi: f64, tick_hours: u32) -> Vec<f64> {
    let step = f64::from(tick_hours.max(1));
    let mut ticks = Vec::new();
    let mut k = (lo / step).ceil();
    while k * step <= hi {
        ticks.push(k * step);
        k += 1.0;
    }
    if ticks.is_empty() {
        ticks.push(lo);
    }
    ticks
}

fn tick_label(origin: NaiveDateTime, hours: f64) -> String {
    let t = origin + Duration::seconds((hours * 3600.0).round() as i64);
    t.format("%d/%m %Hh").to_string()
}

/// Draw the multi-axis overlay: first series on the left axis, second on the
/// right, third on an extra axis offset further right.
pub fn render(
    series: &[Series<'_>],
    period: (NaiveDateTime, NaiveDateTime),
    cfg: &TimeSeriesConfig,
    style: &RenderStyle,
) -> Result<()> {
    render_png(&cfg.output, (cfg.width, cfg.height), |root| {
        let family = style.font_family.as_str();
        let background = color_or_black(&style.background);
        let grid = color_or_black(&style.grid_color);
        root.fill(&background)?;

        let (first, last) = period;
        let origin = axis_origin(first, cfg.tick_hours);
        let x_lo = hours_since(origin, first);
        let mut x_hi = hours_since(origin, last);
        if x_hi <= x_lo {
            x_hi = x_lo + 1.0;
        }
        let ticks = tick_positions(x_lo, x_hi, cfg.tick_hours);

        let ranges: Vec<_> = series.iter().map(Series::value_range).collect();
        let primary_y = ranges.first().cloned().unwrap_or(0.0..1.0);
        let secondary_y = ranges.get(1).cloned().unwrap_or_else(|| primary_y.clone());
        let right_area: i32 = match series.len() {
            0 | 1 => 20,
            2 => AXIS_WIDTH,
            _ => AXIS_WIDTH * 2 + THIRD_AXIS_GAP * 2,
        };

        // Leave room at the bottom for the period annotation.
        let body = root.margin(0, style.annotation_size as i32 * 3, 0, 0);
        let mut chart = ChartBuilder::on(&body)
            .margin(style.margin as i32)
            .x_label_area_size(style.tick_label_size as i32 * 3)
            .y_label_area_size(AXIS_WIDTH)
            .right_y_label_area_size(right_area)
            .build_cartesian_2d(x_lo..x_hi, primary_y.clone())?
            .set_secondary_coord(x_lo..x_hi, secondary_y.clone());

        // The x axis is drawn by hand below so ticks land on whole intervals.
        let primary_color = series.first().map_or(BLACK, |s| s.color);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_x_axis()
            .x_desc(cfg.x_label.as_str())
            .y_desc(series.first().map_or("", |s| s.spec.axis_label.as_str()))
            .y_label_style(font(family, style.tick_label_size).color(&primary_color))
            .axis_desc_style(bold(family, style.axis_label_size))
            .light_line_style(grid.mix(style.grid_alpha).stroke_width(1))
            .bold_line_style(grid.mix((style.grid_alpha * 2.0).min(1.0)).stroke_width(1))
            .draw()?;

        let (px, py) = chart.plotting_area().get_pixel_range();
        let axis_style = BLACK.stroke_width(1);
        let tick_grid = grid.mix((style.grid_alpha * 2.0).min(1.0)).stroke_width(1);
        let tick_font = font(family, style.tick_label_size)
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Top));
        root.draw(&PathElement::new(vec![(px.start, py.end), (px.end, py.end)], axis_style))?;
        for &tick in &ticks {
            let (x, _) = chart.backend_coord(&(tick, primary_y.start));
            root.draw(&PathElement::new(vec![(x, py.start), (x, py.end)], tick_grid))?;
            root.draw(&PathElement::new(vec![(x, py.end), (x, py.end + 5)], axis_style))?;
            root.draw(&Text::new(tick_label(origin, tick), (x, py.end + 8), tick_font.clone()))?;
        }

        if let Some(second) = series.get(1) {
            let mut secondary = chart.configure_secondary_axes();
            secondary
                .label_style(font(family, style.tick_label_size).color(&second.color))
                .axis_desc_style(bold(family, style.axis_label_size));
            // With a third axis the caption must stay inside the first band.
            if series.len() < 3 {
                secondary.y_desc(second.spec.axis_label.as_str());
            }
            secondary.draw()?;
        }

        let to_x = |t: NaiveDateTime| hours_since(origin, t);

        for (i, s) in series.iter().enumerate() {
            let color = s.color;
            let line_style = color.stroke_width(style.line_width);
            let anno = match i {
                0 => chart.draw_series(LineSeries::new(
                    s.points.iter().map(|&(t, v)| (to_x(t), v)),
                    line_style,
                ))?,
                1 => chart.draw_secondary_series(LineSeries::new(
                    s.points.iter().map(|&(t, v)| (to_x(t), v)),
                    line_style,
                ))?,
                _ => {
                    // Rescale onto the secondary axis; its own axis is drawn below.
                    let own = &ranges[i];
                    let scale = (secondary_y.end - secondary_y.start) / (own.end - own.start);
                    let lo = secondary_y.start;
                    let own_lo = own.start;
                    chart.draw_secondary_series(LineSeries::new(
                        s.points
                            .iter()
                            .map(move |&(t, v)| (to_x(t), lo + (v - own_lo) * scale)),
                        line_style,
                    ))?
                }
            };
            anno.label(s.spec.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], color.stroke_width(3)));
        }

        if let (Some(second), Some(third)) = (series.get(1), series.get(2)) {
            let band = third_axis_layout(px.end);
            let mid_y = (py.start + py.end) / 2;
            let caption = |text: &str, x: i32, color: &RGBColor| {
                Text::new(
                    text.to_string(),
                    (x, mid_y),
                    bold(family, style.axis_label_size)
                        .transform(FontTransform::Rotate90)
                        .color(color)
                        .pos(Pos::new(HPos::Center, VPos::Center)),
                )
            };
            root.draw(&caption(&second.spec.axis_label, band.secondary_caption, &second.color))?;

            let own = &ranges[2];
            let third_style = third.color.stroke_width(1);
            root.draw(&PathElement::new(
                vec![(band.axis, py.start), (band.axis, py.end)],
                third_style,
            ))?;
            let label_font = font(family, style.tick_label_size)
                .color(&third.color)
                .pos(Pos::new(HPos::Left, VPos::Center));
            for k in 0..THIRD_AXIS_TICKS {
                let frac = k as f64 / (THIRD_AXIS_TICKS - 1) as f64;
                let value = own.start + frac * (own.end - own.start);
                let y = py.end - (frac * f64::from(py.end - py.start)).round() as i32;
                root.draw(&PathElement::new(vec![(band.axis, y), (band.axis + 6, y)], third_style))?;
                root.draw(&Text::new(format!("{value:.1}"), (band.axis + 10, y), label_font.clone()))?;
            }
            root.draw(&caption(&third.spec.axis_label, band.third_caption, &third.color))?;
        }

        // Legend title sits above the legend box.
        root.draw(&Text::new(
            cfg.legend_title.clone(),
            (px.start + 12, py.start + 8),
            bold(family, style.legend_size),
        ))?;
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::Coordinate(10, style.legend_size as i32 + 16))
            .label_font(font(family, style.legend_size))
            .background_style(WHITE.mix(0.95).filled())
            .border_style(BLACK.mix(0.5).stroke_width(1))
            .draw()?;

        let (w, h) = root.dim_in_pixel();
        let period_text = format!(
            "Período: {} a {}",
            first.format("%d/%m/%Y"),
            last.format("%d/%m/%Y")
        );
        root.draw(&Text::new(
            period_text,
            (w as i32 / 2, h as i32 - style.annotation_size as i32),
            font(family, style.annotation_size)
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Bottom)),
        ))?;

        root.present()?;
        Ok(())
    })
}
