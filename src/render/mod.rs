/// Chart rendering: plotters draws into an RGB buffer, `image` writes the PNG.
pub mod regression;
pub mod timeseries;

use std::ops::Range;
use std::path::Path;

use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle};

use crate::color::parse_hex;
use crate::error::{PipelineError, Result};

/// The output file must be creatable: its parent directory has to exist and
/// the path itself must not be a directory.
pub fn ensure_writable(path: &Path) -> Result<()> {
    let fail = |reason: &str| PipelineError::RenderWrite {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };
    if path.as_os_str().is_empty() {
        return Err(fail("output path is empty"));
    }
    if path.is_dir() {
        return Err(fail("output path is a directory"));
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(fail("output directory does not exist"))
        }
        _ => Ok(()),
    }
}

/// Draw with `draw` onto a `width` x `height` canvas and save it as PNG.
///
/// The path is checked before any drawing happens.
pub fn render_png<F>(path: &Path, (width, height): (u32, u32), draw: F) -> Result<()>
where
    F: FnOnce(DrawingArea<BitMapBackend<'_>, Shift>) -> anyhow::Result<()>,
{
    ensure_writable(path)?;

    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw(root).map_err(|e| PipelineError::Render(format!("{e:#}")))?;
    }

    let image = image::RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        PipelineError::Render("pixel buffer does not match image size".to_string())
    })?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| PipelineError::RenderWrite {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    info!("chart written to {} ({width}x{height})", path.display());
    Ok(())
}

/// Hex colour from validated configuration, black if it somehow fails.
pub(crate) fn color_or_black(hex: &str) -> RGBColor {
    parse_hex(hex).unwrap_or(BLACK)
}

pub(crate) fn font(family: &str, size: u32) -> FontDesc<'_> {
    FontDesc::new(FontFamily::from(family), f64::from(size), FontStyle::Normal)
}

pub(crate) fn bold(family: &str, size: u32) -> FontDesc<'_> {
    FontDesc::new(FontFamily::from(family), f64::from(size), FontStyle::Bold)
}

/// Axis range covering `values` with 10 % head-room on each side.
pub fn padded_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() {
        return 0.0..1.0;
    }
    let span = max - min;
    let pad = if span > 0.0 {
        span * 0.1
    } else {
        (max.abs() * 0.1).max(1.0)
    };
    (min - pad)..(max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_range() {
        let r = padded_range([2.0, 4.0, 12.0]);
        assert!((r.start - 1.0).abs() < 1e-12);
        assert!((r.end - 13.0).abs() < 1e-12);

        // Negative values stay inside the range.
        let r = padded_range([-3.0, -1.0]);
        assert!(r.start < -3.0 && r.end > -1.0);

        assert_eq!(padded_range([5.0]), 4.0..6.0);
        assert_eq!(padded_range(Vec::<f64>::new()), 0.0..1.0);
        assert_eq!(padded_range([f64::NAN, 1.0]), 0.0..2.0);
    }

    #[test]
    fn test_missing_directory_is_write_error() {
        let path = std::env::temp_dir()
            .join("logger-charts-no-such-dir")
            .join("chart.png");
        let err = ensure_writable(&path).unwrap_err();
        assert!(matches!(err, PipelineError::RenderWrite { .. }));
    }

    #[test]
    fn test_directory_target_is_write_error() {
        let err = ensure_writable(&std::env::temp_dir()).unwrap_err();
        assert!(matches!(err, PipelineError::RenderWrite { .. }));
    }

    #[test]
    fn test_bare_file_name_is_writable() {
        ensure_writable(Path::new("chart.png")).unwrap();
    }

    #[test]
    fn test_render_png_checks_path_before_drawing() {
        let path = Path::new("/definitely/not/a/dir/chart.png");
        let mut drawn = false;
        let err = render_png(path, (10, 10), |_| {
            drawn = true;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, PipelineError::RenderWrite { .. }));
        assert!(!drawn);
    }
}
