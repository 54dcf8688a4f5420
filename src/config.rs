//! Run configuration.
//!
//! Everything the two charts need is passed explicitly through these
//! structs; there is no global style state. Values come from a JSON file
//! (partial files are fine, missing keys fall back to the defaults below).

use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Context, Result};
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

use crate::color::parse_hex;
use crate::data::filter::DateRange;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "LOGGER_CHARTS_CONFIG";

/// Config file picked up from the working directory when the env var is unset.
pub const DEFAULT_CONFIG_FILE: &str = "logger-charts.json";

/// The time-series chart draws at most this many y-axes.
pub const MAX_SERIES: usize = 3;

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logger file to read.
    pub input: PathBuf,
    pub style: RenderStyle,
    pub timeseries: TimeSeriesConfig,
    pub regression: RegressionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("9_09_23.dat"),
            style: RenderStyle::default(),
            timeseries: TimeSeriesConfig::default(),
            regression: RegressionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        info!("configuration loaded from {}", path.display());
        Ok(config)
    }

    /// `$LOGGER_CHARTS_CONFIG`, else `./logger-charts.json`, else defaults.
    pub fn discover() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            return Self::load(local);
        }
        info!("no config file found, using built-in defaults");
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        self.style.validate()?;
        self.timeseries.validate()?;
        self.regression.validate()?;
        Ok(())
    }
}

fn check_color(field: &str, hex: &str) -> Result<()> {
    if parse_hex(hex).is_none() {
        bail!("{field}: '{hex}' is not a hex colour");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------------

/// Shared look of both charts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    pub font_family: String,
    pub title_size: u32,
    pub axis_label_size: u32,
    pub tick_label_size: u32,
    pub legend_size: u32,
    pub annotation_size: u32,
    pub background: String,
    pub grid_color: String,
    /// Opacity of grid lines, 0.0 – 1.0.
    pub grid_alpha: f64,
    pub line_width: u32,
    pub margin: u32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".into(),
            title_size: 32,
            axis_label_size: 28,
            tick_label_size: 22,
            legend_size: 22,
            annotation_size: 18,
            background: "#ffffff".into(),
            grid_color: "#bbbbbb".into(),
            grid_alpha: 0.15,
            line_width: 2,
            margin: 30,
        }
    }
}

impl RenderStyle {
    fn validate(&self) -> Result<()> {
        check_color("style.background", &self.background)?;
        check_color("style.grid_color", &self.grid_color)?;
        ensure!(
            (0.0..=1.0).contains(&self.grid_alpha),
            "style.grid_alpha must be within 0..=1"
        );
        ensure!(self.line_width > 0, "style.line_width must be positive");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Time-series chart
// ---------------------------------------------------------------------------

/// One plotted column and its axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub column: String,
    /// Legend entry.
    pub label: String,
    /// Y-axis caption.
    pub axis_label: String,
    /// Hex colour; generated when absent.
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSeriesConfig {
    pub output: PathBuf,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub series: Vec<SeriesSpec>,
    pub x_label: String,
    pub legend_title: String,
    /// Hours between x-axis ticks.
    pub tick_hours: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for TimeSeriesConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("grafico_nivel_vento.png"),
            start: NaiveDate::from_ymd_opt(2023, 8, 7).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2023, 8, 10).unwrap_or_default(),
            series: vec![
                SeriesSpec {
                    column: "Nivel_Avg".into(),
                    label: "Nível da Água (cm)".into(),
                    axis_label: "Nível (cm)".into(),
                    color: Some("#1f77b4".into()),
                },
                SeriesSpec {
                    column: "Vel_1m_Avg".into(),
                    label: "Velocidade do Vento (m/s)".into(),
                    axis_label: "Velocidade do Vento (m/s)".into(),
                    color: Some("#ff6600".into()),
                },
                SeriesSpec {
                    column: "Uy_Avg".into(),
                    label: "Componente V (m/s)".into(),
                    axis_label: "Componente V (m/s)".into(),
                    color: Some("#339966".into()),
                },
            ],
            x_label: "Data".into(),
            legend_title: "Variáveis Monitoradas".into(),
            tick_hours: 6,
            width: 2880,
            height: 1080,
        }
    }
}

impl TimeSeriesConfig {
    /// `None` when `start` is after `end`.
    pub fn range(&self) -> Option<DateRange> {
        DateRange::new(self.start, self.end)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.range().is_some(),
            "timeseries.start ({}) is after timeseries.end ({})",
            self.start,
            self.end
        );
        ensure!(
            (1..=MAX_SERIES).contains(&self.series.len()),
            "timeseries.series must list 1 to {MAX_SERIES} columns, got {}",
            self.series.len()
        );
        for spec in &self.series {
            if let Some(hex) = &spec.color {
                check_color(&format!("series '{}'", spec.column), hex)?;
            }
        }
        ensure!(self.tick_hours > 0, "timeseries.tick_hours must be positive");
        ensure!(
            self.width > 0 && self.height > 0,
            "timeseries image size must be positive"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Regression chart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    pub output: PathBuf,
    /// Single calendar day to analyse.
    pub day: NaiveDate,
    pub x_column: String,
    pub y_column: String,
    pub x_label: String,
    pub y_label: String,
    pub title: String,
    pub point_label: String,
    pub line_label: String,
    pub point_color: String,
    pub line_color: String,
    pub width: u32,
    pub height: u32,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("regressao_nivel_vento.png"),
            day: NaiveDate::from_ymd_opt(2023, 8, 7).unwrap_or_default(),
            x_column: "Uy_Avg".into(),
            y_column: "Nivel_Avg".into(),
            x_label: "Componente Uy do Vento (m/s)".into(),
            y_label: "Nível da Água (cm)".into(),
            title: "Relação entre Componente Uy do Vento e Nível da Água".into(),
            point_label: "Dados observados".into(),
            line_label: "Regressão Linear".into(),
            point_color: "#1f77b4".into(),
            line_color: "#d62728".into(),
            width: 1440,
            height: 960,
        }
    }
}

impl RegressionConfig {
    pub fn range(&self) -> DateRange {
        DateRange::single_day(self.day)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.x_column != self.y_column,
            "regression.x_column and regression.y_column must differ"
        );
        check_color("regression.point_color", &self.point_color)?;
        check_color("regression.line_color", &self.line_color)?;
        ensure!(
            self.width > 0 && self.height > 0,
            "regression image size must be positive"
        );
        Ok(())
    }
}
