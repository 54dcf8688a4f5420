use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use csv::{QuoteStyle, WriterBuilder};

const STATION: &str = "Estacao_Lagoa";
const INTERVAL_MINUTES: i64 = 15;
const DAYS: i64 = 6;
/// Roughly one cell in this many is written as `NAN`.
const MISSING_ONE_IN: u64 = 97;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn cell(&mut self, value: f64) -> String {
        if self.next_u64() % MISSING_ONE_IN == 0 {
            "NAN".to_string()
        } else {
            format!("{value:.3}")
        }
    }
}

/// Wind with a daily sea-breeze cycle; the water level follows the
/// north-south component with a small lag and noise.
struct Weather {
    uy: f64,
    level: f64,
}

impl Weather {
    fn step(&mut self, hour_of_day: f64, rng: &mut SimpleRng) -> (f64, f64, f64) {
        let breeze = (2.0 * std::f64::consts::PI * (hour_of_day - 14.0) / 24.0).cos();
        self.uy = 0.8 * self.uy + 0.2 * (2.5 * breeze + rng.gauss(0.0, 0.6));
        let speed = (self.uy.abs() * 1.3 + rng.gauss(1.0, 0.3)).max(0.0);
        self.level = 0.9 * self.level + 0.1 * (120.0 - 4.0 * self.uy) + rng.gauss(0.0, 0.4);
        (self.level, speed, self.uy)
    }
}

fn main() -> Result<()> {
    let output = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("9_09_23.dat"));

    let mut rng = SimpleRng::new(42);
    let mut weather = Weather { uy: 0.0, level: 120.0 };

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .flexible(true)
        .from_path(&output)
        .with_context(|| format!("creating {}", output.display()))?;

    // Header block: station info, names, units, processing.
    writer.write_record(["TOA5", STATION, "CR1000", "12345", "CR1000.Std.32", "CPU:lagoa.CR1", "Tabela15min"])?;
    writer.write_record(["TIMESTAMP", "RECORD", "Nivel_Avg", "Vel_1m_Avg", "Uy_Avg"])?;
    writer.write_record(["TS", "RN", "cm", "meters/second", "meters/second"])?;
    writer.write_record(["", "", "Avg", "Avg", "Avg"])?;

    let start = NaiveDate::from_ymd_opt(2023, 8, 6)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid start date")?;
    let records = DAYS * 24 * 60 / INTERVAL_MINUTES;

    for record in 0..records {
        let ts = start + Duration::minutes(record * INTERVAL_MINUTES);
        let hour_of_day = (record * INTERVAL_MINUTES % (24 * 60)) as f64 / 60.0;
        let (level, speed, uy) = weather.step(hour_of_day, &mut rng);
        let row = [
            ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.to_string(),
            rng.cell(level),
            rng.cell(speed),
            rng.cell(uy),
        ];
        writer.write_record(&row)?;
    }
    writer.flush()?;

    println!(
        "Wrote {records} records ({INTERVAL_MINUTES}-minute interval) to {}",
        output.display()
    );
    Ok(())
}
