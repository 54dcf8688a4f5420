use std::process::ExitCode;

use log::debug;
use logger_charts::{describe_failure, run_timeseries, AppConfig, RunOutcome};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::discover() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match run_timeseries(&config.input, &config.timeseries, &config.style) {
        Ok(RunOutcome::Rendered(report)) => {
            if let Ok(json) = serde_json::to_string(&report) {
                debug!("run report: {json}");
            }
            println!(
                "Chart saved to {} ({} rows, {} to {})",
                report.output.display(),
                report.rows,
                report.first.format("%d/%m/%Y %H:%M"),
                report.last.format("%d/%m/%Y %H:%M"),
            );
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::NoData { range }) => {
            println!("No data in {range}; no chart written.");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", describe_failure(&err));
            ExitCode::FAILURE
        }
    }
}
