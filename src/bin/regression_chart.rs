use std::process::ExitCode;

use log::debug;
use logger_charts::{describe_failure, run_regression, AppConfig, RunOutcome};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::discover() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    let cfg = &config.regression;

    match run_regression(&config.input, cfg, &config.style) {
        Ok(RunOutcome::Rendered(report)) => {
            if let Ok(json) = serde_json::to_string(&report) {
                debug!("run report: {json}");
            }
            println!("Regression of {} on {} for {}", cfg.y_column, cfg.x_column, cfg.day);
            if let Some(fit) = &report.fit {
                println!("{}", fit.equation_label());
                println!(
                    "r = {:.4}, std err = {:.4}, n = {}",
                    fit.r_value, fit.std_err, fit.n
                );
            }
            println!("Chart saved to {}", report.output.display());
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
