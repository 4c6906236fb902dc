//! api-updates-demo: replay the reference library's test program
//!
//! Calls every exported entry point as an old binary and as a recompiled
//! binary would, then prints what the callees observed.
//!
//! ## Configuration
//! - `--config <path>` / API_UPDATES_CONFIG: YAML configuration file
//! - API_UPDATES__BASELINE_MANIFEST: published manifest to check against
//! - API_UPDATES__DEMO__NAME, API_UPDATES__DEMO__INTERNAL_VALUE, ...: demo inputs
//! - API_UPDATES_LOG: tracing filter (default `info`)

use std::process::ExitCode;

use api_updates::config::{config_base_dir, Config};
use api_updates::demo;
use tracing::{error, info};

fn main() -> ExitCode {
    api_updates::utils::bootstrap::init_tracing();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let config_path = api_updates::utils::bootstrap::parse_config_path();
    let config = Config::load(config_path.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Starting api-updates-demo");

    let outcome = demo::run(&config.demo)?;
    for observation in &outcome.observations {
        println!("{:?}", observation);
    }
    println!("{}", outcome.greeting);
    println!("bar() = {}", outcome.bar);
    println!("combine({}, {}) = {}", config.demo.some_class_a, config.demo.some_class_b, outcome.combined);
    println!(
        "internal value: {} (direct), {} (wrapped)",
        outcome.internal_direct, outcome.internal_wrapped
    );

    match demo::check_configured(&config, &config_base_dir())? {
        Some(report) => {
            println!("{}", report.summary());
            Ok(report.is_compatible())
        }
        None => Ok(true),
    }
}
