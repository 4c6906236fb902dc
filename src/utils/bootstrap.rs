//! Bootstrap utilities for api-updates binaries.

use crate::config::LOG_ENV_VAR;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing with API_UPDATES_LOG environment variable.
///
/// Defaults to "info" level if API_UPDATES_LOG is not set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Parse the config file path from command line arguments.
///
/// Accepts `--config <path>` or `-c <path>`.
pub fn parse_config_path() -> Option<String> {
    parse_config_path_from(std::env::args().skip(1))
}

fn parse_config_path_from<I: IntoIterator<Item = String>>(args: I) -> Option<String> {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" || arg == "-c" {
            return args.next();
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(path.to_string());
        }
    }
    None
}
