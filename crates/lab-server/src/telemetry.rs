use thiserror::Error;
use tracing_subscriber::{filter::ParseError, EnvFilter};

use crate::config::LogFormat;

const LOG_FILTER_ENV: &str = "LAB_LOG";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("LAB_LOG is not a valid log filter: {0}")]
    InvalidFilter(#[from] ParseError),
}

pub fn init_tracing(format: LogFormat) -> Result<(), TelemetryError> {
    let filter = std::env::var(LOG_FILTER_ENV).unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_owned());
    let env_filter = EnvFilter::try_new(filter)?;

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(env_filter).init(),
    }
    Ok(())
}
