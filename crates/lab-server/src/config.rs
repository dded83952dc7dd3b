use std::{
    env,
    net::{AddrParseError, SocketAddr},
};

use core_sim::{
    config::{DEFAULT_DURATION_MONTHS, DEFAULT_MAX_DRAWDOWN_PCT},
    MarketRegime, SimConfig, DEFAULT_SEED,
};
use thiserror::Error;

const DEFAULT_LISTEN_PORT: u16 = 8080;
const DEFAULT_MODE: RunMode = RunMode::Serve;
const DEFAULT_REPLAY_OUTPUT_PATH: &str = "artifacts/replay.csv";
const DEFAULT_LOG_FORMAT: LogFormat = LogFormat::Text;
const DEFAULT_REGIME: MarketRegime = MarketRegime::StableGrowth;
const DEFAULT_ALLOW_MARGIN: bool = false;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Serve,
    Headless,
}

impl RunMode {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "serve" => Some(Self::Serve),
            "headless" => Some(Self::Headless),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub mode: RunMode,
    pub replay_output_path: String,
    pub log_format: LogFormat,
    pub seed: u64,
    pub sim: SimConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("LAB_SERVER_ADDR is not a valid socket address: {0}")]
    InvalidListenAddr(#[source] AddrParseError),
    #[error("LAB_SERVER_MODE must be one of: serve, headless")]
    InvalidMode,
    #[error("LAB_SERVER_REPLAY_OUTPUT must not be empty or whitespace")]
    InvalidReplayOutputPath,
    #[error("LAB_LOG_FORMAT must be one of: text, json")]
    InvalidLogFormat,
    #[error("LAB_SIM_SEED must be a non-negative integer")]
    InvalidSeed,
    #[error(
        "LAB_SIM_REGIME must be one of: stable-growth, stagflation, liquidity-crunch, global-shock, custom"
    )]
    InvalidRegime,
    #[error("LAB_SIM_DURATION_MONTHS must be an integer")]
    InvalidDurationMonths,
    #[error("LAB_SIM_MAX_DRAWDOWN_PCT must be a finite percentage between 0 and 100")]
    InvalidMaxDrawdownPct,
    #[error("LAB_SIM_ALLOW_MARGIN must be true or false")]
    InvalidAllowMargin,
    #[error(transparent)]
    Sim(#[from] core_sim::ConfigError),
    #[error("{key} contains non-unicode data")]
    NonUnicode { key: &'static str },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key))
    }

    /// Builds the configuration from any variable source shaped like
    /// `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Result<String, env::VarError>,
    {
        let read_env = |key: &'static str| read_var(&lookup, key);

        let listen_addr = match read_env("LAB_SERVER_ADDR")? {
            Some(value) => value.parse().map_err(ConfigError::InvalidListenAddr)?,
            None => SocketAddr::from(([0, 0, 0, 0], DEFAULT_LISTEN_PORT)),
        };

        let mode = match read_env("LAB_SERVER_MODE")? {
            Some(value) => RunMode::parse(value.as_str()).ok_or(ConfigError::InvalidMode)?,
            None => DEFAULT_MODE,
        };

        let replay_output_path = match read_env("LAB_SERVER_REPLAY_OUTPUT")? {
            Some(value) => {
                if value.trim().is_empty() {
                    return Err(ConfigError::InvalidReplayOutputPath);
                }
                value
            }
            None => DEFAULT_REPLAY_OUTPUT_PATH.to_owned(),
        };

        let log_format = match read_env("LAB_LOG_FORMAT")? {
            Some(value) => LogFormat::parse(value.as_str()).ok_or(ConfigError::InvalidLogFormat)?,
            None => DEFAULT_LOG_FORMAT,
        };

        let seed = match read_env("LAB_SIM_SEED")? {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidSeed)?,
            None => DEFAULT_SEED,
        };

        let regime = match read_env("LAB_SIM_REGIME")? {
            Some(value) => {
                MarketRegime::parse(value.trim()).ok_or(ConfigError::InvalidRegime)?
            }
            None => DEFAULT_REGIME,
        };

        let duration_months = match read_env("LAB_SIM_DURATION_MONTHS")? {
            Some(value) => value
                .trim()
                .parse::<i64>()
                .map_err(|_| ConfigError::InvalidDurationMonths)?,
            None => i64::from(DEFAULT_DURATION_MONTHS),
        };

        let max_drawdown_pct = match read_env("LAB_SIM_MAX_DRAWDOWN_PCT")? {
            Some(value) => parse_percentage(value.as_str())
                .ok_or(ConfigError::InvalidMaxDrawdownPct)?,
            None => DEFAULT_MAX_DRAWDOWN_PCT,
        };

        let allow_margin = match read_env("LAB_SIM_ALLOW_MARGIN")? {
            Some(value) => parse_bool(value.as_str()).ok_or(ConfigError::InvalidAllowMargin)?,
            None => DEFAULT_ALLOW_MARGIN,
        };

        let sim = SimConfig::new(regime, duration_months, max_drawdown_pct, allow_margin)?;

        Ok(Self {
            listen_addr,
            mode,
            replay_output_path,
            log_format,
            seed,
            sim,
        })
    }
}

fn read_var<F>(lookup: &F, key: &'static str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&'static str) -> Result<String, env::VarError>,
{
    match lookup(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NonUnicode { key }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_percentage(value: &str) -> Option<f64> {
    let parsed = value.trim().parse::<f64>().ok()?;
    if !parsed.is_finite() || parsed <= 0.0 || parsed > 100.0 {
        return None;
    }
    Some(parsed)
}
