use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::market::MarketRegime;

pub const MIN_DURATION_MONTHS: u32 = 12;
pub const MAX_DURATION_MONTHS: u32 = 360;
pub const DEFAULT_DURATION_MONTHS: u32 = 120;
pub const DEFAULT_MAX_DRAWDOWN_PCT: f64 = 20.0;
pub const CASH_ACCOUNT_MAX_LEVERAGE: f64 = 1.0;
pub const MARGIN_ACCOUNT_MAX_LEVERAGE: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("max drawdown must be a finite percentage in (0, 100], got {0}")]
    InvalidMaxDrawdownPct(f64),
    #[error("min cash buffer must be a finite fraction in [0, 1], got {0}")]
    InvalidMinCashBuffer(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub regime: MarketRegime,
    pub duration_months: u32,
    /// Fraction, e.g. `0.20` for a 20% stop.
    pub max_drawdown_limit: f64,
    pub max_leverage: f64,
    pub min_cash_buffer: f64,
    pub auto_rebalance: bool,
    pub allow_margin: bool,
}

impl SimConfig {
    /// Duration is clamped into `[12, 360]`; the drawdown limit is given in
    /// percent and must lie in `(0, 100]`.
    pub fn new(
        regime: MarketRegime,
        duration_months: i64,
        max_drawdown_pct: f64,
        allow_margin: bool,
    ) -> Result<Self, ConfigError> {
        if !max_drawdown_pct.is_finite() || max_drawdown_pct <= 0.0 || max_drawdown_pct > 100.0 {
            return Err(ConfigError::InvalidMaxDrawdownPct(max_drawdown_pct));
        }

        Ok(Self {
            regime,
            duration_months: clamp_duration(duration_months),
            max_drawdown_limit: max_drawdown_pct / 100.0,
            max_leverage: leverage_cap(allow_margin),
            min_cash_buffer: 0.0,
            auto_rebalance: false,
            allow_margin,
        })
    }

    pub fn with_min_cash_buffer(mut self, min_cash_buffer: f64) -> Result<Self, ConfigError> {
        if !min_cash_buffer.is_finite() || !(0.0..=1.0).contains(&min_cash_buffer) {
            return Err(ConfigError::InvalidMinCashBuffer(min_cash_buffer));
        }
        self.min_cash_buffer = min_cash_buffer;
        Ok(self)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            regime: MarketRegime::StableGrowth,
            duration_months: DEFAULT_DURATION_MONTHS,
            max_drawdown_limit: DEFAULT_MAX_DRAWDOWN_PCT / 100.0,
            max_leverage: CASH_ACCOUNT_MAX_LEVERAGE,
            min_cash_buffer: 0.0,
            auto_rebalance: false,
            allow_margin: false,
        }
    }
}

pub fn clamp_duration(months: i64) -> u32 {
    months.clamp(MIN_DURATION_MONTHS as i64, MAX_DURATION_MONTHS as i64) as u32
}

pub fn leverage_cap(allow_margin: bool) -> f64 {
    if allow_margin {
        MARGIN_ACCOUNT_MAX_LEVERAGE
    } else {
        CASH_ACCOUNT_MAX_LEVERAGE
    }
}

#[cfg(test)]
mod tests {
    use crate::market::MarketRegime;

    use super::{clamp_duration, ConfigError, SimConfig};

    #[test]
    fn defaults_match_wizard_fallbacks() {
        let config = SimConfig::default();

        assert_eq!(config.regime, MarketRegime::StableGrowth);
        assert_eq!(config.duration_months, 120);
        assert_eq!(config.max_drawdown_limit, 0.2);
        assert_eq!(config.max_leverage, 1.0);
        assert!(!config.allow_margin);
    }

    #[test]
    fn duration_is_clamped_into_bounds() {
        assert_eq!(clamp_duration(1), 12);
        assert_eq!(clamp_duration(-40), 12);
        assert_eq!(clamp_duration(60), 60);
        assert_eq!(clamp_duration(1_000), 360);
    }

    #[test]
    fn margin_flag_sets_leverage_cap() {
        let cash = SimConfig::new(MarketRegime::Stagflation, 24, 15.0, false).unwrap();
        let margin = SimConfig::new(MarketRegime::Stagflation, 24, 15.0, true).unwrap();

        assert_eq!(cash.max_leverage, 1.0);
        assert_eq!(margin.max_leverage, 1.5);
        assert_eq!(margin.max_drawdown_limit, 0.15);
    }

    #[test]
    fn rejects_out_of_range_drawdown() {
        for pct in [0.0, -5.0, 100.5, f64::NAN, f64::INFINITY] {
            let err = SimConfig::new(MarketRegime::StableGrowth, 12, pct, false).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidMaxDrawdownPct(_)));
        }
    }

    #[test]
    fn min_cash_buffer_must_be_a_fraction() {
        let config = SimConfig::default();

        assert_eq!(
            config.with_min_cash_buffer(0.05).unwrap().min_cash_buffer,
            0.05
        );
        assert_eq!(
            config.with_min_cash_buffer(1.5),
            Err(ConfigError::InvalidMinCashBuffer(1.5))
        );
    }
}
