use core_sim::SimConfig;
use serde::Serialize;

use crate::portfolio::{AccountStatus, Portfolio};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSignal {
    DrawdownBreached,
    LeverageBreached,
    LeverageWithinLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusTransition {
    pub from: AccountStatus,
    pub to: AccountStatus,
    pub signal: RiskSignal,
}

pub fn classify(portfolio: &Portfolio, config: &SimConfig) -> RiskSignal {
    if portfolio.current_drawdown < -config.max_drawdown_limit {
        RiskSignal::DrawdownBreached
    } else if portfolio.leverage_ratio > config.max_leverage {
        RiskSignal::LeverageBreached
    } else {
        RiskSignal::LeverageWithinLimit
    }
}

/// The full transition table.
///
/// `Insolvent` absorbs every signal. A margin call that clears drops to
/// `Warning`, never straight back to `Active`, and nothing leads out of
/// `Warning` on its own.
pub fn next_status(current: AccountStatus, signal: RiskSignal) -> AccountStatus {
    use AccountStatus::*;
    use RiskSignal::*;

    match (current, signal) {
        (Insolvent, _) => Insolvent,
        (_, DrawdownBreached) => Liquidated,
        (_, LeverageBreached) => MarginCall,
        (MarginCall, LeverageWithinLimit) => Warning,
        (Active, LeverageWithinLimit) => Active,
        (Warning, LeverageWithinLimit) => Warning,
        (Liquidated, LeverageWithinLimit) => Liquidated,
    }
}

/// Applies one evaluation to `portfolio.status` and reports the change, if
/// any. Must run only after a successful audit of the same tick.
pub fn check_constraints(
    portfolio: &mut Portfolio,
    config: &SimConfig,
) -> Option<StatusTransition> {
    if portfolio.status == AccountStatus::Insolvent {
        return None;
    }

    let signal = classify(portfolio, config);
    let from = portfolio.status;
    let to = next_status(from, signal);
    if from == to {
        return None;
    }

    portfolio.status = to;
    match to {
        AccountStatus::Liquidated => tracing::warn!(
            drawdown = portfolio.current_drawdown,
            limit = config.max_drawdown_limit,
            "drawdown stop breached, account liquidated"
        ),
        _ => tracing::debug!(
            from = from.as_str(),
            to = to.as_str(),
            leverage = portfolio.leverage_ratio,
            "account status changed"
        ),
    }

    Some(StatusTransition { from, to, signal })
}
