use core_sim::{Asset, Micros};
use serde::Serialize;

use crate::error::LedgerError;
use crate::portfolio::{asset_at, Portfolio, LEVERAGE_SENTINEL};

pub const ILLIQUID_HAIRCUT_BPS: i64 = 500;

const BPS_DENOMINATOR: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LiquidationReport {
    pub positions_closed: usize,
    pub proceeds: Micros,
    pub haircut_cost: Micros,
    pub realized_pnl: Micros,
}

/// Execution price for a forced sale: the mark, less the haircut when the
/// asset is locked.
pub fn execution_price(asset: &Asset) -> Micros {
    if asset.is_illiquid {
        let kept_bps = (BPS_DENOMINATOR - ILLIQUID_HAIRCUT_BPS) as i128;
        (asset.price as i128 * kept_bps / BPS_DENOMINATOR as i128) as Micros
    } else {
        asset.price
    }
}

/// Sells every position into cash and rebuilds NAV through the identity.
///
/// Status is not touched: the risk engine has already moved the account to
/// `Liquidated`. High-water mark and drawdown are refreshed by the next
/// valuation pass.
pub fn force_liquidate(
    portfolio: &mut Portfolio,
    universe: &[Asset],
) -> Result<LiquidationReport, LedgerError> {
    let mut proceeds: Micros = 0;
    let mut marked_value: Micros = 0;
    let mut cost: Micros = 0;

    for position in &portfolio.positions {
        let asset = asset_at(universe, position.asset_index)?;
        let fill = position
            .units
            .checked_mul(execution_price(asset))
            .ok_or(LedgerError::Overflow("liquidation proceeds"))?;
        let mark = position
            .units
            .checked_mul(asset.price)
            .ok_or(LedgerError::Overflow("liquidation mark"))?;
        let basis = position
            .units
            .checked_mul(position.cost_basis)
            .ok_or(LedgerError::Overflow("liquidation cost"))?;

        proceeds = proceeds
            .checked_add(fill)
            .ok_or(LedgerError::Overflow("liquidation proceeds"))?;
        marked_value = marked_value
            .checked_add(mark)
            .ok_or(LedgerError::Overflow("liquidation mark"))?;
        cost = cost
            .checked_add(basis)
            .ok_or(LedgerError::Overflow("liquidation cost"))?;
    }

    let cash_balance = portfolio
        .cash_balance
        .checked_add(proceeds)
        .ok_or(LedgerError::Overflow("cash balance"))?;

    let positions_closed = portfolio.positions.len();
    portfolio.cash_balance = cash_balance;
    portfolio.positions.clear();
    portfolio.total_asset_value = 0;
    portfolio.nav = portfolio.identity_nav()?;
    portfolio.leverage_ratio = if portfolio.nav > 0 {
        0.0
    } else {
        LEVERAGE_SENTINEL
    };

    let report = LiquidationReport {
        positions_closed,
        proceeds,
        haircut_cost: marked_value - proceeds,
        realized_pnl: proceeds - cost,
    };
    tracing::warn!(
        positions_closed,
        proceeds,
        haircut_cost = report.haircut_cost,
        "positions force-liquidated"
    );

    Ok(report)
}
