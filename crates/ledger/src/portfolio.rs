use core_sim::{Asset, Micros};
use serde::Serialize;

use crate::error::LedgerError;

pub const LEVERAGE_SENTINEL: f64 = 999.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Warning,
    MarginCall,
    Liquidated,
    Insolvent,
}

impl AccountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Warning => "warning",
            Self::MarginCall => "margin_call",
            Self::Liquidated => "liquidated",
            Self::Insolvent => "insolvent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub asset_index: usize,
    pub units: i64,
    pub cost_basis: Micros,
    pub current_val: Micros,
    pub pnl_unrealized: Micros,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Portfolio {
    pub cash_balance: Micros,
    pub total_asset_value: Micros,
    pub total_liabilities: Micros,
    pub nav: Micros,
    pub positions: Vec<Position>,
    pub high_water_mark: Micros,
    pub current_drawdown: f64,
    pub leverage_ratio: f64,
    pub status: AccountStatus,
    pub months_underwater: u32,
}

impl Portfolio {
    pub fn new(initial_capital: Micros) -> Self {
        Self {
            cash_balance: initial_capital,
            total_asset_value: 0,
            total_liabilities: 0,
            nav: initial_capital,
            positions: Vec::new(),
            high_water_mark: initial_capital,
            current_drawdown: 0.0,
            leverage_ratio: 0.0,
            status: AccountStatus::Active,
            months_underwater: 0,
        }
    }

    /// Buys `units` of `universe[asset_index]` at its current price.
    ///
    /// Cash moves into `total_asset_value` at cost, so NAV is unchanged and the
    /// accounting identity holds before the first valuation pass.
    pub fn open_position(
        &mut self,
        universe: &[Asset],
        asset_index: usize,
        units: i64,
    ) -> Result<&Position, LedgerError> {
        if units <= 0 {
            return Err(LedgerError::NonPositiveUnits(units));
        }
        let asset = asset_at(universe, asset_index)?;
        let cost = units
            .checked_mul(asset.price)
            .ok_or(LedgerError::Overflow("purchase cost"))?;
        if cost > self.cash_balance {
            return Err(LedgerError::InsufficientCash {
                required: cost,
                available: self.cash_balance,
            });
        }

        self.cash_balance -= cost;
        self.total_asset_value = self
            .total_asset_value
            .checked_add(cost)
            .ok_or(LedgerError::Overflow("total asset value"))?;
        self.positions.push(Position {
            asset_index,
            units,
            cost_basis: asset.price,
            current_val: cost,
            pnl_unrealized: 0,
        });

        Ok(&self.positions[self.positions.len() - 1])
    }

    pub fn update_valuation(&mut self, universe: &[Asset]) -> Result<(), LedgerError> {
        let mut total_asset_value: Micros = 0;

        for position in &mut self.positions {
            let asset = asset_at(universe, position.asset_index)?;
            let current_val = position
                .units
                .checked_mul(asset.price)
                .ok_or(LedgerError::Overflow("position value"))?;
            let cost = position
                .units
                .checked_mul(position.cost_basis)
                .ok_or(LedgerError::Overflow("position cost"))?;

            position.current_val = current_val;
            position.pnl_unrealized = current_val
                .checked_sub(cost)
                .ok_or(LedgerError::Overflow("unrealized pnl"))?;
            total_asset_value = total_asset_value
                .checked_add(current_val)
                .ok_or(LedgerError::Overflow("total asset value"))?;
        }

        self.total_asset_value = total_asset_value;
        self.nav = self.identity_nav()?;
        self.leverage_ratio = leverage(self.total_asset_value, self.nav);

        if self.nav > self.high_water_mark {
            self.high_water_mark = self.nav;
            self.current_drawdown = 0.0;
            self.months_underwater = 0;
        } else {
            let diff = self.high_water_mark - self.nav;
            self.current_drawdown = if self.high_water_mark > 0 {
                -(diff as f64 / self.high_water_mark as f64)
            } else {
                0.0
            };
            self.months_underwater = self.months_underwater.saturating_add(1);
        }

        Ok(())
    }

    pub fn identity_nav(&self) -> Result<Micros, LedgerError> {
        self.cash_balance
            .checked_add(self.total_asset_value)
            .and_then(|gross| gross.checked_sub(self.total_liabilities))
            .ok_or(LedgerError::Overflow("nav"))
    }

    /// Adds a signed amount to liabilities and re-derives NAV through the
    /// identity. Valuation metrics wait for the next pass.
    pub fn adjust_liabilities(&mut self, delta: Micros) -> Result<(), LedgerError> {
        let next = self
            .total_liabilities
            .checked_add(delta)
            .ok_or(LedgerError::Overflow("liabilities"))?;
        if next < 0 {
            return Err(LedgerError::NegativeLiabilities {
                current: self.total_liabilities,
                delta,
            });
        }

        self.total_liabilities = next;
        self.nav = self.identity_nav()?;
        Ok(())
    }

    pub fn invested_cost(&self) -> Result<Micros, LedgerError> {
        self.positions.iter().try_fold(0 as Micros, |total, position| {
            position
                .units
                .checked_mul(position.cost_basis)
                .and_then(|cost| total.checked_add(cost))
                .ok_or(LedgerError::Overflow("invested cost"))
        })
    }
}

pub(crate) fn asset_at(universe: &[Asset], asset_index: usize) -> Result<&Asset, LedgerError> {
    universe
        .get(asset_index)
        .ok_or(LedgerError::UnknownAsset {
            asset_index,
            universe_len: universe.len(),
        })
}

fn leverage(total_asset_value: Micros, nav: Micros) -> f64 {
    if nav > 0 {
        total_asset_value as f64 / nav as f64
    } else {
        LEVERAGE_SENTINEL
    }
}
