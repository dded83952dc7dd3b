use core_sim::{Asset, MarketSimulator, Micros, SimConfig};
use ledger::{
    audit, check_constraints, AccountStatus, AuditOutcome, LedgerError, Portfolio,
    StatusTransition,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::{RuntimeEvent, RuntimeStage};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("tick {tick}: {source}")]
    Ledger {
        tick: u64,
        #[source]
        source: LedgerError,
    },
    #[error("session halted after ledger corruption at tick {tick}")]
    Halted { tick: u64 },
    #[error("initial allocation rejected: {0}")]
    Allocation(#[source] LedgerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub asset_index: usize,
    pub units: i64,
}

impl Allocation {
    /// 2,500 index units plus 400,000 bond units, sized for 100,000,000.00
    /// of capital.
    pub fn balanced_default() -> Vec<Self> {
        vec![
            Self {
                asset_index: 0,
                units: 2_500,
            },
            Self {
                asset_index: 1,
                units: 400_000,
            },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub events: Vec<RuntimeEvent>,
    pub audit: AuditOutcome,
    pub transition: Option<StatusTransition>,
    pub illiquid_assets: Vec<usize>,
}

/// A self-contained simulation: its own generator, universe and ledger.
///
/// Sessions share nothing, so any number can run side by side and two
/// sessions built from the same inputs produce identical trajectories.
#[derive(Debug, Clone)]
pub struct SimSession {
    config: SimConfig,
    market: MarketSimulator,
    portfolio: Portfolio,
    halted_at: Option<u64>,
}

impl SimSession {
    pub fn new(config: SimConfig, seed: u64, initial_capital: Micros) -> Self {
        Self {
            config,
            market: MarketSimulator::new(seed, config.regime),
            portfolio: Portfolio::new(initial_capital),
            halted_at: None,
        }
    }

    pub fn with_allocation(
        config: SimConfig,
        seed: u64,
        initial_capital: Micros,
        allocations: &[Allocation],
    ) -> Result<Self, SessionError> {
        let mut session = Self::new(config, seed, initial_capital);
        for allocation in allocations {
            session
                .portfolio
                .open_position(
                    session.market.universe(),
                    allocation.asset_index,
                    allocation.units,
                )
                .map_err(SessionError::Allocation)?;
        }
        Ok(session)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn universe(&self) -> &[Asset] {
        self.market.universe()
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn portfolio_mut(&mut self) -> &mut Portfolio {
        &mut self.portfolio
    }

    pub fn ledger_and_universe(&mut self) -> (&mut Portfolio, &[Asset]) {
        (&mut self.portfolio, self.market.universe())
    }

    pub fn tick(&self) -> u64 {
        self.market.tick_index()
    }

    pub fn is_halted(&self) -> bool {
        self.halted_at.is_some()
    }

    pub fn status(&self) -> AccountStatus {
        self.portfolio.status
    }

    /// Runs one month: market tick, valuation, audit, risk evaluation.
    ///
    /// A failed valuation or audit halts the session for good; risk rules
    /// never run against a ledger that did not audit cleanly.
    pub fn step_once(&mut self) -> Result<TickReport, SessionError> {
        if let Some(tick) = self.halted_at {
            return Err(SessionError::Halted { tick });
        }

        let tick = self.market.tick_index() + 1;
        let mut events = vec![RuntimeEvent::new(tick, RuntimeStage::TickStarted)];

        self.market.advance();
        events.push(RuntimeEvent::new(tick, RuntimeStage::MarketTicked));

        if let Err(source) = self.portfolio.update_valuation(self.market.universe()) {
            return Err(self.halt(tick, source));
        }
        events.push(RuntimeEvent::new(tick, RuntimeStage::PortfolioValued));

        let audit = match audit(&mut self.portfolio) {
            Ok(outcome) => outcome,
            Err(source) => return Err(self.halt(tick, source)),
        };
        events.push(RuntimeEvent::new(tick, RuntimeStage::LedgerAudited));

        let transition = check_constraints(&mut self.portfolio, &self.config);
        events.push(RuntimeEvent::new(tick, RuntimeStage::ConstraintsChecked));

        let illiquid_assets = self
            .market
            .universe()
            .iter()
            .enumerate()
            .filter(|(_, asset)| asset.is_illiquid)
            .map(|(index, _)| index)
            .collect();

        tracing::trace!(
            tick,
            nav = self.portfolio.nav,
            status = self.portfolio.status.as_str(),
            "tick complete"
        );

        Ok(TickReport {
            tick,
            events,
            audit,
            transition,
            illiquid_assets,
        })
    }

    fn halt(&mut self, tick: u64, source: LedgerError) -> SessionError {
        tracing::error!(tick, error = %source, "session halted");
        self.halted_at = Some(tick);
        SessionError::Ledger { tick, source }
    }
}
