use serde::{Deserialize, Serialize};

use crate::money::{from_micros, to_micros, Micros};
use crate::rng::DeterministicRng;

pub const MONTHLY_VOL_SCALE: f64 = 0.28;
pub const ILLIQUID_MOVE_THRESHOLD: f64 = 0.10;
/// Lowest price any asset can print, in whole currency units.
pub const PRICE_FLOOR: f64 = 0.01;
pub const MACRO_SHOCK_BETA_CUTOFF: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarketRegime {
    StableGrowth,
    Stagflation,
    LiquidityCrunch,
    GlobalShock,
    Custom,
}

impl MarketRegime {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "stable-growth" => Some(Self::StableGrowth),
            "stagflation" => Some(Self::Stagflation),
            "liquidity-crunch" => Some(Self::LiquidityCrunch),
            "global-shock" => Some(Self::GlobalShock),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StableGrowth => "stable-growth",
            Self::Stagflation => "stagflation",
            Self::LiquidityCrunch => "liquidity-crunch",
            Self::GlobalShock => "global-shock",
            Self::Custom => "custom",
        }
    }

    pub fn macro_factors(self) -> MacroFactors {
        match self {
            Self::StableGrowth => MacroFactors::new(0.008, 0.0),
            Self::Stagflation => MacroFactors::new(-0.002, -0.01),
            Self::LiquidityCrunch => MacroFactors::new(-0.05, -0.02),
            Self::GlobalShock | Self::Custom => MacroFactors::new(0.005, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroFactors {
    pub drift: f64,
    pub shock: f64,
}

impl MacroFactors {
    pub const fn new(drift: f64, shock: f64) -> Self {
        Self { drift, shock }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetClass {
    Cash,
    EquityIndex,
    GovernmentBond,
    CorporateDebt,
    Gold,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    pub ticker: String,
    pub name: String,
    pub class: AssetClass,
    pub price: Micros,
    pub prev_price: Micros,
    pub volatility: f64,
    pub correlation_beta: f64,
    pub is_illiquid: bool,
}

impl Asset {
    pub fn new(
        ticker: &str,
        name: &str,
        class: AssetClass,
        price: f64,
        volatility: f64,
        correlation_beta: f64,
    ) -> Self {
        let price = to_micros(price);
        Self {
            ticker: ticker.to_string(),
            name: name.to_string(),
            class,
            price,
            prev_price: price,
            volatility,
            correlation_beta,
            is_illiquid: false,
        }
    }

    /// Advances the price one month and returns the percentage change applied
    /// before the floor.
    fn step(&mut self, factors: MacroFactors, rng: &mut DeterministicRng) -> f64 {
        self.prev_price = self.price;

        let drift = factors.drift * self.correlation_beta;
        let mut shock = rng.normal() * self.volatility * MONTHLY_VOL_SCALE;
        if self.correlation_beta > MACRO_SHOCK_BETA_CUTOFF {
            shock += factors.shock;
        }
        let pct_change = drift + shock;

        let next_price = (from_micros(self.prev_price) * (1.0 + pct_change)).max(PRICE_FLOOR);
        self.price = to_micros(next_price);
        self.is_illiquid = pct_change.abs() > ILLIQUID_MOVE_THRESHOLD;

        pct_change
    }
}

pub fn init_universe(regime: MarketRegime) -> Vec<Asset> {
    let mut universe = vec![
        Asset::new(
            "NIFTY_50",
            "Nifty 50 Index",
            AssetClass::EquityIndex,
            22_500.0,
            0.12,
            1.0,
        ),
        Asset::new(
            "IN_10Y_GS",
            "Govt Bond 7.26% 2033",
            AssetClass::GovernmentBond,
            100.0,
            0.04,
            -0.2,
        ),
        Asset::new(
            "RELIANCE",
            "Reliance Ind.",
            AssetClass::EquityIndex,
            2_900.0,
            0.22,
            1.15,
        ),
    ];

    if regime == MarketRegime::Stagflation {
        universe[1].volatility = 0.15;
    }

    universe
}

/// Moves every asset one simulated month. Draws one normal per asset, in
/// universe order, so the path depends only on the seed and regime sequence.
pub fn tick_market(
    assets: &mut [Asset],
    regime: MarketRegime,
    tick: u64,
    rng: &mut DeterministicRng,
) {
    let factors = regime.macro_factors();

    for asset in assets.iter_mut() {
        let pct_change = asset.step(factors, rng);
        if asset.is_illiquid {
            tracing::debug!(
                tick,
                ticker = %asset.ticker,
                pct_change,
                "asset locked: monthly move beyond circuit threshold"
            );
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketSimulator {
    rng: DeterministicRng,
    regime: MarketRegime,
    universe: Vec<Asset>,
    tick: u64,
}

impl MarketSimulator {
    pub fn new(seed: u64, regime: MarketRegime) -> Self {
        Self {
            rng: DeterministicRng::new(seed),
            regime,
            universe: init_universe(regime),
            tick: 0,
        }
    }

    pub fn universe(&self) -> &[Asset] {
        &self.universe
    }

    pub fn tick_index(&self) -> u64 {
        self.tick
    }

    pub fn advance(&mut self) -> &[Asset] {
        self.tick += 1;
        tick_market(&mut self.universe, self.regime, self.tick, &mut self.rng);
        &self.universe
    }
}
