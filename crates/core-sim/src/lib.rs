pub mod config;
pub mod market;
pub mod money;
pub mod rng;

pub use config::{ConfigError, SimConfig};
pub use market::{
    init_universe, tick_market, Asset, AssetClass, MacroFactors, MarketRegime, MarketSimulator,
};
pub use money::{from_micros, to_micros, Micros, MICROS_PER_UNIT};
pub use rng::{DeterministicRng, DEFAULT_SEED};
