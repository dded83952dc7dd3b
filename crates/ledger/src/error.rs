use core_sim::Micros;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("ledger corruption: stored nav {stored} but cash + assets - liabilities = {recomputed}")]
    Corruption { stored: Micros, recomputed: Micros },
    #[error("position refers to asset {asset_index} but the universe holds {universe_len}")]
    UnknownAsset {
        asset_index: usize,
        universe_len: usize,
    },
    #[error("units must be positive, got {0}")]
    NonPositiveUnits(i64),
    #[error("insufficient cash: purchase costs {required}, balance is {available}")]
    InsufficientCash { required: Micros, available: Micros },
    #[error("liabilities cannot go negative: {current} + {delta}")]
    NegativeLiabilities { current: Micros, delta: Micros },
    #[error("arithmetic overflow while computing {0}")]
    Overflow(&'static str),
}
