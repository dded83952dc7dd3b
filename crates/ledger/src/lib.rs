pub mod audit;
pub mod error;
pub mod liquidation;
pub mod portfolio;
pub mod risk;

pub use audit::{audit, AuditOutcome};
pub use error::LedgerError;
pub use liquidation::{execution_price, force_liquidate, LiquidationReport, ILLIQUID_HAIRCUT_BPS};
pub use portfolio::{AccountStatus, Portfolio, Position, LEVERAGE_SENTINEL};
pub use risk::{check_constraints, classify, next_status, RiskSignal, StatusTransition};
