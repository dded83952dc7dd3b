use serde::Serialize;

use crate::error::LedgerError;
use crate::portfolio::{AccountStatus, Portfolio};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Balanced,
    Insolvent,
}

/// Recomputes `cash + assets - liabilities` and requires exact equality with
/// the stored NAV.
///
/// A mismatch is [`LedgerError::Corruption`]; the ledger is untouched and the
/// caller must stop the session. A balanced ledger with negative NAV is moved
/// to `Insolvent`.
pub fn audit(portfolio: &mut Portfolio) -> Result<AuditOutcome, LedgerError> {
    let recomputed = portfolio.identity_nav()?;

    if recomputed != portfolio.nav {
        tracing::error!(
            stored = portfolio.nav,
            recomputed,
            "accounting identity violated"
        );
        return Err(LedgerError::Corruption {
            stored: portfolio.nav,
            recomputed,
        });
    }

    if portfolio.nav < 0 {
        if portfolio.status != AccountStatus::Insolvent {
            tracing::warn!(nav = portfolio.nav, "account insolvent");
        }
        portfolio.status = AccountStatus::Insolvent;
        return Ok(AuditOutcome::Insolvent);
    }

    Ok(AuditOutcome::Balanced)
}
