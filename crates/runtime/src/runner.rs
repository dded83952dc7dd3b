use core_sim::Micros;
use ledger::{force_liquidate, AccountStatus, LedgerError, LiquidationReport, StatusTransition};
use serde::Serialize;

use crate::logging::{RunLogEvent, RunLogEventKind, RunLogWriter};
use crate::metrics::{TrajectoryMetrics, TrajectorySummary};
use crate::session::{SessionError, SimSession};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSnapshot {
    pub tick: u64,
    pub nav: Micros,
    pub cash_balance: Micros,
    pub total_asset_value: Micros,
    pub total_liabilities: Micros,
    pub drawdown: f64,
    pub leverage: f64,
    pub status: AccountStatus,
    pub months_underwater: u32,
    pub prices: Vec<Micros>,
    pub illiquid_assets: Vec<usize>,
}

impl TickSnapshot {
    fn capture(session: &SimSession, illiquid_assets: Vec<usize>) -> Self {
        let portfolio = session.portfolio();
        Self {
            tick: session.tick(),
            nav: portfolio.nav,
            cash_balance: portfolio.cash_balance,
            total_asset_value: portfolio.total_asset_value,
            total_liabilities: portfolio.total_liabilities,
            drawdown: portfolio.current_drawdown,
            leverage: portfolio.leverage_ratio,
            status: portfolio.status,
            months_underwater: portfolio.months_underwater,
            prices: session.universe().iter().map(|asset| asset.price).collect(),
            illiquid_assets,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Completed,
    Insolvent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub stop_reason: StopReason,
    pub ticks_run: u64,
    pub final_status: AccountStatus,
    pub final_nav: Micros,
    pub high_water_mark: Micros,
    pub transitions: Vec<(u64, StatusTransition)>,
    pub liquidation: Option<(u64, LiquidationReport)>,
    pub snapshots: Vec<TickSnapshot>,
    pub summary: Option<TrajectorySummary>,
}

/// Drives `session` for its configured duration.
///
/// Stops early once the account is insolvent. The first time the risk engine
/// lands on `Liquidated`, every position is sold before the next tick. A
/// ledger fault ends the run with an error.
pub fn run_session(
    session: &mut SimSession,
    run_log: &mut dyn RunLogWriter,
) -> Result<RunOutcome, SessionError> {
    let duration = u64::from(session.config().duration_months);
    let mut metrics = TrajectoryMetrics::new();
    metrics.record_nav(session.portfolio().nav);

    let mut snapshots = Vec::new();
    let mut transitions = Vec::new();
    let mut liquidation = None;
    let mut stop_reason = StopReason::Completed;

    while session.tick() < duration {
        let report = match session.step_once() {
            Ok(report) => report,
            Err(err) => {
                run_log.write(RunLogEvent::new(session.tick(), fault_kind(&err), None));
                return Err(err);
            }
        };
        let tick = report.tick;
        for event in &report.events {
            run_log.write(RunLogEvent::new(tick, event.stage.into(), None));
        }

        if let Some(transition) = report.transition {
            run_log.write(RunLogEvent::new(
                tick,
                RunLogEventKind::StatusChanged,
                Some(transition.to),
            ));
            transitions.push((tick, transition));

            if transition.to == AccountStatus::Liquidated && liquidation.is_none() {
                let (portfolio, universe) = session.ledger_and_universe();
                let report = match force_liquidate(portfolio, universe) {
                    Ok(report) => report,
                    Err(source) => {
                        let err = SessionError::Ledger { tick, source };
                        run_log.write(RunLogEvent::new(tick, fault_kind(&err), None));
                        return Err(err);
                    }
                };
                run_log.write(RunLogEvent::new(
                    tick,
                    RunLogEventKind::PositionsLiquidated,
                    Some(AccountStatus::Liquidated),
                ));
                liquidation = Some((tick, report));
            }
        }

        metrics.record_nav(session.portfolio().nav);
        snapshots.push(TickSnapshot::capture(session, report.illiquid_assets));

        if session.status() == AccountStatus::Insolvent {
            stop_reason = StopReason::Insolvent;
            break;
        }
    }

    let portfolio = session.portfolio();
    run_log.write(RunLogEvent::new(
        session.tick(),
        RunLogEventKind::SessionStopped,
        Some(portfolio.status),
    ));
    tracing::info!(
        ticks = session.tick(),
        final_nav = portfolio.nav,
        status = portfolio.status.as_str(),
        stop_reason = ?stop_reason,
        "session finished"
    );

    Ok(RunOutcome {
        stop_reason,
        ticks_run: session.tick(),
        final_status: portfolio.status,
        final_nav: portfolio.nav,
        high_water_mark: portfolio.high_water_mark,
        transitions,
        liquidation,
        snapshots,
        summary: metrics.summary(),
    })
}

fn fault_kind(err: &SessionError) -> RunLogEventKind {
    match err {
        SessionError::Ledger {
            source: LedgerError::Corruption { .. },
            ..
        } => RunLogEventKind::LedgerCorruptionDetected,
        SessionError::Halted { .. } => RunLogEventKind::SessionHalted,
        SessionError::Ledger { .. } | SessionError::Allocation(_) => {
            RunLogEventKind::LedgerFaultDetected
        }
    }
}
