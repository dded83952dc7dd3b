use std::io::{self, Write};

use ledger::AccountStatus;
use serde::Serialize;

use crate::events::RuntimeStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunLogEventKind {
    TickStarted,
    MarketTicked,
    PortfolioValued,
    LedgerAudited,
    ConstraintsChecked,
    StatusChanged,
    PositionsLiquidated,
    LedgerCorruptionDetected,
    LedgerFaultDetected,
    SessionHalted,
    SessionStopped,
    ReplayArtifactWritten,
}

impl From<RuntimeStage> for RunLogEventKind {
    fn from(stage: RuntimeStage) -> Self {
        match stage {
            RuntimeStage::TickStarted => Self::TickStarted,
            RuntimeStage::MarketTicked => Self::MarketTicked,
            RuntimeStage::PortfolioValued => Self::PortfolioValued,
            RuntimeStage::LedgerAudited => Self::LedgerAudited,
            RuntimeStage::ConstraintsChecked => Self::ConstraintsChecked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunLogEvent {
    pub tick: u64,
    pub kind: RunLogEventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AccountStatus>,
}

impl RunLogEvent {
    pub fn new(tick: u64, kind: RunLogEventKind, status: Option<AccountStatus>) -> Self {
        Self { tick, kind, status }
    }
}

pub trait RunLogWriter {
    fn write(&mut self, event: RunLogEvent);
}

#[derive(Debug, Default)]
pub struct InMemoryRunLogWriter {
    events: Vec<RunLogEvent>,
}

impl InMemoryRunLogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[RunLogEvent] {
        &self.events
    }
}

impl RunLogWriter for InMemoryRunLogWriter {
    fn write(&mut self, event: RunLogEvent) {
        self.events.push(event);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRunLogWriter;

impl RunLogWriter for TracingRunLogWriter {
    fn write(&mut self, event: RunLogEvent) {
        tracing::debug!(
            tick = event.tick,
            kind = ?event.kind,
            status = event.status.map(AccountStatus::as_str),
            "run log"
        );
    }
}

/// One JSON object per line. The first write error is kept and later events
/// are dropped.
pub struct JsonLinesRunLogWriter<W: Write> {
    writer: W,
    error: Option<io::Error>,
}

impl<W: Write> JsonLinesRunLogWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }

    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> RunLogWriter for JsonLinesRunLogWriter<W> {
    fn write(&mut self, event: RunLogEvent) {
        if self.error.is_some() {
            return;
        }
        let result = serde_json::to_writer(&mut self.writer, &event)
            .map_err(io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        if let Err(err) = result {
            self.error = Some(err);
        }
    }
}
