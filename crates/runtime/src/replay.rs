use std::io::{self, Write};

use crate::logging::{RunLogEvent, RunLogEventKind, RunLogWriter};
use crate::runner::TickSnapshot;

pub const REPLAY_CSV_HEADER: &str =
    "tick,nav,cash,asset_value,liabilities,drawdown,leverage,status,months_underwater,prices,illiquid\n";

pub struct ReplayCsvWriter<W: Write> {
    writer: W,
}

impl<W: Write> ReplayCsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        self.writer.write_all(REPLAY_CSV_HEADER.as_bytes())
    }

    pub fn write_header_and_log(
        &mut self,
        tick: u64,
        run_log_writer: &mut dyn RunLogWriter,
    ) -> io::Result<()> {
        self.write_header()?;
        self.writer.flush()?;
        run_log_writer.write(RunLogEvent::new(
            tick,
            RunLogEventKind::ReplayArtifactWritten,
            None,
        ));
        Ok(())
    }

    pub fn append_snapshots(&mut self, snapshots: &[TickSnapshot]) -> io::Result<()> {
        for snapshot in snapshots {
            let prices = join_values(&snapshot.prices);
            let illiquid = join_values(&snapshot.illiquid_assets);
            writeln!(
                self.writer,
                "{},{},{},{},{},{},{},{},{},{},{}",
                snapshot.tick,
                snapshot.nav,
                snapshot.cash_balance,
                snapshot.total_asset_value,
                snapshot.total_liabilities,
                snapshot.drawdown,
                snapshot.leverage,
                snapshot.status.as_str(),
                snapshot.months_underwater,
                escape_csv_field(&prices),
                escape_csv_field(&illiquid),
            )?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn join_values<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

fn escape_csv_field(value: &str) -> String {
    let needs_quotes = value
        .chars()
        .any(|ch| matches!(ch, ',' | '"' | '\n' | '\r'));
    if !needs_quotes {
        return value.to_string();
    }

    let escaped = value.replace('"', "\"\"");
    format!("\"{escaped}\"")
}
