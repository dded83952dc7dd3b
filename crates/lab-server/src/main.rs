mod config;
mod telemetry;
mod wiring;

use std::error::Error;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use core_sim::money::format_grouped;
use core_sim::to_micros;
use runtime::logging::JsonLinesRunLogWriter;
use runtime::replay::ReplayCsvWriter;
use runtime::{run_session, Allocation, RunOutcome, SimSession};
use tokio::net::TcpListener;

use crate::config::{Config, RunMode};

const HEADLESS_INITIAL_CAPITAL: f64 = 100_000_000.0;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;
    telemetry::init_tracing(config.log_format)?;

    match config.mode {
        RunMode::Serve => serve(&config).await,
        RunMode::Headless => {
            let outcome = run_headless(&config)?;
            print_report(&config, &outcome);
            Ok(())
        }
    }
}

async fn serve(config: &Config) -> Result<(), Box<dyn Error>> {
    initialize_replay_output(&config.replay_output_path)?;
    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "lab server listening");

    axum::serve(listener, wiring::build_app()).await?;
    Ok(())
}

/// Creates the replay file with its header unless one is already there, so a
/// previous headless artifact survives a server start.
fn initialize_replay_output(path: &str) -> Result<(), std::io::Error> {
    let replay_path = Path::new(path);
    create_parent_dir(replay_path)?;

    let replay_file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(replay_path)
    {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            tracing::info!(path = %replay_path.display(), "keeping existing replay output");
            return Ok(());
        }
        Err(err) => return Err(err),
    };
    let mut replay_writer = ReplayCsvWriter::new(replay_file);
    replay_writer.write_header()?;
    Ok(())
}

fn create_parent_dir(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn run_log_path(replay_path: &Path) -> PathBuf {
    replay_path.with_extension("events.jsonl")
}

fn run_headless(config: &Config) -> Result<RunOutcome, Box<dyn Error>> {
    let replay_path = Path::new(&config.replay_output_path);
    create_parent_dir(replay_path)?;

    let mut session = SimSession::with_allocation(
        config.sim,
        config.seed,
        to_micros(HEADLESS_INITIAL_CAPITAL),
        &Allocation::balanced_default(),
    )?;
    let mut run_log =
        JsonLinesRunLogWriter::new(BufWriter::new(File::create(run_log_path(replay_path))?));

    let outcome = run_session(&mut session, &mut run_log)?;

    let mut replay_writer = ReplayCsvWriter::new(BufWriter::new(File::create(replay_path)?));
    replay_writer.write_header_and_log(outcome.ticks_run, &mut run_log)?;
    replay_writer.append_snapshots(&outcome.snapshots)?;
    replay_writer.into_inner().flush()?;
    run_log.finish()?;

    tracing::info!(
        path = %replay_path.display(),
        rows = outcome.snapshots.len(),
        "replay artifact written"
    );
    Ok(outcome)
}

fn print_report(config: &Config, outcome: &RunOutcome) {
    println!(
        "regime {} seed {}: {} after {} months ({:?})",
        config.sim.regime.as_str(),
        config.seed,
        outcome.final_status.as_str(),
        outcome.ticks_run,
        outcome.stop_reason,
    );
    println!("final NAV       {}", format_grouped(outcome.final_nav));
    println!("high-water mark {}", format_grouped(outcome.high_water_mark));
    if let Some((tick, report)) = &outcome.liquidation {
        println!(
            "liquidated at month {tick}: {} positions, haircut {}",
            report.positions_closed,
            format_grouped(report.haircut_cost),
        );
    }
    if let Some(summary) = &outcome.summary {
        println!(
            "monthly return bps p5/p50/p95 {}/{}/{}, max drawdown {:.2}%",
            summary.p5_return_bps,
            summary.p50_return_bps,
            summary.p95_return_bps,
            summary.max_drawdown * 100.0,
        );
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::net::SocketAddr;
    use std::time::{SystemTime, UNIX_EPOCH};

    use core_sim::{MarketRegime, SimConfig};
    use runtime::replay::REPLAY_CSV_HEADER;

    use super::{initialize_replay_output, run_headless, run_log_path};
    use crate::config::{Config, LogFormat, RunMode};

    fn temp_root(label: &str) -> std::path::PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("lab-server-{label}-{unique}"))
    }

    #[test]
    fn initialize_replay_output_creates_parent_dir_and_writes_csv_header() {
        let root = temp_root("replay");
        let replay_path = root.join("nested").join("replay.csv");

        initialize_replay_output(replay_path.to_str().unwrap())
            .expect("startup should initialize replay output");

        let actual = fs::read_to_string(&replay_path).expect("replay output file should exist");
        assert_eq!(actual, REPLAY_CSV_HEADER);

        fs::remove_dir_all(&root).expect("temp replay directory should be removable");
    }

    #[test]
    fn initialize_replay_output_keeps_an_earlier_artifact() {
        let root = temp_root("keep");
        let replay_path = root.join("replay.csv");
        fs::create_dir_all(&root).unwrap();
        let earlier = format!("{REPLAY_CSV_HEADER}1,5,5,0,0,0,0,active,0,1;2;3,\n");
        fs::write(&replay_path, &earlier).unwrap();

        initialize_replay_output(replay_path.to_str().unwrap()).unwrap();

        assert_eq!(fs::read_to_string(&replay_path).unwrap(), earlier);
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn headless_run_writes_replay_rows_and_run_log() {
        let root = temp_root("headless");
        let replay_path = root.join("out").join("replay.csv");
        let config = Config {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            mode: RunMode::Headless,
            replay_output_path: replay_path.to_str().unwrap().to_owned(),
            log_format: LogFormat::Text,
            seed: 42,
            sim: SimConfig::new(MarketRegime::LiquidityCrunch, 24, 10.0, false).unwrap(),
        };

        let outcome = run_headless(&config).expect("headless run should succeed");

        let csv = fs::read_to_string(&replay_path).unwrap();
        assert!(csv.starts_with(REPLAY_CSV_HEADER));
        assert_eq!(csv.lines().count(), 1 + outcome.snapshots.len());
        assert_eq!(outcome.ticks_run, 24);

        let log = fs::read_to_string(run_log_path(&replay_path)).unwrap();
        let last = log.lines().last().unwrap();
        assert!(last.contains("\"kind\":\"replay_artifact_written\""));
        assert!(log.contains("\"kind\":\"positions_liquidated\""));

        fs::remove_dir_all(&root).expect("temp directory should be removable");
    }
}
