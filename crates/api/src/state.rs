use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use core_sim::SimConfig;
use runtime::{Allocation, RunOutcome};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum StartRunError {
    #[error("run id counter exhausted")]
    RunIdOverflow,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunRecord {
    pub run_id: u64,
    pub seed: u64,
    pub initial_capital: i64,
    pub config: SimConfig,
    pub allocations: Vec<Allocation>,
    pub outcome: RunOutcome,
}

#[derive(Clone, Debug, Default)]
pub struct AppState {
    next_run_id: Arc<AtomicU64>,
    runs: Arc<RwLock<HashMap<u64, Arc<RunRecord>>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_run(&self) -> Result<u64, StartRunError> {
        let previous = self
            .next_run_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_add(1)
            })
            .map_err(|_| StartRunError::RunIdOverflow)?;

        Ok(previous + 1)
    }

    pub async fn store_run(&self, record: RunRecord) -> Arc<RunRecord> {
        let record = Arc::new(record);
        self.runs
            .write()
            .await
            .insert(record.run_id, Arc::clone(&record));
        record
    }

    pub async fn run(&self, run_id: u64) -> Option<Arc<RunRecord>> {
        self.runs.read().await.get(&run_id).cloned()
    }

    #[cfg(test)]
    pub(crate) fn with_next_run_id_for_test(next_run_id: u64) -> Self {
        Self {
            next_run_id: Arc::new(AtomicU64::new(next_run_id)),
            runs: Arc::default(),
        }
    }
}
