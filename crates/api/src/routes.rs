use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use core_sim::{
    config::{DEFAULT_DURATION_MONTHS, DEFAULT_MAX_DRAWDOWN_PCT},
    money::units_to_micros,
    ConfigError, MarketRegime, SimConfig, DEFAULT_SEED,
};
use ledger::AccountStatus;
use runtime::{
    logging::TracingRunLogWriter, run_session, Allocation, SessionError, SimSession, StopReason,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{AppState, RunRecord, StartRunError};

const DEFAULT_INITIAL_CAPITAL_UNITS: i64 = 100_000_000;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/runs", post(start_run))
        .route("/runs/:run_id", get(get_run))
        .with_state(state)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunRequest {
    pub seed: Option<u64>,
    pub regime: Option<MarketRegime>,
    pub duration_months: Option<i64>,
    pub max_drawdown_pct: Option<f64>,
    #[serde(default)]
    pub allow_margin: bool,
    pub min_cash_buffer: Option<f64>,
    /// Whole currency units.
    pub initial_capital: Option<i64>,
    pub allocations: Option<Vec<Allocation>>,
}

#[derive(Debug, Serialize)]
struct StartRunResponse {
    run_id: u64,
    stop_reason: StopReason,
    ticks_run: u64,
    final_status: AccountStatus,
    final_nav: i64,
    high_water_mark: i64,
    liquidated_at: Option<u64>,
    p5_return_bps: Option<i64>,
    max_drawdown: Option<f64>,
}

impl StartRunResponse {
    fn from_record(record: &RunRecord) -> Self {
        let outcome = &record.outcome;
        Self {
            run_id: record.run_id,
            stop_reason: outcome.stop_reason,
            ticks_run: outcome.ticks_run,
            final_status: outcome.final_status,
            final_nav: outcome.final_nav,
            high_water_mark: outcome.high_water_mark,
            liquidated_at: outcome.liquidation.map(|(tick, _)| tick),
            p5_return_bps: outcome.summary.as_ref().map(|s| s.p5_return_bps),
            max_drawdown: outcome.summary.as_ref().map(|s| s.max_drawdown),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    MalformedBody(String),
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
    #[error("initial capital must be a positive whole amount, got {0}")]
    InvalidCapital(i64),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    RunId(#[from] StartRunError),
    #[error("run {0} not found")]
    NotFound(u64),
    #[error("simulation task failed: {0}")]
    Task(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MalformedBody(_)
            | Self::InvalidConfig(_)
            | Self::InvalidCapital(_)
            | Self::Session(SessionError::Allocation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Session(_) | Self::RunId(_) | Self::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "run request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

async fn start_run(
    State(state): State<AppState>,
    body: Result<Json<RunRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;

    let seed = request.seed.unwrap_or(DEFAULT_SEED);
    let config = SimConfig::new(
        request.regime.unwrap_or(MarketRegime::StableGrowth),
        request
            .duration_months
            .unwrap_or(i64::from(DEFAULT_DURATION_MONTHS)),
        request.max_drawdown_pct.unwrap_or(DEFAULT_MAX_DRAWDOWN_PCT),
        request.allow_margin,
    )?;
    let config = match request.min_cash_buffer {
        Some(buffer) => config.with_min_cash_buffer(buffer)?,
        None => config,
    };
    let capital_units = request
        .initial_capital
        .unwrap_or(DEFAULT_INITIAL_CAPITAL_UNITS);
    let initial_capital = units_to_micros(capital_units)
        .filter(|micros| *micros > 0)
        .ok_or(ApiError::InvalidCapital(capital_units))?;
    let allocations = request
        .allocations
        .unwrap_or_else(Allocation::balanced_default);

    let task_allocations = allocations.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let mut session =
            SimSession::with_allocation(config, seed, initial_capital, &task_allocations)?;
        run_session(&mut session, &mut TracingRunLogWriter)
    })
    .await
    .map_err(|err| ApiError::Task(err.to_string()))??;

    let run_id = state.start_run()?;
    tracing::info!(
        run_id,
        seed,
        regime = config.regime.as_str(),
        status = outcome.final_status.as_str(),
        "run stored"
    );
    let record = state
        .store_run(RunRecord {
            run_id,
            seed,
            initial_capital,
            config,
            allocations,
            outcome,
        })
        .await;
    let location = format!("/runs/{run_id}");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(StartRunResponse::from_record(&record)),
    ))
}

async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<u64>,
) -> Result<Json<RunRecord>, ApiError> {
    let record = state.run(run_id).await.ok_or(ApiError::NotFound(run_id))?;
    Ok(Json(RunRecord::clone(&record)))
}
