pub mod routes;
pub mod state;

use axum::Router;

pub fn app() -> Router {
    routes::router(state::AppState::new())
}
