use axum::{routing::get, Router};

pub fn build_app() -> Router {
    api::app().route("/health", get(healthcheck))
}

async fn healthcheck() -> &'static str {
    "ok"
}
