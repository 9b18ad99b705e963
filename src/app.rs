use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/apply", post(handlers::apply))
        .route("/letters.csv", get(handlers::letters_csv))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/load", post(handlers::load))
        .route("/health", get(handlers::health))
        .with_state(state)
}
