pub mod app;
pub mod client;
pub mod config;
pub mod csv;
pub mod dashboard;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod query;
pub mod state;
pub mod ui;

pub use app::router;
pub use client::{ApiClient, ApiError, DashboardApi, Endpoint};
pub use config::DashboardConfig;
pub use state::AppState;
