use crate::csv::{export_csv, CSV_CONTENT_TYPE};
use crate::dashboard::{apply_filter, DashboardSnapshot};
use crate::errors::AppError;
use crate::models::{ApplyForm, FilterState, HealthResponse};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::Utc;

pub const LETTERS_CSV_FILENAME: &str = "letters.csv";

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let dashboard = state.dashboard.lock().await;
    Html(render_index(&dashboard))
}

pub async fn apply(State(state): State<AppState>, Form(form): Form<ApplyForm>) -> Redirect {
    apply_filter(&state.client, &state.dashboard, form.into()).await;
    Redirect::to("/")
}

pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    let dashboard = state.dashboard.lock().await;
    Json(dashboard.snapshot())
}

pub async fn load(
    State(state): State<AppState>,
    Json(filter): Json<FilterState>,
) -> Json<DashboardSnapshot> {
    apply_filter(&state.client, &state.dashboard, filter).await;
    let dashboard = state.dashboard.lock().await;
    Json(dashboard.snapshot())
}

pub async fn letters_csv(State(state): State<AppState>) -> Result<Response, AppError> {
    let csv = {
        let dashboard = state.dashboard.lock().await;
        export_csv(&dashboard.data.letters)?
    };

    let Some(csv) = csv else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let disposition = format!("attachment; filename=\"{LETTERS_CSV_FILENAME}\"");
    Ok((
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        now: Utc::now().to_rfc3339(),
    })
}
