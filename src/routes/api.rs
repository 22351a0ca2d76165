use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Router, routing::get};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::LoadError;
use crate::models::dashboard::DashboardState;
use crate::weather::{WeatherReport, fetch_weather_report};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/weather", get(get_weather))
        .route("/dashboard", get(get_dashboard))
        .with_state(state)
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiError {
    pub error: String,
}

enum ApiFailure {
    BlankCity,
    Load(LoadError),
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiFailure::BlankCity => (StatusCode::BAD_REQUEST, "City must not be empty".to_string()),
            ApiFailure::Load(load_error) => (load_error.status_code(), load_error.to_string()),
        };
        (status, Json(ApiError { error })).into_response()
    }
}

impl From<LoadError> for ApiFailure {
    fn from(load_error: LoadError) -> Self {
        log::warn!("Weather API request failed: {}", load_error.reason());
        ApiFailure::Load(load_error)
    }
}

#[derive(Deserialize, Debug)]
struct CityQuery {
    #[serde(default)]
    city: String,
}

/// Stateless load; the dashboard state is left alone.
async fn get_weather(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<WeatherReport>, ApiFailure> {
    let city = query.city.trim();
    if city.is_empty() {
        return Err(ApiFailure::BlankCity);
    }
    let report = fetch_weather_report(
        state.provider.as_ref(),
        city,
        state.history_days,
        Local::now().date_naive(),
    )
    .await?;
    Ok(Json(report))
}

async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardState> {
    Json(state.dashboard.state().await)
}
