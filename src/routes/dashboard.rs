use askama::Template;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{
    Form, Router,
    routing::{get, post},
};
use serde::Deserialize;

use crate::app::AppState;
use crate::chart::render_temperature_chart;
use crate::error::InternalError;
use crate::models::dashboard::DashboardState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", post(submit_city))
        .route("/state", get(get_state))
        .with_state(state)
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    status: &'static str,
    city: String,
    message: String,
    chart: String,
    current: String,
}

pub fn render_dashboard(state: &DashboardState) -> Result<String, InternalError> {
    let template = match state {
        DashboardState::Idle => DashboardTemplate {
            status: "idle",
            city: String::new(),
            message: String::new(),
            chart: String::new(),
            current: String::new(),
        },
        DashboardState::Loading { city } => DashboardTemplate {
            status: "loading",
            city: city.clone(),
            message: String::new(),
            chart: String::new(),
            current: String::new(),
        },
        DashboardState::Loaded(report) => DashboardTemplate {
            status: "loaded",
            city: report.city.clone(),
            message: String::new(),
            chart: render_temperature_chart(&report.history).map_err(|err| {
                InternalError::new(format!("Failed to draw chart for {}: {err}", report.city))
            })?,
            current: format!("{:.2}", report.current),
        },
        DashboardState::Failed { city, message } => DashboardTemplate {
            status: "failed",
            city: city.clone(),
            message: message.clone(),
            chart: String::new(),
            current: String::new(),
        },
    };
    Ok(template
        .render()
        .expect("Template rendering should always succeed"))
}

#[derive(Deserialize, Debug)]
struct CityForm {
    city: String,
}

async fn submit_city(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<CityForm>,
) -> Result<Response, InternalError> {
    let load = state.dashboard.submit(&form.city).await;
    if headers.get("hx-request").is_none() {
        // Without htmx nothing polls the loading fragment, so the redirect
        // waits for the load to settle.
        if let Some(load) = load {
            if let Err(err) = load.await {
                log::error!("Load task failed: {err}");
            }
        }
        return Ok(Redirect::to("/").into_response());
    }
    // The htmx fragment polls until the detached load lands.
    let content = render_dashboard(&state.dashboard.state().await)?;
    Ok(Html(content).into_response())
}

async fn get_state(State(state): State<AppState>) -> Result<Response, InternalError> {
    let content = render_dashboard(&state.dashboard.state().await)?;
    Ok(Html(content).into_response())
}
