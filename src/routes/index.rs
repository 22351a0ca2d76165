use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};

use crate::app::AppState;
use crate::error::InternalError;
use crate::routes::dashboard::render_dashboard;

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    city: String,
    content: String,
}

pub async fn get_index(State(state): State<AppState>) -> Result<Response, InternalError> {
    let dashboard_state = state.dashboard.state().await;
    let content = render_dashboard(&dashboard_state)?;
    Ok(Html(render_main(dashboard_state.city().to_string(), content)).into_response())
}

pub fn render_main(city: String, content: String) -> String {
    IndexTemplate { city, content }
        .render()
        .expect("Template should always succeed")
}
