use axum::{Router, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::{ConfigError, Settings};
use crate::models::dashboard::Dashboard;
use crate::models::provider::{ProviderHandle, create_provider};
use crate::routes::{api, dashboard, index};

// Anything that goes in here must be a handle or pointer that can be cloned.
// The underlying state itself should be shared.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Dashboard,
    pub provider: ProviderHandle,
    pub history_days: usize,
}

impl AppState {
    pub fn new(provider: ProviderHandle, history_days: usize) -> AppState {
        AppState {
            dashboard: Dashboard::new(provider.clone(), history_days),
            provider,
            history_days,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<AppState, ConfigError> {
        let provider = create_provider(settings)?;
        Ok(AppState::new(provider, settings.history_days))
    }
}

pub fn create_app(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(index::get_index))
        .route("/health", get(health))
        .with_state(state.clone())
        .nest("/dashboard", dashboard::routes(state.clone()))
        .nest("/api", api::routes(state))
        .layer(TraceLayer::new_for_http());

    let assets_path = "assets";
    log::debug!("serving assets from {}", assets_path);
    let assets_service = ServeDir::new(assets_path);
    app = app.fallback_service(assets_service);
    app
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
pub fn test_state() -> AppState {
    use std::sync::Arc;
    AppState::new(Arc::new(crate::models::fake_provider::create()), 5)
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get(uri: &str) -> (StatusCode, String) {
        let response = create_app(test_state())
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should be handled");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        (
            status,
            String::from_utf8(bytes.to_vec()).expect("body should be utf-8"),
        )
    }

    #[tokio::test]
    async fn index_renders_full_page() {
        let (status, html) = get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<h1>Weather Dashboard</h1>"));
        assert!(html.contains("name=\"city\""));
        assert!(html.contains("id=\"dashboard\""));
    }

    #[tokio::test]
    async fn health_is_ok() {
        assert_eq!(get("/health").await, (StatusCode::OK, "ok".to_string()));
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let (status, _) = get("/no/such/page").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
