use chrono::Local;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::LoadError;
use crate::models::provider::ProviderHandle;
use crate::weather::{WeatherReport, fetch_weather_report};

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DashboardState {
    Idle,
    Loading { city: String },
    Loaded(WeatherReport),
    Failed { city: String, message: String },
}

impl DashboardState {
    pub fn city(&self) -> &str {
        match self {
            DashboardState::Idle => "",
            DashboardState::Loading { city } => city,
            DashboardState::Loaded(report) => &report.city,
            DashboardState::Failed { city, .. } => city,
        }
    }
}

/// Identifies one submission. Only the ticket of the latest submission may
/// complete a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    city: String,
}

struct DashboardInner {
    state: DashboardState,
    generation: u64,
    in_flight: Option<CancellationToken>,
}

// Anything in here is a handle; clones share the same dashboard.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<RwLock<DashboardInner>>,
    provider: ProviderHandle,
    history_days: usize,
}

impl Dashboard {
    pub fn new(provider: ProviderHandle, history_days: usize) -> Dashboard {
        Dashboard {
            inner: Arc::new(RwLock::new(DashboardInner {
                state: DashboardState::Idle,
                generation: 0,
                in_flight: None,
            })),
            provider,
            history_days,
        }
    }

    pub async fn state(&self) -> DashboardState {
        self.inner.read().await.state.clone()
    }

    /// Starts loading `city` in the background and returns the task, or
    /// `None` when the input is blank and the dashboard went back to idle.
    /// Any load still in flight is cancelled.
    pub async fn submit(&self, city: &str) -> Option<JoinHandle<()>> {
        let (ticket, cancelled) = self.begin(city).await?;
        let dashboard = self.clone();
        Some(tokio::spawn(async move {
            let today = Local::now().date_naive();
            tokio::select! {
                _ = cancelled.cancelled() => {
                    log::debug!("Load of '{}' was superseded", ticket.city);
                }
                result = fetch_weather_report(
                    dashboard.provider.as_ref(),
                    &ticket.city,
                    dashboard.history_days,
                    today,
                ) => {
                    dashboard.finish(&ticket, result).await;
                }
            }
        }))
    }

    pub(crate) async fn begin(&self, city: &str) -> Option<(LoadTicket, CancellationToken)> {
        let mut inner = self.inner.write().await;
        inner.generation += 1;
        if let Some(previous) = inner.in_flight.take() {
            previous.cancel();
        }

        let city = city.trim();
        if city.is_empty() {
            log::debug!("Blank city submitted, dashboard is idle");
            inner.state = DashboardState::Idle;
            return None;
        }

        log::info!("Loading weather for '{city}'");
        let cancelled = CancellationToken::new();
        inner.in_flight = Some(cancelled.clone());
        inner.state = DashboardState::Loading {
            city: city.to_string(),
        };
        Some((
            LoadTicket {
                generation: inner.generation,
                city: city.to_string(),
            },
            cancelled,
        ))
    }

    /// Applies the outcome of a load. Returns false, leaving the state
    /// untouched, when a newer submission has been made since `ticket`.
    pub(crate) async fn finish(
        &self,
        ticket: &LoadTicket,
        result: Result<WeatherReport, LoadError>,
    ) -> bool {
        let mut inner = self.inner.write().await;
        if ticket.generation != inner.generation {
            log::debug!(
                "Dropping stale result for '{}' (generation {} < {})",
                ticket.city,
                ticket.generation,
                inner.generation
            );
            return false;
        }
        inner.in_flight = None;
        inner.state = match result {
            Ok(report) => DashboardState::Loaded(report),
            Err(err) => {
                log::warn!("Failed to load '{}': {}", ticket.city, err.reason());
                DashboardState::Failed {
                    city: ticket.city.clone(),
                    message: err.to_string(),
                }
            }
        };
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::coordinates::Coordinates;
    use crate::models::fake_provider;
    use crate::models::provider::WeatherProvider;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Never answers for "Slow"; counts every geocoding call.
    struct StallingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherProvider for StallingProvider {
        async fn resolve_coordinates(&self, city: &str) -> Result<Coordinates, LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if city == "Slow" {
                std::future::pending::<()>().await;
            }
            Ok(Coordinates::new(10.0, 20.0))
        }

        async fn current_temperature(&self, _coordinates: Coordinates) -> Result<f64, LoadError> {
            Ok(21.5)
        }

        fn name(&self) -> &str {
            "stalling"
        }
    }

    fn stalling_dashboard() -> (Dashboard, Arc<StallingProvider>) {
        let provider = Arc::new(StallingProvider {
            calls: AtomicUsize::new(0),
        });
        (Dashboard::new(provider.clone(), 5), provider)
    }

    fn report(city: &str) -> WeatherReport {
        WeatherReport {
            city: city.to_string(),
            coordinates: Coordinates::new(0.0, 0.0),
            current: 20.0,
            history: vec![],
            fetched_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn starts_idle() {
        let (dashboard, _) = stalling_dashboard();
        assert_eq!(dashboard.state().await, DashboardState::Idle);
    }

    #[tokio::test]
    async fn submit_loads_report() {
        let dashboard = Dashboard::new(Arc::new(fake_provider::create()), 5);
        let load = dashboard.submit("London").await.expect("load should start");
        load.await.expect("load task should not panic");

        match dashboard.state().await {
            DashboardState::Loaded(report) => {
                assert_eq!(report.city, "London");
                assert_eq!(report.history.len(), 6);
                assert_eq!(report.history[5].temperature, report.current);
            }
            state => panic!("expected loaded state, got {state:?}"),
        }
    }

    #[tokio::test]
    async fn submit_trims_city() {
        let (dashboard, _) = stalling_dashboard();
        let load = dashboard.submit("  Paris ").await.expect("load should start");
        load.await.expect("load task should not panic");
        assert_eq!(dashboard.state().await.city(), "Paris");
    }

    #[tokio::test]
    async fn loading_is_visible_while_in_flight() {
        let (dashboard, _) = stalling_dashboard();
        let _load = dashboard.submit("Slow").await;
        assert_eq!(
            dashboard.state().await,
            DashboardState::Loading {
                city: "Slow".to_string()
            }
        );
    }

    #[tokio::test]
    async fn failure_shows_one_message_and_clears_previous_data() {
        let dashboard = Dashboard::new(Arc::new(fake_provider::create()), 5);
        let load = dashboard.submit("London").await.expect("load should start");
        load.await.expect("load task should not panic");
        assert!(matches!(dashboard.state().await, DashboardState::Loaded(_)));

        let load = dashboard.submit("Atlantis").await.expect("load should start");
        load.await.expect("load task should not panic");
        assert_eq!(
            dashboard.state().await,
            DashboardState::Failed {
                city: "Atlantis".to_string(),
                message: "City not found".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn provider_outage_replaces_loaded_report_with_error() {
        use crate::models::openweathermap;
        use serde_json::json;
        use std::time::Duration;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geo"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"lat": 51.5, "lon": -0.12}])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"main": {"temp": 14.2}})))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = openweathermap::create(
            "test-key".to_string(),
            format!("{}/geo", server.uri()),
            format!("{}/weather", server.uri()),
            Duration::from_secs(5),
        )
        .expect("client should build");
        let dashboard = Dashboard::new(Arc::new(provider), 5);

        let load = dashboard.submit("London").await.expect("load should start");
        load.await.expect("load task should not panic");
        match dashboard.state().await {
            DashboardState::Loaded(report) => assert_eq!(report.current, 14.2),
            state => panic!("expected loaded state, got {state:?}"),
        }

        let load = dashboard.submit("London").await.expect("load should start");
        load.await.expect("load task should not panic");
        assert_eq!(
            dashboard.state().await,
            DashboardState::Failed {
                city: "London".to_string(),
                message: "Failed to fetch current weather".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn blank_city_returns_to_idle_without_calling_provider() {
        let (dashboard, provider) = stalling_dashboard();
        assert!(dashboard.submit("   ").await.is_none());
        assert_eq!(dashboard.state().await, DashboardState::Idle);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stale_completion_is_dropped() {
        let (dashboard, _) = stalling_dashboard();
        let (first, _) = dashboard.begin("Oslo").await.expect("first load");
        let (second, _) = dashboard.begin("Bergen").await.expect("second load");

        assert!(!dashboard.finish(&first, Ok(report("Oslo"))).await);
        assert_eq!(
            dashboard.state().await,
            DashboardState::Loading {
                city: "Bergen".to_string()
            }
        );

        assert!(dashboard.finish(&second, Ok(report("Bergen"))).await);
        assert_eq!(dashboard.state().await.city(), "Bergen");

        // A late failure of the first load must not clobber the result either.
        assert!(
            !dashboard
                .finish(&first, Err(LoadError::weather("late")))
                .await
        );
        assert!(matches!(dashboard.state().await, DashboardState::Loaded(_)));
    }

    #[tokio::test]
    async fn new_submission_cancels_in_flight_load() {
        let (dashboard, _) = stalling_dashboard();
        let slow = dashboard.submit("Slow").await.expect("slow load should start");
        let fast = dashboard.submit("Fast").await.expect("fast load should start");

        // The stalled load only ends because it was cancelled.
        slow.await.expect("cancelled task should end cleanly");
        fast.await.expect("load task should not panic");

        match dashboard.state().await {
            DashboardState::Loaded(report) => assert_eq!(report.city, "Fast"),
            state => panic!("expected loaded state, got {state:?}"),
        }
    }

    #[tokio::test]
    async fn blank_submission_cancels_in_flight_load() {
        let (dashboard, _) = stalling_dashboard();
        let slow = dashboard.submit("Slow").await.expect("slow load should start");
        assert!(dashboard.submit("").await.is_none());
        slow.await.expect("cancelled task should end cleanly");
        assert_eq!(dashboard.state().await, DashboardState::Idle);
    }

    #[test]
    fn state_serializes_with_status_tag() {
        let state = DashboardState::Failed {
            city: "Atlantis".to_string(),
            message: "City not found".to_string(),
        };
        let json = serde_json::to_value(&state).expect("state should serialize");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["message"], "City not found");

        let json = serde_json::to_value(DashboardState::Idle).expect("state should serialize");
        assert_eq!(json["status"], "idle");
    }
}
