use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

use crate::app::{AppState, create_app};
use crate::config::{ConfigError, ProviderKind, Settings};

mod app;
mod chart;
mod config;
mod error;
mod models;
mod routes;
mod weather;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file [default: weatherboard.toml if present]
    #[arg(long, env = "WEATHERBOARD_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(short, long, env = "WEATHERBOARD_PORT")]
    port: Option<u16>,

    #[arg(long, env = "WEATHERBOARD_PROVIDER", value_enum)]
    provider: Option<ProviderKind>,

    #[arg(short, long, env = "KEY_FILE_PATH")]
    key_file_path: Option<String>,

    #[arg(short, long, env = "CERT_FILE_PATH")]
    cert_file_path: Option<String>,
}

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("A key file was given without a cert file")]
    MissingCertFile,
    #[error("Failed to load TLS key and certificate: {0}")]
    Tls(std::io::Error),
    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(api_key) = &self.api_key {
            settings.api_key = Some(api_key.clone());
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(provider) = self.provider {
            settings.provider = provider;
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args = Args::parse();
    if let Err(err) = run(args).await {
        log::error!("{err}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), StartupError> {
    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply(&mut settings);
    settings.validate()?;
    log::debug!("{settings:?}");

    let state = AppState::from_settings(&settings)?;
    if let Some(city) = settings.default_city() {
        let _load = state.dashboard.submit(city).await;
    }
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    log::info!("listening on {}", addr);
    if let Some(key_file_path) = args.key_file_path {
        let cert_file_path = args.cert_file_path.ok_or(StartupError::MissingCertFile)?;
        log::info!(
            "using tls with key file {} and cert file {}",
            key_file_path,
            cert_file_path
        );
        let tls = RustlsConfig::from_pem_file(cert_file_path, key_file_path)
            .await
            .map_err(StartupError::Tls)?;
        axum_server::bind_rustls(addr, tls)
            .serve(app.into_make_service())
            .await
            .map_err(StartupError::Serve)
    } else {
        axum_server::bind(addr)
            .serve(app.into_make_service())
            .await
            .map_err(StartupError::Serve)
    }
}
