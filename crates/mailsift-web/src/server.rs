use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    config::FileConfig,
    handlers::{health, logout},
    i18n::Catalog,
    logout::LogoutFlow,
    session::MemorySessions,
    store::SystemConf,
    template::FileTemplates,
    AppState,
};

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the console templates.
    pub templates_dir: Option<PathBuf>,
    /// TOML file with the HTTP-facing preferences.
    pub http_conf: Option<PathBuf>,
    /// Flat appliance conf file carrying the registration flag.
    pub registration_conf: Option<PathBuf>,
    /// Optional TOML language override file.
    pub lang_file: Option<PathBuf>,
    /// Optional appliance database. A provisioned `system_conf` row may
    /// relocate the appliance conf file.
    pub db_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("MAILSIFT_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("MAILSIFT_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            templates_dir: std::env::var("MAILSIFT_TEMPLATES").ok().map(PathBuf::from),
            http_conf: std::env::var("MAILSIFT_HTTP_CONF").ok().map(PathBuf::from),
            registration_conf: std::env::var("MAILSIFT_CONF").ok().map(PathBuf::from),
            lang_file: std::env::var("MAILSIFT_LANG_FILE").ok().map(PathBuf::from),
            db_path: std::env::var("MAILSIFT_DB").ok().map(PathBuf::from),
        }
    }
}

/// Builds the console router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/logout", any(logout))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Wires the collaborators from the server configuration.
pub fn build_state(cfg: &ServerConfig) -> Result<AppState> {
    let templates_dir = cfg
        .templates_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("templates"));
    anyhow::ensure!(
        templates_dir.is_dir(),
        "template directory {} does not exist",
        templates_dir.display()
    );

    let http_conf = match cfg.http_conf.clone() {
        Some(path) => path,
        None => crate::dirs::config_dir()?.join("httpd.toml"),
    };

    // Explicit path first, then the location provisioned in the appliance
    // database, then the platform default.
    let registration_conf = match cfg.registration_conf.clone() {
        Some(path) => path,
        None => match provisioned_conf_path(cfg.db_path.as_deref())? {
            Some(path) => path,
            None => crate::dirs::config_dir()?.join("appliance.conf"),
        },
    };

    info!(
        http_conf = %http_conf.display(),
        registration_conf = %registration_conf.display(),
        templates = %templates_dir.display(),
        "console configuration resolved"
    );

    let catalog = match &cfg.lang_file {
        Some(path) => Catalog::with_overrides(path),
        None => Catalog::builtin(),
    };

    let flow = LogoutFlow::new(
        Arc::new(FileConfig::new(http_conf, registration_conf)),
        Arc::new(catalog),
        Arc::new(FileTemplates::new(templates_dir)),
        Arc::new(MemorySessions::new()),
    );
    Ok(AppState {
        flow: Arc::new(flow),
    })
}

pub async fn run(cfg: ServerConfig) -> Result<()> {
    let state = build_state(&cfg)?;

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid host/port")?;

    info!(%addr, "mailsift console listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind listener")?;

    axum::serve(listener, router(state))
        .await
        .context("server error")
}

fn provisioned_conf_path(db_path: Option<&Path>) -> Result<Option<PathBuf>> {
    let Some(db_path) = db_path else {
        return Ok(None);
    };
    if !db_path.exists() {
        warn!(path = %db_path.display(), "appliance database not found, using file defaults");
        return Ok(None);
    }

    let sysconf = SystemConf::open(db_path)?;
    let path = sysconf.config_file_path()?;
    if let Some(p) = &path {
        info!(path = %p.display(), "appliance conf location provisioned in database");
    }
    Ok(path)
}
