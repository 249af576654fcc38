pub mod config;
pub mod dirs;
pub mod handlers;
pub mod i18n;
pub mod logout;
pub mod server;
pub mod session;
pub mod store;
pub mod template;

use std::sync::Arc;

/// Shared application state threaded through axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Logout orchestration with its collaborators wired in at startup.
    pub flow: Arc<logout::LogoutFlow>,
}

pub use server::{router, run, ServerConfig};
