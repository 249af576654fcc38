use std::sync::Arc;

use http::{Method, StatusCode};
use tracing::{info, warn};

use crate::{
    config::ConfigSource,
    i18n::{Localizer, BEEN_LOGGED_OUT},
    session::SessionStore,
    template::{PlaceholderMap, RenderError, Renderer},
};

// ── Template contract ─────────────────────────────────────────────────────────

/// Template merged into the logged-out page.
pub const LOGOUT_TEMPLATE: &str = "logout.tmpl";

/// Placeholder tokens the logout template understands. The set is fixed.
pub const TOKEN_BASE_URL: &str = "__BASE_URL__";
pub const TOKEN_BEEN_LOGGED_OUT: &str = "__BEENLOGGEDOUT__";
pub const TOKEN_PRODUCT_LINK: &str = "__MCLINK__";
pub const TOKEN_PRODUCT_LABEL: &str = "__MCLINKLABEL__";

// ── Product link variants ─────────────────────────────────────────────────────

/// Footer link shown on the logged-out page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductLink {
    pub url: &'static str,
    pub label: &'static str,
}

const COMMERCIAL: ProductLink = ProductLink {
    url: "https://www.mailsift.com",
    label: "Mailsift, a Calden Systems product",
};

const OPEN_SOURCE: ProductLink = ProductLink {
    url: "https://www.mailsift.org",
    label: "Mailsift, the open source mail filter",
};

/// Exactly two variants exist, selected by the registration flag.
pub fn product_link(registered: bool) -> ProductLink {
    if registered {
        COMMERCIAL
    } else {
        OPEN_SOURCE
    }
}

// ── Request / outcome ─────────────────────────────────────────────────────────

/// The slice of the inbound request the flow needs.
#[derive(Debug, Clone)]
pub struct LogoutRequest {
    pub method: Method,
    /// Declared server name, taken verbatim from the request. Not validated
    /// against a known-hosts list; the console trusts its fronting server.
    pub server_name: String,
    /// Session token presented by the caller, if any.
    pub session: Option<String>,
}

/// Terminal result of the flow: rendered payload plus status.
#[derive(Debug, Clone)]
pub struct LogoutOutcome {
    pub status: StatusCode,
    pub body: String,
}

// ── Flow ──────────────────────────────────────────────────────────────────────

/// Orchestrates config → localization → rendering → session termination.
///
/// Collaborators are injected at construction; the flow itself keeps no
/// per-request state.
pub struct LogoutFlow {
    config: Arc<dyn ConfigSource>,
    lang: Arc<dyn Localizer>,
    templates: Arc<dyn Renderer>,
    sessions: Arc<dyn SessionStore>,
}

impl LogoutFlow {
    pub fn new(
        config: Arc<dyn ConfigSource>,
        lang: Arc<dyn Localizer>,
        templates: Arc<dyn Renderer>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            lang,
            templates,
            sessions,
        }
    }

    /// Handles one logout request.
    ///
    /// `HEAD` probes return an empty 200 without touching any collaborator.
    /// For everything else the page is rendered first and the caller's
    /// session is terminated only once rendering has succeeded — a rendering
    /// failure propagates and leaves the session alone, a termination failure
    /// is logged and absorbed because the confirmation page already exists.
    pub fn handle(&self, req: &LogoutRequest) -> Result<LogoutOutcome, RenderError> {
        if req.method == Method::HEAD {
            return Ok(LogoutOutcome {
                status: StatusCode::OK,
                body: String::new(),
            });
        }

        let prefs = self.config.http_preferences();
        let origin = prefs.origin(&req.server_name);

        let link = product_link(self.config.is_registered());

        let mut replacements = PlaceholderMap::new();
        replacements.set(TOKEN_BASE_URL, req.server_name.clone());
        replacements.set(
            TOKEN_BEEN_LOGGED_OUT,
            self.lang.translate(BEEN_LOGGED_OUT, &[&origin]),
        );
        replacements.set(TOKEN_PRODUCT_LINK, link.url);
        replacements.set(TOKEN_PRODUCT_LABEL, link.label);

        let body = self.templates.render(LOGOUT_TEMPLATE, &replacements)?;

        match self.sessions.terminate_all(req.session.as_deref()) {
            Ok(existed) => info!(existed, "audit: session.logout"),
            Err(e) => warn!(error = %e, "session termination failed after rendering"),
        }

        Ok(LogoutOutcome {
            status: StatusCode::OK,
            body,
        })
    }
}
