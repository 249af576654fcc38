use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::warn;

// ── HTTP preferences ──────────────────────────────────────────────────────────

/// HTTP-facing preferences of the appliance console.
///
/// `use_ssl` selects which port field is authoritative when building the
/// externally visible origin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpPreferences {
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_https_port")]
    pub https_port: u16,
}

fn default_http_port() -> u16 {
    80
}

fn default_https_port() -> u16 {
    443
}

impl Default for HttpPreferences {
    fn default() -> Self {
        Self {
            use_ssl: false,
            http_port: default_http_port(),
            https_port: default_https_port(),
        }
    }
}

impl HttpPreferences {
    pub fn scheme(&self) -> &'static str {
        if self.use_ssl {
            "https"
        } else {
            "http"
        }
    }

    /// The port the console is actually served on.
    pub fn active_port(&self) -> u16 {
        if self.use_ssl {
            self.https_port
        } else {
            self.http_port
        }
    }

    /// Builds `scheme://host[:port]` for the given server name.
    ///
    /// The port suffix is included only when the active port differs from the
    /// scheme's default (80 for http, 443 for https). The server name is used
    /// verbatim; callers own any validation of it.
    pub fn origin(&self, server_name: &str) -> String {
        let default_port = if self.use_ssl { 443 } else { 80 };
        let port = self.active_port();
        if port == default_port {
            format!("{}://{server_name}", self.scheme())
        } else {
            format!("{}://{server_name}:{port}", self.scheme())
        }
    }
}

// ── Config source ─────────────────────────────────────────────────────────────

/// Read access to the appliance configuration consumed per request.
///
/// Reads never fail: missing or unreadable backing files fall back to
/// documented defaults so a half-provisioned box still serves pages.
pub trait ConfigSource: Send + Sync {
    fn http_preferences(&self) -> HttpPreferences;

    /// Whether this deployment runs under a commercial license. Absent file
    /// or key reads as unregistered.
    fn is_registered(&self) -> bool;
}

/// Key carrying the registration flag in the appliance conf file.
pub const REGISTERED_KEY: &str = "REGISTERED";

/// File-backed [`ConfigSource`]. Holds paths only; every call re-reads the
/// backing files so edits take effect on the next request.
pub struct FileConfig {
    http_conf: PathBuf,
    registration_conf: PathBuf,
}

impl FileConfig {
    pub fn new(http_conf: PathBuf, registration_conf: PathBuf) -> Self {
        Self {
            http_conf,
            registration_conf,
        }
    }
}

impl ConfigSource for FileConfig {
    fn http_preferences(&self) -> HttpPreferences {
        let raw = match std::fs::read_to_string(&self.http_conf) {
            Ok(raw) => raw,
            Err(_) => return HttpPreferences::default(),
        };
        match toml::from_str(&raw) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(
                    path = %self.http_conf.display(),
                    error = %e,
                    "malformed HTTP preferences file, using defaults"
                );
                HttpPreferences::default()
            }
        }
    }

    fn is_registered(&self) -> bool {
        let raw = match std::fs::read_to_string(&self.registration_conf) {
            Ok(raw) => raw,
            Err(_) => return false,
        };
        parse_flat_conf(&raw)
            .get(REGISTERED_KEY)
            .is_some_and(|v| flag_is_set(v))
    }
}

// ── Flat conf parsing ─────────────────────────────────────────────────────────

/// Parses the appliance's flat `KEY = value` conf format.
///
/// One pair per line, `#` starts a comment, whitespace around keys and values
/// is ignored. Later occurrences of a key win.
pub fn parse_flat_conf(raw: &str) -> HashMap<String, String> {
    let mut pairs = HashMap::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if !key.is_empty() {
                pairs.insert(key.to_owned(), value.trim().to_owned());
            }
        }
    }
    pairs
}

fn flag_is_set(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
