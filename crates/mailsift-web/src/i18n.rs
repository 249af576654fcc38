use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

/// Message key for the logged-out confirmation line. Parameter `{0}` is the
/// console origin the user can return to.
pub const BEEN_LOGGED_OUT: &str = "BEENLOGGEDOUT";

/// Resolves a message key plus positional parameters to a display string.
///
/// Lookup fails closed: an unknown key resolves to the key itself, so a
/// missing translation never takes a page down.
pub trait Localizer: Send + Sync {
    fn translate(&self, key: &str, params: &[&str]) -> String;
}

/// Message catalog with built-in English strings and optional overrides
/// loaded from a TOML table of `key = "message"` pairs.
pub struct Catalog {
    messages: HashMap<String, String>,
}

impl Catalog {
    /// The built-in English catalog.
    pub fn builtin() -> Self {
        let mut messages = HashMap::new();
        messages.insert(
            BEEN_LOGGED_OUT.to_owned(),
            "You have been logged out. Click <a href=\"{0}\">here</a> to return to the login page."
                .to_owned(),
        );
        Self { messages }
    }

    /// Built-in catalog with overrides from `path` merged on top.
    ///
    /// A missing or malformed override file leaves the built-ins in place;
    /// the problem is logged, never surfaced.
    pub fn with_overrides(path: &Path) -> Self {
        let mut catalog = Self::builtin();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "language file unreadable, using built-in strings");
                return catalog;
            }
        };
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(overrides) => catalog.messages.extend(overrides),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed language file, using built-in strings");
            }
        }
        catalog
    }
}

impl Localizer for Catalog {
    fn translate(&self, key: &str, params: &[&str]) -> String {
        match self.messages.get(key) {
            Some(template) => substitute(template, params),
            None => key.to_owned(),
        }
    }
}

/// Replaces `{0}`, `{1}`, … with the matching positional parameter.
/// Placeholders without a parameter are left as-is.
fn substitute(template: &str, params: &[&str]) -> String {
    let mut out = template.to_owned();
    for (i, value) in params.iter().enumerate() {
        out = out.replace(&format!("{{{i}}}"), value);
    }
    out
}
