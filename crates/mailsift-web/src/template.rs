use std::path::PathBuf;

use thiserror::Error;

// ── Placeholder map ───────────────────────────────────────────────────────────

/// Ordered placeholder→value mapping handed to the renderer.
///
/// Tokens are fixed at compile time; values are computed per request.
/// Insertion order is preserved and setting an existing token replaces its
/// value in place.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderMap {
    entries: Vec<(&'static str, String)>,
}

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, token: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(t, _)| *t == token) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((token, value)),
        }
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(t, v)| (*t, v.as_str()))
    }
}

// ── Renderer ──────────────────────────────────────────────────────────────────

/// Rendering failure. Fatal for the request that triggered it.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template {name:?} not found")]
    Missing { name: String },

    #[error("template {name:?} could not be read: {source}")]
    Unreadable {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("template name {0:?} is not a plain file name")]
    InvalidName(String),
}

/// Merges a named template with a placeholder map into the final document.
pub trait Renderer: Send + Sync {
    fn render(&self, name: &str, replacements: &PlaceholderMap) -> Result<String, RenderError>;
}

/// Renderer over a directory of template files.
///
/// Template names must be plain file names; anything that could traverse out
/// of the directory is rejected before touching the filesystem.
pub struct FileTemplates {
    dir: PathBuf,
}

impl FileTemplates {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl Renderer for FileTemplates {
    fn render(&self, name: &str, replacements: &PlaceholderMap) -> Result<String, RenderError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(RenderError::InvalidName(name.to_owned()));
        }

        let path = self.dir.join(name);
        let mut text = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RenderError::Missing {
                    name: name.to_owned(),
                }
            } else {
                RenderError::Unreadable {
                    name: name.to_owned(),
                    source: e,
                }
            }
        })?;

        for (token, value) in replacements.iter() {
            text = text.replace(token, value);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates_with(name: &str, body: &str) -> (tempfile::TempDir, FileTemplates) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(name), body).unwrap();
        let renderer = FileTemplates::new(dir.path().to_path_buf());
        (dir, renderer)
    }

    #[test]
    fn replaces_every_token() {
        let (_dir, renderer) = templates_with("page.tmpl", "<p>__A__ and __B__</p>");
        let mut map = PlaceholderMap::new();
        map.set("__A__", "first");
        map.set("__B__", "second");
        let out = renderer.render("page.tmpl", &map).unwrap();
        assert_eq!(out, "<p>first and second</p>");
    }

    #[test]
    fn repeated_token_is_replaced_everywhere() {
        let (_dir, renderer) = templates_with("page.tmpl", "__X__/__X__");
        let mut map = PlaceholderMap::new();
        map.set("__X__", "v");
        assert_eq!(renderer.render("page.tmpl", &map).unwrap(), "v/v");
    }

    #[test]
    fn missing_template_is_a_distinct_error() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FileTemplates::new(dir.path().to_path_buf());
        let err = renderer
            .render("gone.tmpl", &PlaceholderMap::new())
            .unwrap_err();
        assert!(matches!(err, RenderError::Missing { .. }), "{err}");
    }

    #[test]
    fn rejects_names_with_path_components() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FileTemplates::new(dir.path().to_path_buf());
        for name in ["../etc/passwd", "a/b.tmpl", "a\\b.tmpl", ""] {
            let err = renderer.render(name, &PlaceholderMap::new()).unwrap_err();
            assert!(matches!(err, RenderError::InvalidName(_)), "{name:?}: {err}");
        }
    }

    #[test]
    fn placeholder_map_preserves_insertion_order() {
        let mut map = PlaceholderMap::new();
        map.set("__B__", "2");
        map.set("__A__", "1");
        let tokens: Vec<_> = map.iter().map(|(t, _)| t).collect();
        assert_eq!(tokens, ["__B__", "__A__"]);
    }

    #[test]
    fn placeholder_map_set_replaces_in_place() {
        let mut map = PlaceholderMap::new();
        map.set("__A__", "old");
        map.set("__Z__", "z");
        map.set("__A__", "new");
        assert_eq!(map.get("__A__"), Some("new"));
        let tokens: Vec<_> = map.iter().map(|(t, _)| t).collect();
        assert_eq!(tokens, ["__A__", "__Z__"]);
    }
}
