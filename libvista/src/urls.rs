//! URL resolution collaborator.

/// Converts relative rendition paths to fetchable addresses.
///
/// Absolute URLs (scheme present) pass through untouched, root-relative paths
/// are joined to the configured origin, and bare paths are joined under the
/// media prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlResolver {
    origin: String,
    media_prefix: String,
}

impl UrlResolver {
    pub fn new(origin: impl Into<String>, media_prefix: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            media_prefix: media_prefix.into(),
        }
    }

    pub fn resolve(&self, path: &str) -> String {
        if has_scheme(path) {
            return path.to_string();
        }

        let origin = self.origin.trim_end_matches('/');
        if let Some(rest) = path.strip_prefix('/') {
            return format!("{origin}/{rest}");
        }

        let prefix = self.media_prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{origin}/{path}")
        } else {
            format!("{origin}/{prefix}/{path}")
        }
    }
}

impl Default for UrlResolver {
    fn default() -> Self {
        Self::new("", "media")
    }
}

fn has_scheme(path: &str) -> bool {
    match path.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
