//! Post-render substitution of portals and cache spans

use ulid::Ulid;

use crate::cache::CacheStore;
use crate::diagnostics::{DiagnosticCategory, Diagnostics};

/// Unique marker left in the output for later substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub marker: String,
}

impl Placeholder {
    /// Comment marking where a portal's fragments go
    pub fn portal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            marker: format!("<!--{}-->", Ulid::new()),
        }
    }

    /// Comment bracketing a cache span
    pub fn cache(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            marker: format!("<!--[{}]-->", Ulid::new()),
        }
    }
}

/// HTML rendered by a fragment, keyed by its target portal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub portal: String,
    pub html: String,
}

/// Finish a render
///
/// Portal markers are replaced by the concatenation of their fragments in
/// the order the fragments were rendered. Every cache span whose markers
/// appear exactly once each is stored; markers are then removed and the
/// result trimmed.
pub fn resolve(
    mut html: String,
    portals: &[Placeholder],
    fragments: &[Fragment],
    caches: &[Placeholder],
    store: &CacheStore,
    diagnostics: &mut Diagnostics,
) -> String {
    for portal in portals {
        let content: String = fragments
            .iter()
            .filter(|fragment| fragment.portal == portal.name)
            .map(|fragment| fragment.html.as_str())
            .collect();
        html = html.replace(&portal.marker, &content);
    }

    let strip = |text: &str| {
        caches
            .iter()
            .fold(text.to_string(), |acc, cache| acc.replace(&cache.marker, ""))
    };

    for cache in caches {
        let parts: Vec<&str> = html.split(&cache.marker).collect();
        match parts.as_slice() {
            [_, span, _] => {
                store.insert(cache.name.as_str(), strip(span));
                tracing::debug!(name = %cache.name, "stored cache span");
            }
            _ => diagnostics.push(
                DiagnosticCategory::Cache,
                format!("<ssr-cache name=\"{}\"> failed", cache.name),
            ),
        }
    }

    strip(&html).trim().to_string()
}
