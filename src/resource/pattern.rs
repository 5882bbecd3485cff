//! Resource Cache Dispatcher
//!
//! Ordered URL patterns deciding which strategy and namespace serve a request.
//! The first matching pattern wins; unmatched requests fall back to
//! stale-while-revalidate (same origin) or network-first (cross origin),
//! both into the dynamic namespace.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::config::ResourceCacheConfig;
use crate::resource::{NamespaceKind, Strategy};

/// Predicate over the request URL.
pub type UrlMatcher = Arc<dyn Fn(&Url) -> bool + Send + Sync>;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "ico"];
const ASSET_EXTENSIONS: &[&str] = &["js", "css", "woff", "woff2", "ttf"];

#[derive(Clone)]
pub struct ResourcePattern {
    matcher: UrlMatcher,
    pub strategy: Strategy,
    pub namespace: NamespaceKind,
}

impl ResourcePattern {
    pub fn new(
        matcher: impl Fn(&Url) -> bool + Send + Sync + 'static,
        strategy: Strategy,
        namespace: NamespaceKind,
    ) -> Self {
        Self {
            matcher: Arc::new(matcher),
            strategy,
            namespace,
        }
    }

    /// Matches URLs whose path starts with `prefix`.
    pub fn path_prefix(
        prefix: impl Into<String>,
        strategy: Strategy,
        namespace: NamespaceKind,
    ) -> Self {
        let prefix = prefix.into();
        Self::new(
            move |url| url.path().starts_with(&prefix),
            strategy,
            namespace,
        )
    }

    /// Matches URLs whose last path segment ends in one of `extensions`
    /// (compared case-insensitively, without the dot).
    pub fn extensions(extensions: &[&str], strategy: Strategy, namespace: NamespaceKind) -> Self {
        let extensions: Vec<String> = extensions.iter().map(|e| e.to_ascii_lowercase()).collect();
        Self::new(
            move |url| path_extension(url).is_some_and(|ext| extensions.contains(&ext)),
            strategy,
            namespace,
        )
    }

    /// Matches exactly the given paths.
    pub fn exact_paths(paths: Vec<String>, strategy: Strategy, namespace: NamespaceKind) -> Self {
        Self::new(
            move |url| paths.iter().any(|p| p == url.path()),
            strategy,
            namespace,
        )
    }

    pub fn matches(&self, url: &Url) -> bool {
        (self.matcher)(url)
    }

    fn route(&self) -> Route {
        Route {
            strategy: self.strategy,
            namespace: self.namespace,
        }
    }
}

impl fmt::Debug for ResourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePattern")
            .field("strategy", &self.strategy)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

fn path_extension(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.last()?;
    let (_, ext) = segment.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// Strategy and namespace chosen for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub strategy: Strategy,
    pub namespace: NamespaceKind,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    origin: Url,
    patterns: Vec<ResourcePattern>,
}

impl RouteTable {
    pub fn new(origin: Url, patterns: Vec<ResourcePattern>) -> Self {
        Self { origin, patterns }
    }

    /// Routes used by the memory-sharing app:
    /// - `/api/` → network-first into `api`
    /// - images → cache-first into `images`
    /// - scripts, styles, fonts and the static manifest → cache-first into `static`
    pub fn with_defaults(config: &ResourceCacheConfig) -> Self {
        let patterns = vec![
            ResourcePattern::path_prefix("/api/", Strategy::NetworkFirst, NamespaceKind::Api),
            ResourcePattern::extensions(
                IMAGE_EXTENSIONS,
                Strategy::CacheFirst,
                NamespaceKind::Images,
            ),
            ResourcePattern::extensions(
                ASSET_EXTENSIONS,
                Strategy::CacheFirst,
                NamespaceKind::Static,
            ),
            ResourcePattern::exact_paths(
                config.static_manifest.clone(),
                Strategy::CacheFirst,
                NamespaceKind::Static,
            ),
        ];
        Self::new(config.origin.clone(), patterns)
    }

    /// Appends a pattern after the existing ones.
    pub fn push(&mut self, pattern: ResourcePattern) {
        self.patterns.push(pattern);
    }

    pub fn route(&self, url: &Url) -> Route {
        if let Some(pattern) = self.patterns.iter().find(|p| p.matches(url)) {
            return pattern.route();
        }

        let strategy = if self.is_same_origin(url) {
            Strategy::StaleWhileRevalidate
        } else {
            Strategy::NetworkFirst
        };
        Route {
            strategy,
            namespace: NamespaceKind::Dynamic,
        }
    }

    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
