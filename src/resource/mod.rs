//! Resource Cache Module
//!
//! Intercepts outgoing GET requests and serves them from versioned
//! namespaces under pluggable strategies chosen by URL pattern.

mod cache;
mod lifecycle;
mod namespace;
mod pattern;
mod persistent;
mod strategy;

pub use cache::ResourceCache;
pub use lifecycle::{ActivationReport, LifecycleState, NamespaceLifecycle};
pub use namespace::{
    is_stale_namespace, namespace_name, MemoryResponseStore, NamespaceKind, ResponseStore,
};
pub use pattern::{ResourcePattern, Route, RouteTable, UrlMatcher};
pub use persistent::{PersistentResponseStore, NAMESPACE_INDEX_STORE};
pub use strategy::{OfflineFallback, Strategy, StrategyExecutor, OFFLINE_FALLBACK_BODY};
