//! Template caching subsystem.
//!
//! # Data Flow
//! ```text
//! Session key (cookie or peer address)
//!     → ScopeRegistry::scope (lazily creates the session's cache)
//!     → TemplateCache::get / put (compiled text keyed by template name)
//!
//! Admin purge:
//!     ScopeRegistry::drop_scope / purge
//!     → scope dropped, entries released
//! ```
//!
//! # Design Decisions
//! - One cache per session; a scope is only created when a request from
//!   that session actually reaches the cache path
//! - No eviction: entries live until their scope is dropped
//! - Concurrent get/put from parallel requests in the same session is safe;
//!   last writer wins for the same name

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

use crate::http::session::SessionKey;

/// Compiled-template store for one session.
///
/// Keys are template names, values the compiled output. `put` overwrites any
/// prior entry for the same name.
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: DashMap<String, String>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Look up the compiled text for a template name.
    pub fn get(&self, name: &str) -> Option<String> {
        self.entries.get(name).map(|r| r.value().clone())
    }

    /// Store compiled text under a template name, replacing any prior entry.
    pub fn put(&self, name: impl Into<String>, compiled: impl Into<String>) {
        self.entries.insert(name.into(), compiled.into());
    }

    /// Number of templates held by this scope.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-scope summary exposed by the admin API.
#[derive(Debug, Serialize)]
pub struct ScopeStats {
    pub session: String,
    pub templates: usize,
}

/// Registry of per-session caches.
///
/// Scopes are created lazily on first access and live until explicitly
/// dropped. The registry itself does not bound the number of scopes or the
/// size of any scope; the admin surface exposes both for operators.
#[derive(Debug, Default)]
pub struct ScopeRegistry {
    scopes: DashMap<SessionKey, Arc<TemplateCache>>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self {
            scopes: DashMap::new(),
        }
    }

    /// The cache for a session, created on first use.
    pub fn scope(&self, key: &SessionKey) -> Arc<TemplateCache> {
        self.scopes
            .entry(key.clone())
            .or_insert_with(|| Arc::new(TemplateCache::new()))
            .clone()
    }

    /// Drop one session's cache. Returns true if a scope existed.
    pub fn drop_scope(&self, key: &SessionKey) -> bool {
        self.scopes.remove(key).is_some()
    }

    /// Drop every scope. Returns the number of scopes removed.
    pub fn purge(&self) -> usize {
        let count = self.scopes.len();
        self.scopes.clear();
        count
    }

    /// Number of live scopes.
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Snapshot of all scopes for admin introspection.
    pub fn stats(&self) -> Vec<ScopeStats> {
        self.scopes
            .iter()
            .map(|r| ScopeStats {
                session: r.key().to_string(),
                templates: r.value().len(),
            })
            .collect()
    }
}
