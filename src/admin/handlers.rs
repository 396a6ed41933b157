use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::cache::ScopeStats;
use crate::http::session::SessionKey;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct CacheSummary {
    pub scopes: usize,
    pub templates: usize,
    pub per_scope: Vec<ScopeStats>,
}

#[derive(Deserialize)]
pub struct PurgeParams {
    /// Cookie-keyed session to purge; omit to purge every scope.
    pub session: Option<String>,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

pub async fn get_cache(State(state): State<AdminState>) -> Json<CacheSummary> {
    let per_scope = state.scopes.stats();
    let templates = per_scope.iter().map(|s| s.templates).sum();

    Json(CacheSummary {
        scopes: per_scope.len(),
        templates,
        per_scope,
    })
}

pub async fn purge_cache(
    State(state): State<AdminState>,
    Query(params): Query<PurgeParams>,
) -> Json<serde_json::Value> {
    match params.session {
        // only cookie-keyed scopes are addressable by name; peer-keyed ones
        // go through a full purge
        Some(session) => {
            let dropped = state.scopes.drop_scope(&SessionKey::Cookie(session.clone()));
            tracing::info!(session = %session, dropped, "Admin purge of one scope");
            Json(serde_json::json!({ "session": session, "dropped": dropped }))
        }
        None => {
            let purged = state.scopes.purge();
            tracing::info!(purged, "Admin purge of all scopes");
            Json(serde_json::json!({ "purged_scopes": purged }))
        }
    }
}
