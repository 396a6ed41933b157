//! The interception pipeline.
//!
//! # Responsibilities
//! - Decide per request whether to intervene
//! - Short-circuit conditional requests before cache and compiler
//! - Serve cached compiles, or capture the upstream body and compile it
//! - Emit the compiled artifact with exact length and optional ETag
//!
//! # Design Decisions
//! - Implemented as axum middleware: the inner service is the `next` the
//!   contract talks about, and it runs at most once per request
//! - Compile failures degrade to a fallback artifact with success status;
//!   only capture/encoding failures surface as request errors
//! - A provider failure skips the pipeline entirely for that request; the
//!   surrounding chain must never crash because the compiler is broken

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::cache::{ScopeRegistry, TemplateCache};
use crate::compiler::{CompileError, CompilerHandle, CompilerProvider, TemplateCompiler};
use crate::config::FilterConfig;
use crate::filter::artifact::fallback_artifact;
use crate::filter::capture::{CaptureBuffer, CaptureError};
use crate::filter::name::{relative_path, NamePattern, PatternError};
use crate::http::session::SessionKey;
use crate::observability::metrics;

/// Shared state for the pipeline middleware.
#[derive(Clone)]
pub struct FilterState {
    pub settings: Arc<FilterConfig>,
    pub pattern: Arc<NamePattern>,
    pub compiler: Arc<CompilerHandle>,
    pub scopes: Arc<ScopeRegistry>,
}

impl FilterState {
    /// Build pipeline state from validated settings and an injected provider.
    ///
    /// The pattern is compiled here so a bad one is fatal before any request
    /// is served.
    pub fn new(
        settings: FilterConfig,
        provider: Box<dyn CompilerProvider>,
    ) -> Result<Self, PatternError> {
        let pattern = NamePattern::new(&settings.name_pattern)?;
        Ok(Self {
            settings: Arc::new(settings),
            pattern: Arc::new(pattern),
            compiler: Arc::new(CompilerHandle::new(provider)),
            scopes: Arc::new(ScopeRegistry::new()),
        })
    }
}

/// Per-request directives read from the query string.
#[derive(Debug, PartialEq, Eq)]
struct QueryDirectives {
    /// Only the literal "true" (any case) opts this call into caching.
    cache: bool,
    /// Server-declared version token for this response.
    version: Option<String>,
}

fn query_directives(uri: &Uri) -> QueryDirectives {
    let mut directives = QueryDirectives {
        cache: false,
        version: None,
    };
    if let Some(query) = uri.query() {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "cache" => directives.cache = value.eq_ignore_ascii_case("true"),
                "version" => directives.version = Some(value.into_owned()),
                _ => {}
            }
        }
    }
    directives
}

/// The pipeline entry point, applied around the proxy router.
pub async fn compile_middleware(
    State(state): State<FilterState>,
    req: Request,
    next: Next,
) -> Response {
    let settings = &state.settings;

    let name = {
        let rel = match relative_path(req.uri().path(), &settings.mount_prefix) {
            Some(rel) => rel,
            None => return next.run(req).await,
        };
        match state.pattern.template_name(rel) {
            Some(name) => name,
            None => return next.run(req).await,
        }
    };

    let port = match state.compiler.port() {
        Ok(port) => port,
        Err(e) => {
            tracing::error!(
                error = %e,
                "Compiler is not set up correctly, skipping compilation for this request"
            );
            return next.run(req).await;
        }
    };

    let directives = query_directives(req.uri());

    // Conditional short-circuit: checked before cache and before `next`.
    if directives.cache && settings.etag_enabled {
        let client_token = req
            .headers()
            .get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok());
        if let (Some(version), Some(client)) = (directives.version.as_deref(), client_token) {
            if version == client {
                return not_modified();
            }
        }
    }

    let use_cache = directives.cache && settings.cache_enabled;
    let scope = if use_cache {
        let key = SessionKey::from_request(&req, &settings.session_cookie);
        Some(state.scopes.scope(&key))
    } else {
        None
    };

    let output = match scope.as_ref().and_then(|s| s.get(&name)) {
        Some(hit) => {
            tracing::info!(template = %name, "Template cache hit");
            metrics::record_cache_hit();
            hit
        }
        None => {
            if scope.is_some() {
                metrics::record_cache_miss();
            }
            let source = match capture_source(next.run(req).await).await {
                Ok(source) => source,
                Err(e) => {
                    tracing::error!(template = %name, error = %e, "Failed to capture template source");
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Failed to capture template source",
                    )
                        .into_response();
                }
            };
            compile_and_store(port, scope.as_deref(), &name, source).await
        }
    };

    emit(output, &directives, settings.etag_enabled)
}

#[derive(Debug, Error)]
enum CaptureFailure {
    #[error("error reading captured body: {0}")]
    Read(axum::Error),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

/// Drain the inner service's response into a capture buffer and decode it.
async fn capture_source(response: Response) -> Result<String, CaptureFailure> {
    let mut buffer = CaptureBuffer::new();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(CaptureFailure::Read)?;
    buffer.write_bytes(&bytes)?;
    tracing::debug!(bytes = buffer.len(), "Captured upstream response");
    Ok(buffer.into_string()?)
}

/// Run the port on the blocking pool, cache on success, degrade on failure.
async fn compile_and_store(
    port: Arc<Box<dyn TemplateCompiler>>,
    scope: Option<&TemplateCache>,
    name: &str,
    source: String,
) -> String {
    let start = Instant::now();
    let task_name = name.to_string();
    let result = tokio::task::spawn_blocking(move || port.compile(&task_name, &source))
        .await
        .unwrap_or_else(|join_error| Err(CompileError::Aborted(join_error.to_string())));

    match result {
        Ok(compiled) => {
            let elapsed = start.elapsed();
            metrics::record_compile(name, elapsed);
            tracing::info!(
                template = %name,
                elapsed_ms = elapsed.as_millis() as u64,
                "Template compiled"
            );
            match scope {
                Some(scope) => scope.put(name, compiled.as_str()),
                None => tracing::debug!(
                    template = %name,
                    "Template cache not in use, compile repeats on the next request"
                ),
            }
            compiled
        }
        Err(e) => {
            tracing::error!(template = %name, error = %e, "Failed to compile template");
            metrics::record_fallback();
            fallback_artifact(name)
        }
    }
}

fn not_modified() -> Response {
    match Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .body(Body::empty())
    {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build not-modified response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Final emission: fixed content type, exact encoded byte length, optional
/// version header. Request processing for this URI ends here.
fn emit(output: String, directives: &QueryDirectives, etag_enabled: bool) -> Response {
    let body = output.into_bytes();
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len());

    if directives.cache && etag_enabled {
        if let Some(token) = directives
            .version
            .as_deref()
            .and_then(|v| HeaderValue::from_str(v).ok())
        {
            builder = builder.header(header::ETAG, token);
        }
    }

    match builder.body(Body::from(body)) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build compiled response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ProviderError;
    use axum::routing::get;
    use axum::{middleware, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    struct EchoCompiler {
        calls: Arc<AtomicUsize>,
    }

    impl TemplateCompiler for EchoCompiler {
        fn compile(&self, name: &str, source: &str) -> Result<String, CompileError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("compiled({name}:{source})"))
        }
    }

    struct EchoProvider {
        calls: Arc<AtomicUsize>,
    }

    impl CompilerProvider for EchoProvider {
        fn create_compiler(&self) -> Result<Box<dyn TemplateCompiler>, ProviderError> {
            Ok(Box::new(EchoCompiler {
                calls: self.calls.clone(),
            }))
        }
    }

    struct BrokenProvider;

    impl CompilerProvider for BrokenProvider {
        fn create_compiler(&self) -> Result<Box<dyn TemplateCompiler>, ProviderError> {
            Err(ProviderError::Unavailable("no engine".into()))
        }
    }

    fn test_app(provider: Box<dyn CompilerProvider>, upstream_body: &'static str) -> Router {
        let state = FilterState::new(FilterConfig::default(), provider).unwrap();
        Router::new()
            .route("/{*path}", get(move || async move { upstream_body }))
            .layer(middleware::from_fn_with_state(state, compile_middleware))
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_query_directives() {
        let uri: Uri = "/t.dust.js?cache=true&version=v7".parse().unwrap();
        assert_eq!(
            query_directives(&uri),
            QueryDirectives {
                cache: true,
                version: Some("v7".to_string())
            }
        );

        let uri: Uri = "/t.dust.js?cache=TRUE".parse().unwrap();
        assert!(query_directives(&uri).cache);

        // anything but "true" means no caching for this call
        let uri: Uri = "/t.dust.js?cache=1".parse().unwrap();
        assert!(!query_directives(&uri).cache);

        let uri: Uri = "/t.dust.js".parse().unwrap();
        assert_eq!(
            query_directives(&uri),
            QueryDirectives {
                cache: false,
                version: None
            }
        );
    }

    #[tokio::test]
    async fn test_non_matching_path_passes_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = test_app(Box::new(EchoProvider { calls: calls.clone() }), "raw body");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/static/app.js")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "raw body");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_matching_path_is_compiled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = test_app(
            Box::new(EchoProvider { calls: calls.clone() }),
            "Hello {name}",
        );

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/template/foo.dust.js")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(
            body_string(response).await,
            "compiled(template/foo:Hello {name})"
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_conditional_match_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = test_app(Box::new(EchoProvider { calls: calls.clone() }), "ignored");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/template/foo.dust.js?cache=true&version=v1")
                    .header(header::IF_NONE_MATCH, "v1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(body_string(response).await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_version_mismatch_compiles_and_sets_etag() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = test_app(Box::new(EchoProvider { calls: calls.clone() }), "src");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/template/foo.dust.js?cache=true&version=v2")
                    .header(header::IF_NONE_MATCH, "v1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::ETAG).unwrap(), "v2");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_broken_provider_passes_through() {
        let app = test_app(Box::new(BrokenProvider), "raw template source");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/template/foo.dust.js")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // untouched upstream output, not a compile and not an error
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "raw template source");
    }

    #[tokio::test]
    async fn test_content_length_counts_bytes_not_chars() {
        let calls = Arc::new(AtomicUsize::new(0));
        // multi-byte content straight through the echo compiler
        let app = test_app(Box::new(EchoProvider { calls }), "grüße {name} ✓");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/template/foo.dust.js")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let declared: usize = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .unwrap()
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        let body = body_string(response).await;
        assert_eq!(declared, body.as_bytes().len());
        assert!(declared > body.chars().count());
    }
}
