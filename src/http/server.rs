//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the forwarding handler
//! - Wire up middleware (compile pipeline, tracing, timeout, request ID)
//! - Bind server to listener
//! - Forward non-intercepted requests to the upstream application

use std::str::FromStr;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, Scheme},
        Request, StatusCode, Uri,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use thiserror::Error;

use crate::compiler::CompilerProvider;
use crate::config::GateConfig;
use crate::filter::pipeline::{compile_middleware, FilterState};
use crate::filter::PatternError;
use crate::observability::metrics;

/// Errors that prevent the server from being constructed.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("invalid upstream address {0:?}")]
    Upstream(String),
}

/// Application state injected into the forwarding handler.
#[derive(Clone)]
pub struct AppState {
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
}

/// HTTP server for the compiling gate.
pub struct HttpServer {
    router: Router,
    config: GateConfig,
    filter: FilterState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and compiler
    /// provider. Fails if the name pattern is unusable; nothing is served in
    /// that case.
    pub fn new(
        config: GateConfig,
        provider: Box<dyn CompilerProvider>,
    ) -> Result<Self, ServerError> {
        let filter = FilterState::new(config.filter.clone(), provider)?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let upstream = Authority::from_str(&config.upstream.address)
            .map_err(|_| ServerError::Upstream(config.upstream.address.clone()))?;

        let state = AppState { client, upstream };
        let router = Self::build_router(&config, state, filter.clone());

        Ok(Self {
            router,
            config,
            filter,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GateConfig, state: AppState, filter: FilterState) -> Router {
        Router::new()
            .route("/{*path}", any(forward_handler))
            .route("/", any(forward_handler))
            .with_state(state)
            .layer(middleware::from_fn_with_state(filter, compile_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.address,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<std::net::SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Pipeline state, shared with the admin API.
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }
}

/// Forwards a request to the upstream application.
///
/// This is the `next` the pipeline wraps: when the pipeline intercepts, the
/// body produced here becomes template source instead of going to the client.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let (mut parts, body) = request.into_parts();
    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.upstream.clone());
    if let Ok(uri) = Uri::from_parts(uri_parts) {
        parts.uri = uri;
    }

    let upstream_request = Request::from_parts(parts, body);

    match state.client.request(upstream_request).await {
        Ok(response) => {
            let status = response.status();
            tracing::debug!(method = %method, path = %path, status = %status, "Upstream responded");
            metrics::record_request(&method, status.as_u16(), start);

            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(method = %method, path = %path, error = %e, "Upstream request failed");
            metrics::record_request(&method, 502, start);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
