//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use dustgate::cache::ScopeRegistry;
use dustgate::compiler::{CompileError, CompilerProvider, ProviderError, TemplateCompiler};
use dustgate::config::GateConfig;
use dustgate::HttpServer;

/// Start a simple mock upstream that returns a fixed body for any request.
pub async fn start_mock_upstream(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        // drain the request head before answering
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;

                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.len(),
                            response
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start the gate in front of the given upstream, returning its address and
/// the scope registry for cache assertions.
pub async fn start_gate(
    mut config: GateConfig,
    upstream: SocketAddr,
    provider: Box<dyn CompilerProvider>,
) -> (SocketAddr, Arc<ScopeRegistry>) {
    config.upstream.address = upstream.to_string();
    config.observability.metrics_enabled = false;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config, provider).unwrap();
    let scopes = server.filter().scopes.clone();

    tokio::spawn(async move {
        server.run(listener).await.unwrap();
    });

    (addr, scopes)
}

/// Compiler that tags its output and counts invocations.
pub struct CountingCompiler {
    calls: Arc<AtomicUsize>,
}

impl TemplateCompiler for CountingCompiler {
    fn compile(&self, name: &str, source: &str) -> Result<String, CompileError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("compiled({name}:{source})"))
    }
}

pub struct CountingProvider {
    pub calls: Arc<AtomicUsize>,
}

impl CountingProvider {
    #[allow(dead_code)]
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Self { calls: calls.clone() }, calls)
    }
}

impl CompilerProvider for CountingProvider {
    fn create_compiler(&self) -> Result<Box<dyn TemplateCompiler>, ProviderError> {
        Ok(Box::new(CountingCompiler {
            calls: self.calls.clone(),
        }))
    }
}

/// Compiler that rejects every template.
#[allow(dead_code)]
pub struct RejectingCompiler;

impl TemplateCompiler for RejectingCompiler {
    fn compile(&self, _name: &str, _source: &str) -> Result<String, CompileError> {
        Err(CompileError::Rejected {
            status: 1,
            stderr: "unbalanced braces".to_string(),
        })
    }
}

#[allow(dead_code)]
pub struct RejectingProvider;

impl CompilerProvider for RejectingProvider {
    fn create_compiler(&self) -> Result<Box<dyn TemplateCompiler>, ProviderError> {
        Ok(Box::new(RejectingCompiler))
    }
}
