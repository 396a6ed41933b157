//! Compiler port and provider contracts.

use thiserror::Error;

/// Errors from a template compilation attempt.
///
/// The pipeline treats every variant the same way: log, then serve the
/// fallback artifact.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The compiler process could not be started or written to.
    #[error("failed to run compiler: {0}")]
    Io(#[from] std::io::Error),

    /// The compiler rejected the template source.
    #[error("compiler exited with {status}: {stderr}")]
    Rejected { status: i32, stderr: String },

    /// The compiler produced output that is not valid UTF-8.
    #[error("compiler output is not valid UTF-8")]
    InvalidOutput,

    /// The compiler call panicked or was aborted before completing.
    #[error("compiler call did not complete: {0}")]
    Aborted(String),
}

/// Errors while obtaining a compiler from a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The configured compiler is not usable on this host.
    #[error("compiler unavailable: {0}")]
    Unavailable(String),
}

/// Converts raw template source text into compiled output.
///
/// Calls may be costly and are made from the blocking pool. Implementations
/// must be safe to call from concurrent requests: either be stateless per
/// call (like [`super::DustcCompiler`], which spawns a process each time) or
/// serialize access to shared interpreter state internally.
pub trait TemplateCompiler: Send + Sync {
    /// Compile one named template, or fail for invalid source.
    fn compile(&self, name: &str, source: &str) -> Result<String, CompileError>;
}

/// Factory producing a [`TemplateCompiler`].
///
/// Supplied by the host application at pipeline construction. Acquisition may
/// fail (missing binary, broken engine); the pipeline recovers per request by
/// passing traffic through uncompiled.
pub trait CompilerProvider: Send + Sync {
    fn create_compiler(&self) -> Result<Box<dyn TemplateCompiler>, ProviderError>;
}
