//! Swappable access to the current compiler port.

use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};

use crate::compiler::port::{CompilerProvider, ProviderError, TemplateCompiler};

/// Holds the active provider and the port acquired from it.
///
/// The port is acquired lazily on first use and cached. Installing a new
/// provider drops the cached port, so the request after a swap talks to the
/// new provider's compiler. Two concurrent first requests may each acquire a
/// port; the later store wins and both are valid.
pub struct CompilerHandle {
    provider: ArcSwap<Box<dyn CompilerProvider>>,
    port: ArcSwapOption<Box<dyn TemplateCompiler>>,
}

impl CompilerHandle {
    pub fn new(provider: Box<dyn CompilerProvider>) -> Self {
        Self {
            provider: ArcSwap::from_pointee(provider),
            port: ArcSwapOption::empty(),
        }
    }

    /// The current port, acquiring one from the provider if none is cached.
    pub fn port(&self) -> Result<Arc<Box<dyn TemplateCompiler>>, ProviderError> {
        if let Some(port) = self.port.load_full() {
            return Ok(port);
        }
        let created = Arc::new(self.provider.load().create_compiler()?);
        self.port.store(Some(created.clone()));
        tracing::info!("Compiler acquired from provider");
        Ok(created)
    }

    /// Install a new provider and invalidate the cached port.
    pub fn swap_provider(&self, provider: Box<dyn CompilerProvider>) {
        self.provider.store(Arc::new(provider));
        self.port.store(None);
        tracing::info!("Compiler provider swapped, port invalidated");
    }
}
