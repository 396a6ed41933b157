//! Template compiler subsystem.
//!
//! # Data Flow
//! ```text
//! Host application
//!     → supplies a CompilerProvider at construction
//!     → CompilerHandle (lazy acquisition, runtime swap)
//!     → dyn TemplateCompiler (the port the pipeline calls)
//!
//! Per compile:
//!     (template name, captured source)
//!     → TemplateCompiler::compile
//!     → compiled text, or CompileError
//! ```
//!
//! # Design Decisions
//! - The port is a synchronous trait; the pipeline moves calls onto the
//!   blocking pool so a slow compile never stalls async workers
//! - Providers are injected values, never resolved from class names
//! - Swapping the provider invalidates the cached port; the next request
//!   acquires a fresh one

pub mod dustc;
pub mod handle;
pub mod port;

pub use dustc::{DustcCompiler, DustcProvider};
pub use handle::CompilerHandle;
pub use port::{CompileError, CompilerProvider, ProviderError, TemplateCompiler};
