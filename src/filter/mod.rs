//! Interception pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → name.rs (mount-relative path, pattern match, template name)
//!     → pipeline.rs (conditional short-circuit → cache → capture + compile)
//!     → capture.rs (buffers the inner service's body)
//!     → artifact.rs (fallback output when the compiler rejects the source)
//!     → compiled response (application/json, exact length, optional ETag)
//! ```
//!
//! # Design Decisions
//! - Non-matching traffic is forwarded untouched; the pipeline only ever
//!   replaces responses it fully owns
//! - Within one request the steps run strictly in order: match →
//!   short-circuit → cache check → capture + compile → cache write → emit

pub mod artifact;
pub mod capture;
pub mod name;
pub mod pipeline;

pub use capture::{CaptureBuffer, CaptureError};
pub use name::{NamePattern, PatternError};
pub use pipeline::{compile_middleware, FilterState};
