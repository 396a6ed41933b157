//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → filter pipeline (may intercept and compile)
//!     → forward_handler (proxy to the upstream application)
//!     → session.rs (cache-scope identity for intercepted requests)
//!     → Send to client
//! ```

pub mod server;
pub mod session;

pub use server::{AppState, HttpServer, ServerError};
pub use session::SessionKey;
