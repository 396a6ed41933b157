//! Template-Compiling Reverse Proxy Library

pub mod admin;
pub mod cache;
pub mod compiler;
pub mod config;
pub mod filter;
pub mod http;
pub mod observability;

pub use config::schema::GateConfig;
pub use filter::FilterState;
pub use http::HttpServer;
