//! Web interface
//!
//! Components:
//! - `routes`: one warp filter per endpoint plus the rejection handler.
//! - `types`: request and error payloads.
//! - `web_server`: route composition and the serving loop.

pub mod routes;
#[cfg(test)]
mod tests;
pub mod types;
pub mod web_server;

pub use types::ApiError;
pub use web_server::WebServer;
