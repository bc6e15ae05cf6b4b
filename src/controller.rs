//! Application controller
//!
//! Components:
//! - `controller_handler`: turns a validated `Config` into a running web server.

pub mod controller_handler;

pub use controller_handler::Controller;
