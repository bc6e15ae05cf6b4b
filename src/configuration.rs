//! Configuration
//!
//! Components:
//! - `config`: the TOML-backed `Config` and the command-line `Args` overriding it.
//! - `types`: nested tables such as the startup `[seed]` data.

pub mod config;
pub mod types;

pub use config::{Args, Config};
pub use types::SeedConfig;
