//! # Configuration
//!
//! Client configuration for the login flow: where the authentication
//! endpoint lives, how long to wait for it, and where session artifacts are
//! stored.

pub mod client;


pub use client::{ClientConfig, ConfigError};
