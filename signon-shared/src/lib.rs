#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(clippy::pedantic)]

//! Shared models and configuration for the `SignOn` login flow.
//!
//! The client library and the CLI both depend on this crate so the wire
//! shapes of the authentication endpoint live in exactly one place.

pub mod config;
pub mod models;
