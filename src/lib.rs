//! lcp-dashboard - backend for a digital-license management dashboard.
//!
//! The crate authenticates a dashboard operator with stateless signed session
//! tokens and serves license statistics, per-user license lists, usage events
//! and oversharing reports. Licenses can be revoked through the same API.
//!
//! # Layout
//!
//! - `config`  → layered configuration (defaults, `config.toml`, `LCPDASH_*`)
//! - `errors`  → domain error type
//! - `models`  → wire types shared by the store and the HTTP layer
//! - `server`  → axum handlers, the session gate and the store abstraction

pub mod config;
pub mod errors;
pub mod models;

pub mod server;
