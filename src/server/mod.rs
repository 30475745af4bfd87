// src/server/mod.rs

//! Server-side components.
//!
//! - `auth`        → session token issuing and the request gate
//! - `credentials` → operator credential verification
//! - `login`       → `POST /login`
//! - `handlers`    → shared state and the `/dashboard/*` handlers
//! - `pagination`  → `page` / `per_page` resolution
//! - `store`       → the `DashboardStore` trait and the in-memory store
//! - `sample_data` → records seeded into the in-memory store
//! - `api_error`   → JSON error envelope
//! - `logging`     → tracing setup, request logging and audit events
//! - `routes`      → router builder
//! - `validation`  → request field validation

pub mod api_error;
pub mod auth;
pub mod credentials;
pub mod handlers;
pub mod logging;
pub mod login;
pub mod pagination;
pub mod routes;
pub mod sample_data;
pub mod store;
pub mod validation;

pub use api_error::{ApiError, ErrorCode};
pub use auth::{require_session, AuthError, Claims, IssuedToken, Principal, SessionTokens};
pub use credentials::{CredentialVerifier, StaticCredentials};
pub use handlers::AppState;
pub use login::{login_handler, LoginRequest, LoginResponse, LoginSettings, UserProfile};
pub use pagination::Pagination;
pub use routes::build_router;
pub use store::{DashboardStore, InMemoryStore};
