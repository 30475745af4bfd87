use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::server::api_error::method_not_allowed_as_json;
use crate::server::auth::require_session;
use crate::server::handlers::{
    dashboard_data_handler, delete_publication_handler, health_handler, license_events_handler,
    not_found_handler, overshared_handler, publications_handler, revoke_license_handler,
    user_licenses_handler, AppState,
};
use crate::server::logging::request_logging_middleware;
use crate::server::login::login_handler;

/// Build the main application router for the dashboard server.
///
/// This is a convenience helper so `main.rs` or tests can
/// construct the router in a single call.
///
/// # Routes
///
/// ## Public
/// - `POST /login` - Exchange credentials for a session token
/// - `GET /health` - Liveness check
///
/// ## Session required (Bearer header or `token` cookie)
/// - `GET /dashboard/data` - Aggregate statistics
/// - `GET /dashboard/overshared` - Licenses over the device limit
/// - `PUT /dashboard/revoke/:license_id` - Revoke a license
/// - `GET /dashboard/user-licenses/:user_id` - Licenses held by a user
/// - `GET /dashboard/license-events/:license_id` - Device history of a license
/// - `GET /dashboard/publications` - Paged catalog (`page`, `per_page`)
/// - `DELETE /dashboard/publications/:uuid` - Remove a publication
///
/// Any other path answers with a JSON `404`, and a known path called with
/// the wrong method with a JSON `405`.
pub fn build_router(state: AppState) -> Router {
    let dashboard = Router::new()
        .route("/dashboard/data", get(dashboard_data_handler))
        .route("/dashboard/overshared", get(overshared_handler))
        .route("/dashboard/revoke/:license_id", put(revoke_license_handler))
        .route(
            "/dashboard/user-licenses/:user_id",
            get(user_licenses_handler),
        )
        .route(
            "/dashboard/license-events/:license_id",
            get(license_events_handler),
        )
        .route("/dashboard/publications", get(publications_handler))
        .route(
            "/dashboard/publications/:uuid",
            delete(delete_publication_handler),
        )
        // route_layer: unmatched paths still reach the fallback unauthenticated
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/login", post(login_handler))
        .route("/health", get(health_handler))
        .merge(dashboard)
        .fallback(not_found_handler)
        .layer(middleware::from_fn(method_not_allowed_as_json))
        .layer(middleware::from_fn(request_logging_middleware))
        .with_state(state)
}
