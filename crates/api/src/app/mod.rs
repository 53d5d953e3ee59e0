//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: store selection and boundary-service wiring
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app() -> Router {
    build_app_with(Arc::new(services::build_services().await))
}

/// Build the router around pre-wired services. Tests use this to seed the
/// order catalog before the server starts.
pub fn build_app_with(services: Arc<AppServices>) -> Router {
    // Merchant dashboard routes: require the tenant header.
    let merchant = routes::merchant_router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn(middleware::merchant_middleware));

    // Customer portal routes: tenant is resolved from the order.
    let portal = routes::portal::router().layer(Extension(services));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/portal", portal)
        .merge(merchant)
}
