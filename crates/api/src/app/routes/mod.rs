use axum::{routing::get, Router};

pub mod policies;
pub mod portal;
pub mod returns;
pub mod settings;
pub mod system;

/// Router for all merchant (tenant-scoped) endpoints.
pub fn merchant_router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/returns", returns::router())
        .nest("/policies", policies::router())
        .nest("/settings", settings::router())
}
