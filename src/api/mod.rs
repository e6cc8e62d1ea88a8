//! HTTP surface over [`IntakeService`].

pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::warn;

use crate::service::IntakeService;

pub use routes::{ChatMessageRequest, PreScreeningChatRequest, ValidationResponse};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<IntakeService>,
}

/// Build the router with the validation, chat and health routes.
pub fn router(service: Arc<IntakeService>, cors_origins: &[String]) -> Router {
    routes::routes(AppState { service }).layer(cors_layer(cors_origins))
}

/// Credentialed CORS for the configured origins. Unparseable origins are skipped.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
