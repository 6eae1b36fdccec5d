use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    self, appointments, auth, availability, catalog, config, dashboard, webhooks,
};
use super::middleware::auth_middleware;
use super::AppState;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(auth::register));

    // Protected routes (require API key)
    let protected_routes = Router::new()
        // Account
        .route(
            "/v1/config",
            get(config::get_config).patch(config::update_config),
        )
        .route("/auth/key/rotate", post(auth::rotate_api_key))
        // Webhooks
        .route(
            "/v1/webhooks",
            post(webhooks::register_webhook).delete(webhooks::remove_webhook),
        )
        .route("/v1/webhooks/test", post(webhooks::test_webhook))
        // Catalog
        .route(
            "/v1/clients",
            get(catalog::list_clients).post(catalog::create_client),
        )
        .route(
            "/v1/clients/:id",
            get(catalog::get_client)
                .patch(catalog::update_client)
                .delete(catalog::delete_client),
        )
        .route(
            "/v1/services",
            get(catalog::list_services).post(catalog::create_service),
        )
        .route(
            "/v1/services/:id",
            get(catalog::get_service)
                .patch(catalog::update_service)
                .delete(catalog::delete_service),
        )
        .route(
            "/v1/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route(
            "/v1/staff",
            get(catalog::list_staff).post(catalog::create_staff),
        )
        .route(
            "/v1/staff/:id",
            get(catalog::get_staff)
                .patch(catalog::update_staff)
                .delete(catalog::delete_staff),
        )
        // Availability
        .route(
            "/v1/availability",
            post(availability::query_availability),
        )
        .route(
            "/v1/availability/check",
            post(availability::check_interval),
        )
        // Appointments
        .route(
            "/v1/appointments",
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route(
            "/v1/appointments/:id",
            get(appointments::get_appointment)
                .patch(appointments::update_appointment)
                .delete(appointments::delete_appointment),
        )
        .route(
            "/v1/appointments/:id/cancel",
            post(appointments::cancel_appointment),
        )
        // Dashboard
        .route("/v1/dashboard", get(dashboard::get_dashboard))
        .route("/v1/dashboard/stream", get(dashboard::stream_dashboard))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
