//! HTTP API server with observability for the seat reservation engine.
//!
//! Exposes event inventory, reservations and cancellations over REST, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use reservation::ReservationEngine;
use seat_store::SeatStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: SeatStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/events", post(routes::events::create::<S>))
        .route("/events/{id}", get(routes::events::get::<S>))
        .route(
            "/events/{id}/capacity",
            put(routes::events::adjust_capacity::<S>),
        )
        .route("/events/{id}/bookings", post(routes::events::reserve::<S>))
        .route("/bookings/{id}", get(routes::bookings::get::<S>))
        .route("/bookings/{id}/cancel", post(routes::bookings::cancel::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wraps an engine in shared application state.
pub fn create_state<S: SeatStore>(engine: ReservationEngine<S>) -> Arc<AppState<S>> {
    Arc::new(AppState::new(engine))
}
