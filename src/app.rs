use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/reports", get(handlers::get_reports))
        .route("/api/reservations", get(handlers::get_reservations))
        .route("/api/clients", get(handlers::get_clients))
        .route("/api/clients/:id/reservations", get(handlers::get_client_reservations))
        .route("/api/clients/:id/payments", get(handlers::get_client_payments))
        .route("/api/payments", get(handlers::get_payments))
        .route("/api/import-jobs", get(handlers::get_import_jobs))
        .with_state(state)
}
