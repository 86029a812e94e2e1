//! Route registration

use super::handlers;
use crate::domain::Service;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;

/// Multipart framing on top of the raw file bytes
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Register all REST routes
pub fn register_routes(router: Router, service: Arc<Service>, max_upload_bytes: usize) -> Router {
    router
        .route("/health", get(handlers::health))
        // Documents
        .route(
            "/documents",
            get(handlers::list_documents).post(handlers::upload_document),
        )
        .route(
            "/documents/{id}",
            get(handlers::get_document)
                .put(handlers::update_document)
                .delete(handlers::delete_document),
        )
        // Watchlist reports
        .route(
            "/watchlist-reports",
            get(handlers::list_reports).post(handlers::create_report),
        )
        .route(
            "/watchlist-reports/{id}",
            get(handlers::get_report)
                .put(handlers::update_report)
                .delete(handlers::delete_report),
        )
        .route("/watchlist-reports/{id}/entries", get(handlers::list_entries))
        .route(
            "/watchlist-reports/{id}/matches/{party_type}",
            get(handlers::list_matches).post(handlers::create_match),
        )
        // Match records
        .route(
            "/matches/{party_type}/{id}",
            get(handlers::get_match)
                .put(handlers::update_match)
                .delete(handlers::delete_match),
        )
        // External snapshots
        .route("/external-snapshots", get(handlers::list_snapshots))
        .route("/external-snapshots/sync", post(handlers::sync_snapshots))
        // Users
        .route("/users/register", post(handlers::register_user))
        .route("/users/{id}", get(handlers::get_user))
        .route("/users/{id}/otp", post(handlers::request_otp))
        .route("/users/{id}/otp/verify", post(handlers::verify_otp))
        .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD))
        .layer(Extension(service))
}
