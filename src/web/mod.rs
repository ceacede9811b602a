//! Web layer - HTTP interface for the ledger
//!
//! Routes map one-to-one onto core operations. Pages are returned as JSON
//! documents holding everything a template would need; successful form posts
//! answer with `303 See Other` redirects.

/// Cascading option endpoints for dependent dropdowns
pub mod api;
/// `IntoResponse` mapping for crate errors
pub mod error;
/// Last-value-wins access to raw query pairs
pub mod query;
/// Record list, form and delete handlers
pub mod records;
/// Reference data page and management handlers
pub mod reference;

use crate::errors::Result;
use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
}

impl AppState {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(records::index))
        .route(
            "/record/create/",
            get(records::create_form).post(records::create),
        )
        .route(
            "/record/:id/edit/",
            get(records::edit_form).post(records::edit),
        )
        .route(
            "/record/:id/delete/",
            get(records::delete_confirm).post(records::delete),
        )
        .route("/api/categories-by-type/", get(api::categories_by_type))
        .route(
            "/api/subcategories-by-category/",
            get(api::subcategories_by_category),
        )
        .route("/reference/", get(reference::index))
        .route("/reference/:kind/create/", post(reference::create))
        .route("/reference/:kind/:id/edit/", post(reference::update))
        .route("/reference/:kind/:id/delete/", post(reference::delete))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Binds `addr` and serves the application until the process stops.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
