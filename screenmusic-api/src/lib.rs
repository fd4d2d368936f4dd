//! screenmusic-api library
//!
//! Generic CRUD dispatch over capability services, with the artist resource
//! as the one concrete service.

use std::sync::Arc;

use axum::Router;
use screenmusic_common::{CorrelationRegistry, RequestLog};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod artist;
pub mod db;
pub mod dispatch;
pub mod envelope;

pub use dispatch::{Dispatcher, ResourceState, CORRELATION_HEADER};
pub use envelope::Envelope;

use artist::ArtistService;
use db::SqliteRequestLog;

/// Base path of the artist resource
pub const ARTIST_BASE_PATH: &str = "/api/artist";

/// Application state shared by every resource
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Collaborator minting correlation ids
    pub request_log: Arc<dyn RequestLog>,
    /// Live dispatcher → correlation id slots
    pub registry: CorrelationRegistry,
}

impl AppState {
    /// State logging requests to the same database
    pub fn new(db: SqlitePool) -> Self {
        let request_log = Arc::new(SqliteRequestLog::new(db.clone()));
        Self::with_request_log(db, request_log)
    }

    pub fn with_request_log(db: SqlitePool, request_log: Arc<dyn RequestLog>) -> Self {
        Self {
            db,
            request_log,
            registry: CorrelationRegistry::new(),
        }
    }

    fn resource<S: screenmusic_common::CrudService>(&self, service: S) -> ResourceState<S> {
        ResourceState::new(service, Arc::clone(&self.request_log), self.registry.clone())
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let artists = state.resource(ArtistService::new(state.db.clone()));

    Router::new()
        .merge(api::health_routes())
        .merge(api::crud_routes(ARTIST_BASE_PATH, artists))
        .layer(TraceLayer::new_for_http())
}
