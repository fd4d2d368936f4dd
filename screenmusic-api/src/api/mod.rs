//! HTTP API handlers for screenmusic-api

pub mod crud;
pub mod health;

pub use crud::crud_routes;
pub use health::health_routes;
