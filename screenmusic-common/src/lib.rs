//! # ScreenMusic Common Library
//!
//! Shared code for the ScreenMusic API including:
//! - Notification model (business-rule messages with severity)
//! - Capability contract every CRUD resource service implements
//! - Per-call reply and fault types
//! - Correlation ids and the request log boundary
//! - Configuration loading

pub mod config;
pub mod correlation;
pub mod error;
pub mod notification;
pub mod reply;
pub mod service;

pub use correlation::{CorrelationId, CorrelationRegistry, DispatcherId, RequestContext, RequestLog};
pub use error::{Error, Result};
pub use notification::{MessageType, Notification, Notifications};
pub use reply::{Incident, Reply, ServiceFault};
pub use service::CrudService;
