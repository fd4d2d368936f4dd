//! Request correlation
//!
//! Every request handled by a dispatcher gets one correlation id, minted by a
//! [`RequestLog`] before the capability operation runs. The id is:
//! - registered in the [`CorrelationRegistry`] under the dispatcher's own
//!   [`DispatcherId`] for as long as the request lives
//! - threaded into every capability call through [`RequestContext`]
//!
//! The registry is keyed per dispatcher, so concurrent requests each own a
//! separate slot.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{Error, Result};

/// Opaque id tying a request to the work done on its behalf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for CorrelationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of one dispatcher instance (one per request)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatcherId(Uuid);

impl DispatcherId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DispatcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Request-scoped context handed to every capability operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub dispatcher_id: DispatcherId,
    pub correlation_id: CorrelationId,
}

impl RequestContext {
    /// Context not bound to any registry slot (background work, tests)
    pub fn detached() -> Self {
        Self {
            dispatcher_id: DispatcherId::generate(),
            correlation_id: CorrelationId::generate(),
        }
    }
}

/// Process-wide dispatcher → correlation id association
///
/// Cloning shares the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct CorrelationRegistry {
    slots: Arc<RwLock<HashMap<DispatcherId, CorrelationId>>>,
}

impl CorrelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the id for a dispatcher
    ///
    /// Each dispatcher registers exactly once; a second registration for the
    /// same dispatcher is rejected and leaves the first id in place. The slot
    /// is released when the returned guard drops.
    pub fn register(
        &self,
        dispatcher_id: DispatcherId,
        correlation_id: CorrelationId,
    ) -> Result<CorrelationGuard> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = slots.get(&dispatcher_id) {
            return Err(Error::Internal(format!(
                "dispatcher {} already bound to correlation id {}",
                dispatcher_id, existing
            )));
        }
        slots.insert(dispatcher_id, correlation_id);
        debug!(%dispatcher_id, %correlation_id, "Correlation id registered");

        Ok(CorrelationGuard {
            registry: self.clone(),
            dispatcher_id,
        })
    }

    pub fn lookup(&self, dispatcher_id: DispatcherId) -> Option<CorrelationId> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&dispatcher_id)
            .copied()
    }

    /// Number of requests currently holding a slot
    pub fn active(&self) -> usize {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn release(&self, dispatcher_id: DispatcherId) {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&dispatcher_id);
    }
}

/// Registry slot held for the lifetime of a request
#[derive(Debug)]
pub struct CorrelationGuard {
    registry: CorrelationRegistry,
    dispatcher_id: DispatcherId,
}

impl Drop for CorrelationGuard {
    fn drop(&mut self) {
        self.registry.release(self.dispatcher_id);
    }
}

/// Request log collaborator ("begin request" / "finish request")
#[async_trait]
pub trait RequestLog: Send + Sync {
    /// Record the start of a request and mint its correlation id
    async fn begin_request(&self, method: &str, path: &str) -> Result<CorrelationId>;

    /// Record the status the request finished with
    async fn finish_request(&self, _correlation_id: CorrelationId, _status: u16) -> Result<()> {
        Ok(())
    }
}

/// Request log that keeps nothing and only mints ids
#[derive(Debug, Clone, Copy, Default)]
pub struct EphemeralRequestLog;

#[async_trait]
impl RequestLog for EphemeralRequestLog {
    async fn begin_request(&self, _method: &str, _path: &str) -> Result<CorrelationId> {
        Ok(CorrelationId::generate())
    }
}
