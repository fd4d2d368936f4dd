//! Capability contract for CRUD resources
//!
//! Every resource served through the generic dispatcher implements
//! [`CrudService`]. The dispatcher holds the service only through this trait.
//!
//! # Design
//!
//! Each operation receives the [`RequestContext`] of the request it runs for
//! and returns a [`Reply`] with its own notifications. A service never keeps
//! notifications between calls.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::correlation::RequestContext;
use crate::reply::Reply;

/// CRUD capability contract
#[async_trait]
pub trait CrudService: Send + Sync + 'static {
    /// Payload accepted by `create`
    type CreateInput: DeserializeOwned + Send + 'static;
    /// Payload accepted by `update`
    type UpdateInput: DeserializeOwned + Send + 'static;
    /// Representation returned by reads
    type Output: Serialize + Send + 'static;
    /// Natural-key lookup payload accepted by `get_by_identifier`
    type IdentifierInput: DeserializeOwned + Send + 'static;

    async fn get_all(&self, ctx: &RequestContext) -> Reply<Vec<Self::Output>>;

    /// Unknown ids may be reported either as a negative notification or a fault
    async fn get(&self, ctx: &RequestContext, id: i64) -> Reply<Self::Output>;

    async fn get_by_identifier(
        &self,
        ctx: &RequestContext,
        identifier: Self::IdentifierInput,
    ) -> Reply<Self::Output>;

    /// Returns the new record's id as text
    async fn create(&self, ctx: &RequestContext, input: Self::CreateInput) -> Reply<String>;

    async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        input: Self::UpdateInput,
    ) -> Reply<String>;

    async fn delete(&self, ctx: &RequestContext, id: i64) -> Reply<bool>;
}
