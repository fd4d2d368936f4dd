//! Artist resource
//!
//! [`ArtistService`] is the capability service behind `/api/artist`. Rule
//! violations come back as notifications:
//! - blank or over-long name → negative
//! - name already used by another artist → negative
//! - unknown id or name → negative "not found"
//! - successful writes → positive (never sent to the client)
//!
//! A blank identifier lookup is a business fault with one incident; database
//! errors are unexpected faults.

pub mod models;

use async_trait::async_trait;
use screenmusic_common::{
    CrudService, Incident, Notification, Notifications, Reply, RequestContext, Result,
    ServiceFault,
};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::db::artists::{self, ArtistFields};
use models::{ArtistIdentifier, ArtistOutput, CreateArtist, UpdateArtist, MAX_NAME_LEN};

/// Message for unknown ids and names
pub const NOT_FOUND: &str = "not found";

/// Artist capability service over SQLite
#[derive(Debug, Clone)]
pub struct ArtistService {
    pool: SqlitePool,
}

impl ArtistService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Field rules shared by create and update
    fn validate(fields: &ArtistFields) -> Notifications {
        let mut notifications = Notifications::new();
        let name = fields.name.trim();

        if name.is_empty() {
            notifications.push(Notification::negative("Name is required"));
        } else if name.chars().count() > MAX_NAME_LEN {
            notifications.push(Notification::negative(format!(
                "Name must be at most {} characters",
                MAX_NAME_LEN
            )));
        }

        notifications
    }

    /// Negative notification if `name` belongs to an artist other than `own_id`
    async fn check_name_free(&self, name: &str, own_id: Option<i64>) -> Result<Notifications> {
        let mut notifications = Notifications::new();
        if let Some(existing) = artists::load_artist_by_name(&self.pool, name).await? {
            if Some(existing.id) != own_id {
                notifications.push(Notification::negative(format!(
                    "Artist '{}' already exists",
                    existing.name
                )));
            }
        }
        Ok(notifications)
    }

    /// Rejection for a write that lost the name to a concurrent writer
    async fn name_taken<T>(&self, name: &str, own_id: Option<i64>) -> Result<Reply<T>> {
        let clash = self.check_name_free(name, own_id).await?;
        if clash.has_negative() {
            return Ok(Reply::rejected(clash));
        }
        // The conflicting row is gone again
        Ok(Reply::negative(format!("Artist '{}' already exists", name)))
    }

    async fn try_get_all(&self) -> Result<Reply<Vec<ArtistOutput>>> {
        let all = artists::list_artists(&self.pool).await?;
        Ok(Reply::value(all.into_iter().map(ArtistOutput::from).collect()))
    }

    async fn try_get(&self, id: i64) -> Result<Reply<ArtistOutput>> {
        Ok(match artists::load_artist(&self.pool, id).await? {
            Some(artist) => Reply::value(artist.into()),
            None => Reply::negative(NOT_FOUND),
        })
    }

    async fn try_get_by_identifier(&self, name: &str) -> Result<Reply<ArtistOutput>> {
        Ok(match artists::load_artist_by_name(&self.pool, name).await? {
            Some(artist) => Reply::value(artist.into()),
            None => Reply::negative(NOT_FOUND),
        })
    }

    async fn try_create(&self, fields: ArtistFields) -> Result<Reply<String>> {
        let notifications = Self::validate(&fields);
        if notifications.has_negative() {
            return Ok(Reply::rejected(notifications));
        }

        let clash = self.check_name_free(&fields.name, None).await?;
        if clash.has_negative() {
            return Ok(Reply::rejected(clash));
        }

        let id = match artists::insert_artist(&self.pool, &fields).await {
            Ok(id) => id,
            Err(e) if e.is_unique_violation() => {
                debug!(name = %fields.name, "Lost name to a concurrent create");
                return self.name_taken(&fields.name, None).await;
            }
            Err(e) => return Err(e),
        };
        info!(artist_id = id, "Artist created");

        Ok(Reply::value(id.to_string()).notify(Notification::positive("Artist created")))
    }

    async fn try_update(&self, id: i64, fields: ArtistFields) -> Result<Reply<String>> {
        let notifications = Self::validate(&fields);
        if notifications.has_negative() {
            return Ok(Reply::rejected(notifications));
        }

        if artists::load_artist(&self.pool, id).await?.is_none() {
            return Ok(Reply::negative(NOT_FOUND));
        }

        let clash = self.check_name_free(&fields.name, Some(id)).await?;
        if clash.has_negative() {
            return Ok(Reply::rejected(clash));
        }

        match artists::update_artist(&self.pool, id, &fields).await {
            Ok(true) => {}
            // Deleted between the existence check and the write
            Ok(false) => return Ok(Reply::negative(NOT_FOUND)),
            Err(e) if e.is_unique_violation() => {
                debug!(artist_id = id, name = %fields.name, "Lost name to a concurrent write");
                return self.name_taken(&fields.name, Some(id)).await;
            }
            Err(e) => return Err(e),
        }
        info!(artist_id = id, "Artist updated");

        Ok(Reply::value(id.to_string()).notify(Notification::positive("Artist updated")))
    }

    async fn try_delete(&self, id: i64) -> Result<Reply<bool>> {
        if !artists::delete_artist(&self.pool, id).await? {
            return Ok(Reply::negative(NOT_FOUND));
        }
        info!(artist_id = id, "Artist deleted");

        Ok(Reply::value(true).notify(Notification::positive("Artist deleted")))
    }
}

fn normalize(name: String, bio: Option<String>, profile_image: Option<String>) -> ArtistFields {
    ArtistFields {
        name: name.trim().to_string(),
        bio: bio.filter(|b| !b.trim().is_empty()),
        profile_image: profile_image.filter(|p| !p.trim().is_empty()),
    }
}

#[async_trait]
impl CrudService for ArtistService {
    type CreateInput = CreateArtist;
    type UpdateInput = UpdateArtist;
    type Output = ArtistOutput;
    type IdentifierInput = ArtistIdentifier;

    async fn get_all(&self, ctx: &RequestContext) -> Reply<Vec<ArtistOutput>> {
        debug!(correlation_id = %ctx.correlation_id, "Listing artists");
        self.try_get_all().await.unwrap_or_else(Reply::fault)
    }

    async fn get(&self, ctx: &RequestContext, id: i64) -> Reply<ArtistOutput> {
        debug!(correlation_id = %ctx.correlation_id, artist_id = id, "Loading artist");
        self.try_get(id).await.unwrap_or_else(Reply::fault)
    }

    async fn get_by_identifier(
        &self,
        ctx: &RequestContext,
        identifier: ArtistIdentifier,
    ) -> Reply<ArtistOutput> {
        let name = identifier.name.trim();
        if name.is_empty() {
            return Reply::fault(ServiceFault::business([Incident::new(
                "name",
                "Name is required",
            )]));
        }

        debug!(correlation_id = %ctx.correlation_id, name, "Looking up artist by name");
        self.try_get_by_identifier(name).await.unwrap_or_else(Reply::fault)
    }

    async fn create(&self, _ctx: &RequestContext, input: CreateArtist) -> Reply<String> {
        let fields = normalize(input.name, input.bio, input.profile_image);
        self.try_create(fields).await.unwrap_or_else(Reply::fault)
    }

    async fn update(&self, _ctx: &RequestContext, id: i64, input: UpdateArtist) -> Reply<String> {
        let fields = normalize(input.name, input.bio, input.profile_image);
        self.try_update(id, fields).await.unwrap_or_else(Reply::fault)
    }

    async fn delete(&self, _ctx: &RequestContext, id: i64) -> Reply<bool> {
        self.try_delete(id).await.unwrap_or_else(Reply::fault)
    }
}
