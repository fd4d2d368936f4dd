//! Artist database operations

use screenmusic_common::Result;
use sqlx::{Row, SqlitePool};

/// Artist record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
}

/// Writable artist fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistFields {
    pub name: String,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
}

fn from_row(row: &sqlx::sqlite::SqliteRow) -> Artist {
    Artist {
        id: row.get("id"),
        name: row.get("name"),
        bio: row.get("bio"),
        profile_image: row.get("profile_image"),
    }
}

/// Load every artist ordered by name
pub async fn list_artists(pool: &SqlitePool) -> Result<Vec<Artist>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, bio, profile_image
        FROM artists
        ORDER BY name COLLATE NOCASE, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(from_row).collect())
}

/// Load artist by id
pub async fn load_artist(pool: &SqlitePool, id: i64) -> Result<Option<Artist>> {
    let row = sqlx::query("SELECT id, name, bio, profile_image FROM artists WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(from_row))
}

/// Load artist by name (case-insensitive)
pub async fn load_artist_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Artist>> {
    let row = sqlx::query("SELECT id, name, bio, profile_image FROM artists WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(from_row))
}

/// Insert artist, returning its id
pub async fn insert_artist(pool: &SqlitePool, fields: &ArtistFields) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO artists (name, bio, profile_image, created_at, updated_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(&fields.name)
    .bind(&fields.bio)
    .bind(&fields.profile_image)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Overwrite an artist's fields; returns false when the id does not exist
pub async fn update_artist(pool: &SqlitePool, id: i64, fields: &ArtistFields) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE artists
        SET name = ?, bio = ?, profile_image = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&fields.name)
    .bind(&fields.bio)
    .bind(&fields.profile_image)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete an artist; returns false when the id does not exist
pub async fn delete_artist(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM artists WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
