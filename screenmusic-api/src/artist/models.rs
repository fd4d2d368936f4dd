//! Artist request/response payloads

use serde::{Deserialize, Serialize};

use crate::db::artists::Artist;

/// Longest accepted artist name, in characters
pub const MAX_NAME_LEN: usize = 100;

/// POST /api/artist body
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArtist {
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

/// PUT /api/artist/:id body
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArtist {
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

/// POST /api/artist/GetByIdentifier body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistIdentifier {
    pub name: String,
}

/// Artist as returned by reads
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistOutput {
    pub id: i64,
    pub name: String,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
}

impl From<Artist> for ArtistOutput {
    fn from(artist: Artist) -> Self {
        Self {
            id: artist.id,
            name: artist.name,
            bio: artist.bio,
            profile_image: artist.profile_image,
        }
    }
}
