//! Presentation data models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A slide deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Presentation {
    pub id: i64,
    pub name: String,
    /// Opaque owner identifier supplied by the caller.
    pub owner: String,
    pub created_at: String,
    pub modified_at: String,
}

/// Room name for a presentation id: its decimal form.
pub fn room_for(presentation_id: i64) -> String {
    presentation_id.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePresentationRequest {
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePresentationRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PresentationListQuery {
    pub owner: Option<String>,
}
