use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Sort direction for thread listings, keyed on `created_at`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Comment record mapped to the `comment` table.
///
/// `path` encodes the full ancestry chain as canonical UUID strings joined
/// by `/`. It is assigned once at creation and never mutated; every segment
/// is fixed-width, so `path` prefix matches are exact subtree matches.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub path: String,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
