// src/models/tag.rs

use serde::Serialize;
use sqlx::FromRow;

/// Represents the 'tags' table. `slug` is unique and URL-safe.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}
