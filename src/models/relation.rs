// src/models/relation.rs
//
// Witness rows: the existence of a row is the relationship.

use serde::Serialize;
use sqlx::FromRow;

/// Represents the 'follows' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Follow {
    pub id: i64,
    pub follower_id: i64,
    pub following_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'bookmarks' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Bookmark {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A bookmarked post with its author, for the caller's bookmark list.
#[derive(Debug, Serialize, FromRow)]
pub struct BookmarkedPost {
    pub post_id: i64,
    pub title: String,
    pub author: String,
    pub comments_count: i64,
    pub total_likes: i64,
    pub bookmarked_at: chrono::DateTime<chrono::Utc>,
}
