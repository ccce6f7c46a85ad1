// src/models/notification.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// What triggered a notification. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum NotificationKind {
    Follow,
    Like,
    Comment,
    Mention,
}

/// Represents the 'notifications' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub sender_id: i64,
    pub kind: NotificationKind,
    pub post_id: Option<i64>,
    pub comment_id: Option<i64>,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A notification joined with sender and post title, for display.
#[derive(Debug, Serialize, FromRow)]
pub struct NotificationResponse {
    pub id: i64,
    pub kind: NotificationKind,
    pub sender_id: i64,
    pub sender: String,
    pub post_id: Option<i64>,
    pub post_title: Option<String>,
    pub comment_id: Option<i64>,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
