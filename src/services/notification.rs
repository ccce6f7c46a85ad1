// src/services/notification.rs

use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    error::AppError,
    models::notification::{NotificationKind, NotificationResponse},
};

/// Records a notification for `recipient` about something `sender` did.
///
/// Nothing is written when the two are the same user. Runs on the caller's
/// connection so it commits or rolls back with the triggering action.
pub async fn notify(
    conn: &mut SqliteConnection,
    recipient_id: i64,
    sender_id: i64,
    kind: NotificationKind,
    post_id: Option<i64>,
    comment_id: Option<i64>,
) -> Result<Option<i64>, sqlx::Error> {
    if recipient_id == sender_id {
        return Ok(None);
    }

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO notifications (recipient_id, sender_id, kind, post_id, comment_id)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(recipient_id)
    .bind(sender_id)
    .bind(kind)
    .bind(post_id)
    .bind(comment_id)
    .fetch_one(&mut *conn)
    .await?;

    tracing::debug!(recipient_id, sender_id, ?kind, "Notification created");
    Ok(Some(id))
}

/// The user's notifications, newest first.
pub async fn list_for(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<NotificationResponse>, AppError> {
    let list = sqlx::query_as::<_, NotificationResponse>(
        r#"
        SELECT
            n.id, n.kind, n.sender_id, u.username AS sender,
            n.post_id, p.title AS post_title, n.comment_id,
            n.is_read, n.created_at
        FROM notifications n
        JOIN users u ON u.id = n.sender_id
        LEFT JOIN posts p ON p.id = n.post_id
        WHERE n.recipient_id = ?
        ORDER BY n.created_at DESC, n.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(list)
}

pub async fn unread_count(pool: &SqlitePool, user_id: i64) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE recipient_id = ? AND is_read = FALSE",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Marks one of the user's notifications read.
/// Someone else's notification is reported as missing.
pub async fn mark_read(pool: &SqlitePool, user_id: i64, id: i64) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = TRUE WHERE id = ? AND recipient_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }
    Ok(())
}

/// Marks all of the user's unread notifications read; returns how many changed.
pub async fn mark_all_read(pool: &SqlitePool, user_id: i64) -> Result<u64, AppError> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = TRUE WHERE recipient_id = ? AND is_read = FALSE",
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
