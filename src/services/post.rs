// src/services/post.rs

use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    db,
    error::AppError,
    models::{
        comment::{Comment, CommentResponse},
        notification::NotificationKind,
        post::{CreatePostRequest, PostDetail, PostImage},
        tag::Tag,
    },
    services::{feed, interaction, notification::notify},
    utils::{html::clean_html, text::mentioned_usernames, text::slugify},
};

/// Creates a post with its tags and gallery images.
///
/// Content is sanitized here, immediately before it is stored.
pub async fn create_post(
    pool: &SqlitePool,
    user_id: i64,
    req: &CreatePostRequest,
) -> Result<i64, AppError> {
    let content = clean_html(&req.content);

    let mut tx = db::begin_write(pool).await?;

    let post_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO posts (user_id, title, content, image)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(&req.title)
    .bind(&content)
    .bind(&req.image)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create post: {:?}", e);
        AppError::from(e)
    })?;

    for image in &req.gallery {
        sqlx::query("INSERT INTO post_images (post_id, image) VALUES (?, ?)")
            .bind(post_id)
            .bind(image)
            .execute(&mut *tx)
            .await?;
    }

    for name in req.tag_names() {
        let tag = get_or_create_tag(&mut tx, &name).await?;
        sqlx::query("INSERT INTO post_tags (post_id, tag_id) VALUES (?, ?) ON CONFLICT DO NOTHING")
            .bind(post_id)
            .bind(tag.id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    tracing::info!(post_id, user_id, "Post created");
    Ok(post_id)
}

async fn tag_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<Tag>, sqlx::Error> {
    sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
}

/// Finds a tag by name (case-insensitively) or creates it with a unique slug.
///
/// Names compare with `NOCASE`. The insert ignores conflicts: an empty
/// result means either a concurrent writer created the same name, which the
/// re-select then returns, or the slug is taken and the next suffix is tried.
pub async fn get_or_create_tag(conn: &mut SqliteConnection, name: &str) -> Result<Tag, AppError> {
    if let Some(tag) = tag_by_name(conn, name).await? {
        return Ok(tag);
    }

    let base = slugify(name);
    let mut suffix = 1;
    loop {
        let slug = match suffix {
            1 => base.clone(),
            n => format!("{}-{}", base, n),
        };

        let inserted = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (name, slug) VALUES (?, ?)
            ON CONFLICT DO NOTHING
            RETURNING id, name, slug
            "#,
        )
        .bind(name)
        .bind(&slug)
        .fetch_optional(&mut *conn)
        .await?;
        if let Some(tag) = inserted {
            return Ok(tag);
        }

        if let Some(tag) = tag_by_name(conn, name).await? {
            return Ok(tag);
        }
        suffix += 1;
    }
}

pub async fn find_tag(pool: &SqlitePool, slug: &str) -> Result<Tag, AppError> {
    sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))
}

/// Everything on a post's page. Flags are filled in for a signed-in viewer.
pub async fn post_detail(
    pool: &SqlitePool,
    post_id: i64,
    viewer: Option<i64>,
) -> Result<PostDetail, AppError> {
    let post = feed::summary(pool, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT t.id, t.name, t.slug
        FROM tags t
        JOIN post_tags pt ON pt.tag_id = t.id
        WHERE pt.post_id = ?
        ORDER BY t.name
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    let images = sqlx::query_as::<_, PostImage>(
        "SELECT id, post_id, image, created_at FROM post_images WHERE post_id = ? ORDER BY id",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    let comments = list_comments(pool, post_id).await?;

    let (is_liked, is_bookmarked) = match viewer {
        Some(user_id) => {
            let (liked, bookmarked) = interaction::post_flags(pool, user_id, post_id).await?;
            (Some(liked), Some(bookmarked))
        }
        None => (None, None),
    };

    Ok(PostDetail {
        post,
        tags,
        images,
        comments,
        is_liked,
        is_bookmarked,
    })
}

/// Comments on a post, oldest first.
pub async fn list_comments(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<CommentResponse>, AppError> {
    let comments = sqlx::query_as::<_, CommentResponse>(
        r#"
        SELECT c.id, c.post_id, c.user_id, u.username, c.content, c.created_at
        FROM comments c
        JOIN users u ON c.user_id = u.id
        WHERE c.post_id = ?
        ORDER BY c.created_at ASC, c.id ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}

/// Adds a comment and fans out notifications.
///
/// The post author gets a `comment` notification; every other user named
/// with `@username` gets a `mention`. The commenter is never notified.
pub async fn add_comment(
    pool: &SqlitePool,
    user_id: i64,
    post_id: i64,
    content: &str,
) -> Result<i64, AppError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("Comment cannot be empty".to_string()));
    }

    let mut tx = db::begin_write(pool).await?;

    let author_id = sqlx::query_scalar::<_, i64>("SELECT user_id FROM posts WHERE id = ?")
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let comment_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO comments (post_id, user_id, content) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(post_id)
    .bind(user_id)
    .bind(content)
    .fetch_one(&mut *tx)
    .await?;

    notify(
        &mut tx,
        author_id,
        user_id,
        NotificationKind::Comment,
        Some(post_id),
        Some(comment_id),
    )
    .await?;

    for username in mentioned_usernames(content) {
        let mentioned = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = ?")
            .bind(&username)
            .fetch_optional(&mut *tx)
            .await?;
        match mentioned {
            Some(id) if id != author_id => {
                notify(
                    &mut tx,
                    id,
                    user_id,
                    NotificationKind::Mention,
                    Some(post_id),
                    Some(comment_id),
                )
                .await?;
            }
            _ => {}
        }
    }

    tx.commit().await?;

    Ok(comment_id)
}

/// Deletes a post and, through the schema's cascades, its comments,
/// images, likes, tags links, bookmarks and notifications.
/// Only the author may delete.
pub async fn delete_post(pool: &SqlitePool, user_id: i64, post_id: i64) -> Result<(), AppError> {
    let owner = sqlx::query_scalar::<_, i64>("SELECT user_id FROM posts WHERE id = ?")
        .bind(post_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    if owner != user_id {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this post".to_string(),
        ));
    }

    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(post_id)
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete post: {:?}", e);
            AppError::from(e)
        })?;

    tracing::info!(post_id, user_id, "Post deleted");
    Ok(())
}

/// Deletes a comment. Allowed for the comment's author and the post's author.
/// Returns the post id so callers can send the user back to it.
pub async fn delete_comment(
    pool: &SqlitePool,
    user_id: i64,
    comment_id: i64,
) -> Result<i64, AppError> {
    let comment = sqlx::query_as::<_, Comment>(
        "SELECT id, post_id, user_id, content, created_at FROM comments WHERE id = ?",
    )
    .bind(comment_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    let post_author = sqlx::query_scalar::<_, i64>("SELECT user_id FROM posts WHERE id = ?")
        .bind(comment.post_id)
        .fetch_one(pool)
        .await?;

    if user_id != comment.user_id && user_id != post_author {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this comment".to_string(),
        ));
    }

    sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(comment_id)
        .execute(pool)
        .await?;

    tracing::info!(comment_id, post_id = comment.post_id, user_id, "Comment deleted");
    Ok(comment.post_id)
}
