// src/services/profile.rs

use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        profile::{Profile, ProfileChanges, ProfileResponse},
        relation::BookmarkedPost,
        user::{User, UserSummary},
    },
    services::interaction,
};

pub async fn load_profile(pool: &SqlitePool, user_id: i64) -> Result<Profile, AppError> {
    sqlx::query_as::<_, Profile>(
        "SELECT user_id, bio, avatar, website, github, twitter FROM profiles WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

/// A user's public page data. `viewer` adds `is_following` when it is
/// someone other than the user.
pub async fn profile_view(
    pool: &SqlitePool,
    user: &User,
    viewer: Option<i64>,
) -> Result<ProfileResponse, AppError> {
    let profile = load_profile(pool, user.id).await?;

    // Using subqueries for counts is efficient given our indexes on user_id and following_id.
    let (posts_count, followers_count, following_count, total_likes_received) =
        sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM posts WHERE user_id = ?1),
                (SELECT COUNT(*) FROM follows WHERE following_id = ?1),
                (SELECT COUNT(*) FROM follows WHERE follower_id = ?1),
                (SELECT COUNT(*) FROM post_likes pl JOIN posts p ON pl.post_id = p.id WHERE p.user_id = ?1)
            "#,
        )
        .bind(user.id)
        .fetch_one(pool)
        .await?;

    let is_following = match viewer {
        Some(viewer_id) if viewer_id != user.id => {
            Some(interaction::is_following(pool, viewer_id, user.id).await?)
        }
        _ => None,
    };

    Ok(ProfileResponse {
        id: user.id,
        username: user.username.clone(),
        joined: user.created_at,
        profile,
        posts_count,
        followers_count,
        following_count,
        total_likes_received,
        is_following,
    })
}

/// Applies an edit to the user's profile and returns the stored result.
pub async fn update_profile(
    pool: &SqlitePool,
    user_id: i64,
    changes: ProfileChanges,
) -> Result<Profile, AppError> {
    let current = load_profile(pool, user_id).await?;

    let bio = changes.bio.unwrap_or(current.bio);
    let avatar = changes.avatar.unwrap_or(current.avatar);
    let website = changes.website.unwrap_or(current.website);
    let github = changes.github.unwrap_or(current.github);
    let twitter = changes.twitter.unwrap_or(current.twitter);

    let profile = sqlx::query_as::<_, Profile>(
        r#"
        UPDATE profiles
        SET bio = ?, avatar = ?, website = ?, github = ?, twitter = ?
        WHERE user_id = ?
        RETURNING user_id, bio, avatar, website, github, twitter
        "#,
    )
    .bind(bio)
    .bind(avatar)
    .bind(website)
    .bind(github)
    .bind(twitter)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(profile)
}

/// Users following `user_id`, newest follow first.
pub async fn followers(pool: &SqlitePool, user_id: i64) -> Result<Vec<UserSummary>, AppError> {
    let list = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT u.id, u.username, f.created_at AS since
        FROM follows f
        JOIN users u ON u.id = f.follower_id
        WHERE f.following_id = ?
        ORDER BY f.created_at DESC, f.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(list)
}

/// Users `user_id` follows, newest follow first.
pub async fn following(pool: &SqlitePool, user_id: i64) -> Result<Vec<UserSummary>, AppError> {
    let list = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT u.id, u.username, f.created_at AS since
        FROM follows f
        JOIN users u ON u.id = f.following_id
        WHERE f.follower_id = ?
        ORDER BY f.created_at DESC, f.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(list)
}

/// List posts bookmarked by the user, most recently bookmarked first.
pub async fn bookmarks(pool: &SqlitePool, user_id: i64) -> Result<Vec<BookmarkedPost>, AppError> {
    let list = sqlx::query_as::<_, BookmarkedPost>(
        r#"
        SELECT
            b.post_id, p.title, u.username AS author,
            (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count,
            (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS total_likes,
            b.created_at AS bookmarked_at
        FROM bookmarks b
        JOIN posts p ON b.post_id = p.id
        JOIN users u ON p.user_id = u.id
        WHERE b.user_id = ?
        ORDER BY b.created_at DESC, b.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(list)
}
