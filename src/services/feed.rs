// src/services/feed.rs

use chrono::{Duration, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::AppError,
    models::post::{Page, PostSummary},
};

/// Posts annotated with author name, comment count and like count.
const SUMMARY_SELECT: &str = r#"
    SELECT
        p.id, p.user_id, u.username AS author, p.title, p.content, p.image, p.created_at,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count,
        (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS total_likes
    FROM posts p
    JOIN users u ON u.id = p.user_id
"#;

const NEWEST_FIRST: &str = " ORDER BY p.created_at DESC, p.id DESC";

/// Which posts a listing includes.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Case-insensitive substring, matched against title or content.
    pub keyword: Option<String>,
    /// Also match the keyword against author username and tag names.
    pub extended: bool,
    /// Only posts carrying this tag slug.
    pub tag_slug: Option<String>,
    pub author_id: Option<i64>,
}

impl PostFilter {
    pub fn keyword(q: Option<&str>) -> Self {
        Self {
            keyword: q.map(str::to_string),
            ..Default::default()
        }
    }
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
///
/// The keyword is bound as typed: `LIKE` folds ASCII case itself and
/// compares every other character exactly.
fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_filter<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &'a PostFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(keyword) = filter.keyword.as_deref() {
        let pattern = like_pattern(keyword);
        qb.push(" AND (p.title LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR p.content LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\'");
        if filter.extended {
            qb.push(" OR u.username LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR EXISTS (SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id WHERE pt.post_id = p.id AND t.name LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        qb.push(")");
    }

    if let Some(slug) = filter.tag_slug.as_deref() {
        qb.push(" AND EXISTS (SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id WHERE pt.post_id = p.id AND t.slug = ")
            .push_bind(slug)
            .push(")");
    }

    if let Some(author_id) = filter.author_id {
        qb.push(" AND p.user_id = ").push_bind(author_id);
    }
}

/// Forgiving page resolution: junk means page 1, out-of-range means the
/// last page, and an empty listing still has one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub num_pages: i64,
    pub offset: i64,
}

pub fn resolve_page(total: i64, page_size: i64, requested: Option<&str>) -> PageWindow {
    let page_size = page_size.max(1);
    let num_pages = ((total + page_size - 1) / page_size).max(1);
    let page = match requested.map(str::trim).map(str::parse::<i64>) {
        Some(Ok(n)) if (1..=num_pages).contains(&n) => n,
        Some(Ok(_)) => num_pages,
        _ => 1,
    };
    PageWindow {
        page,
        num_pages,
        offset: (page - 1) * page_size,
    }
}

/// Runs a filtered, newest-first, paginated listing. No caching: every call
/// hits the database.
pub async fn list_posts(
    pool: &SqlitePool,
    filter: &PostFilter,
    page_size: i64,
    requested_page: Option<&str>,
) -> Result<Page<PostSummary>, AppError> {
    let mut count_qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM posts p JOIN users u ON u.id = p.user_id");
    push_filter(&mut count_qb, filter);
    let total = count_qb.build_query_scalar::<i64>().fetch_one(pool).await?;

    let window = resolve_page(total, page_size, requested_page);

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SUMMARY_SELECT);
    push_filter(&mut qb, filter);
    qb.push(NEWEST_FIRST)
        .push(" LIMIT ")
        .push_bind(page_size.max(1))
        .push(" OFFSET ")
        .push_bind(window.offset);

    let items = qb
        .build_query_as::<PostSummary>()
        .fetch_all(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list posts: {:?}", e);
            AppError::from(e)
        })?;

    Ok(Page {
        items,
        page: window.page,
        num_pages: window.num_pages,
        total,
        has_next: window.page < window.num_pages,
        has_previous: window.page > 1,
        q: filter.keyword.clone(),
    })
}

/// One post's summary row.
pub async fn summary(pool: &SqlitePool, post_id: i64) -> Result<Option<PostSummary>, AppError> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SUMMARY_SELECT);
    qb.push(" WHERE p.id = ").push_bind(post_id);
    let post = qb.build_query_as::<PostSummary>().fetch_optional(pool).await?;
    Ok(post)
}

/// Posts from the last `days` days, most liked first, then most discussed,
/// then newest.
pub async fn trending(
    pool: &SqlitePool,
    days: i64,
    limit: i64,
) -> Result<Vec<PostSummary>, AppError> {
    // Same text layout as the column default, so string comparison orders correctly.
    let cutoff = (Utc::now() - Duration::days(days))
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string();

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SUMMARY_SELECT);
    qb.push(" WHERE p.created_at >= ")
        .push_bind(cutoff)
        .push(" ORDER BY total_likes DESC, comments_count DESC, p.created_at DESC, p.id DESC")
        .push(" LIMIT ")
        .push_bind(limit.max(1));

    let posts = qb.build_query_as::<PostSummary>().fetch_all(pool).await?;
    Ok(posts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_resolution_is_forgiving() {
        assert_eq!(resolve_page(0, 50, None), PageWindow { page: 1, num_pages: 1, offset: 0 });
        assert_eq!(resolve_page(120, 50, Some("2")).offset, 50);
        assert_eq!(resolve_page(120, 50, Some("abc")).page, 1);
        assert_eq!(resolve_page(120, 50, Some("99")).page, 3);
        assert_eq!(resolve_page(120, 50, Some("0")).page, 3);
        assert_eq!(resolve_page(100, 50, None).num_pages, 2);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Rust"), "%Rust%");
        assert_eq!(like_pattern("Über"), "%Über%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
