// src/models/post.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::{Validate, ValidationError};

use super::{comment::CommentResponse, tag::Tag};

pub const MAX_GALLERY_IMAGES: usize = 10;
pub const MAX_TAGS: usize = 10;

/// A post as listed in feeds, annotated with author and counts.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub user_id: i64,
    pub author: String,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub comments_count: i64,
    pub total_likes: i64,
}

/// Represents the 'post_images' table (gallery images).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PostImage {
    pub id: i64,
    pub post_id: i64,
    pub image: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Everything shown on a post's own page.
#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostSummary,
    pub tags: Vec<Tag>,
    pub images: Vec<PostImage>,
    pub comments: Vec<CommentResponse>,
    /// UI helpers, only present for a signed-in caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_bookmarked: Option<bool>,
}

/// DTO for creating a new post.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 chars"
    ))]
    pub title: String,

    #[validate(length(
        min = 1,
        max = 20000,
        message = "Content length must be between 1 and 20000 chars"
    ))]
    pub content: String,

    /// Optional cover image.
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub image: Option<String>,

    /// Gallery image URLs.
    #[serde(default)]
    #[validate(custom(function = validate_gallery_urls))]
    pub gallery: Vec<String>,

    /// Comma-separated tag names.
    #[validate(custom(function = validate_tag_list))]
    pub tags: Option<String>,
}

impl CreatePostRequest {
    /// Form posts send empty strings for untouched optional fields.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.image = self.image.filter(|i| !i.trim().is_empty());
        self.gallery.retain(|g| !g.trim().is_empty());
        self.tags = self.tags.filter(|t| !t.trim().is_empty());
        self
    }

    /// Distinct tag names in first-seen order.
    pub fn tag_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in split_tags(self.tags.as_deref().unwrap_or("")) {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
                names.push(name);
            }
        }
        names
    }
}

fn split_tags(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Validates that a string is a correctly formatted URL.
fn validate_url_string(url: &str) -> Result<(), ValidationError> {
    if Url::parse(url).is_err() {
        return Err(ValidationError::new("invalid_url"));
    }
    Ok(())
}

/// Validates a collection of URLs, ensuring each meets length and format requirements.
fn validate_gallery_urls(urls: &[String]) -> Result<(), ValidationError> {
    if urls.len() > MAX_GALLERY_IMAGES {
        return Err(ValidationError::new("too_many_images"));
    }
    for url in urls {
        if url.len() > 500 {
            return Err(ValidationError::new("url_too_long"));
        }
        validate_url_string(url)?;
    }
    Ok(())
}

fn validate_tag_list(raw: &str) -> Result<(), ValidationError> {
    let mut count = 0;
    for name in split_tags(raw) {
        if name.chars().count() > 50 {
            return Err(ValidationError::new("tag_too_long"));
        }
        count += 1;
    }
    if count > MAX_TAGS {
        return Err(ValidationError::new("too_many_tags"));
    }
    Ok(())
}

/// Query parameters for feed-style listings.
#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
    /// Search keyword.
    pub q: Option<String>,

    /// Restrict to a tag slug (search only).
    pub tag: Option<String>,

    /// 1-based page number. Kept as text: junk falls back to page 1.
    pub page: Option<String>,
}

impl FeedParams {
    pub fn keyword(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    pub fn tag_slug(&self) -> Option<&str> {
        self.tag.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// One page of results plus paginator state.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub num_pages: i64,
    pub total: i64,
    pub has_next: bool,
    pub has_previous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(tags: Option<&str>) -> CreatePostRequest {
        CreatePostRequest {
            title: " Title ".to_string(),
            content: "Body".to_string(),
            image: Some("".to_string()),
            gallery: vec!["".to_string(), "https://img.example/a.png".to_string()],
            tags: tags.map(str::to_string),
        }
    }

    #[test]
    fn normalized_drops_blank_fields() {
        let req = request(Some("  ")).normalized();
        assert_eq!(req.title, "Title");
        assert!(req.image.is_none());
        assert_eq!(req.gallery.len(), 1);
        assert!(req.tags.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn tag_names_are_trimmed_and_distinct() {
        let req = request(Some("rust, Web ,rust,,RUST, web")).normalized();
        assert_eq!(req.tag_names(), vec!["rust".to_string(), "Web".to_string()]);
    }

    #[test]
    fn rejects_bad_image_urls() {
        let mut req = request(None).normalized();
        req.image = Some("not a url".to_string());
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_too_many_tags() {
        let many = (0..11).map(|i| format!("t{}", i)).collect::<Vec<_>>().join(",");
        assert!(request(Some(&many)).normalized().validate().is_err());
    }
}
