// src/models/profile.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'profiles' table. Exactly one per user.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: i64,
    pub bio: String,
    /// URL of the avatar image.
    pub avatar: Option<String>,
    pub website: Option<String>,
    /// GitHub handle.
    pub github: Option<String>,
    /// Twitter/X handle.
    pub twitter: Option<String>,
}

/// DTO for editing the caller's profile. Absent fields are left unchanged;
/// an empty string clears an optional field.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 500, message = "Bio must be at most 500 characters."))]
    pub bio: Option<String>,
    #[validate(length(max = 500), url(message = "Avatar must be a URL."))]
    pub avatar: Option<String>,
    #[validate(length(max = 500), url(message = "Website must be a URL."))]
    pub website: Option<String>,
    #[validate(length(max = 200))]
    pub github: Option<String>,
    #[validate(length(max = 200))]
    pub twitter: Option<String>,
}

/// Maps an empty form field to "clear".
fn blank_to_none(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| {
        let v = v.trim().to_string();
        if v.is_empty() { None } else { Some(v) }
    })
}

/// Normalized edit: outer `None` keeps the stored value, inner `None` clears it.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub bio: Option<String>,
    pub avatar: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub github: Option<Option<String>>,
    pub twitter: Option<Option<String>>,
}

impl UpdateProfileRequest {
    /// Validates the fields that carry a value and normalizes blanks.
    pub fn into_changes(self) -> Result<ProfileChanges, validator::ValidationErrors> {
        let avatar = blank_to_none(self.avatar);
        let website = blank_to_none(self.website);
        let github = blank_to_none(self.github);
        let twitter = blank_to_none(self.twitter);

        let checked = UpdateProfileRequest {
            bio: self.bio.clone(),
            avatar: avatar.clone().flatten(),
            website: website.clone().flatten(),
            github: github.clone().flatten(),
            twitter: twitter.clone().flatten(),
        };
        checked.validate()?;

        Ok(ProfileChanges {
            bio: self.bio.map(|b| b.trim().to_string()),
            avatar,
            website,
            github,
            twitter,
        })
    }
}

/// Public view of a user.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub joined: chrono::DateTime<chrono::Utc>,
    #[serde(flatten)]
    pub profile: Profile,
    pub posts_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
    pub total_likes_received: i64,
    /// Only set when the caller is signed in and looking at someone else.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_following: Option<bool>,
}
