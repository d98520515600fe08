//! Wire types exchanged with the blog backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The signed-in author's profile as returned by `GET /user/profile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub bio: String,
    /// JSON-encoded link list, stored verbatim by the backend
    #[serde(default)]
    pub social_links: String,
    #[serde(default)]
    pub sponsor_links: String,
    #[serde(default)]
    pub friend_links: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Name to show in status lines
    pub fn display_name(&self) -> &str {
        &self.username
    }
}

/// Body of `PUT /user/profile`.
///
/// The backend keeps the current avatar when `avatar_url` is empty; every
/// other field is overwritten, empty or not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub avatar_url: String,
    pub bio: String,
    pub social_links: String,
    pub sponsor_links: String,
    pub friend_links: String,
}

impl From<&UserProfile> for ProfileUpdate {
    fn from(profile: &UserProfile) -> Self {
        Self {
            avatar_url: profile.avatar_url.clone(),
            bio: profile.bio.clone(),
            social_links: profile.social_links.clone(),
            sponsor_links: profile.sponsor_links.clone(),
            friend_links: profile.friend_links.clone(),
        }
    }
}

/// Result of `GET /registration-status`. The blog is single-author, so
/// registration closes once one account exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationStatus {
    pub registration_allowed: bool,
    pub user_count: i64,
}
