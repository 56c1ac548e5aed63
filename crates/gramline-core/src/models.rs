//! Domain types shared across the crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A full user profile as returned by the profile endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub pk: u64,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub follower_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub media_count: u64,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
}

impl UserProfile {
    /// Counts for the stats display.
    pub fn stats(&self) -> AccountStats {
        AccountStats {
            followers: self.follower_count,
            following: self.following_count,
            posts: self.media_count,
        }
    }
}

/// Follower/following/post counts for the authenticated account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AccountStats {
    pub followers: u64,
    pub following: u64,
    pub posts: u64,
}

/// A single row in user search results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub pk: u64,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub follower_count: u64,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostAuthor {
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Caption {
    pub text: String,
}

/// An organic media post from the timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedPost {
    pub id: String,
    pub user: PostAuthor,
    #[serde(default)]
    pub caption: Option<Caption>,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub media_type: u8,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub taken_at: DateTime<Utc>,
    /// Set on sponsored posts injected into the timeline.
    #[serde(default)]
    pub injected: bool,
}

impl FeedPost {
    pub fn caption_text(&self) -> &str {
        self.caption.as_ref().map(|c| c.text.as_str()).unwrap_or("")
    }
}

/// One unit of the timeline response. Besides organic posts the timeline
/// carries ads and non-media units (suggestions, end-of-feed markers).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedEntry {
    #[serde(default)]
    pub media_or_ad: Option<FeedPost>,
}

impl FeedEntry {
    /// The underlying post when this unit is organic media; `None` for
    /// ads and non-media units.
    pub fn into_media(self) -> Option<FeedPost> {
        self.media_or_ad.filter(|post| !post.injected)
    }
}
