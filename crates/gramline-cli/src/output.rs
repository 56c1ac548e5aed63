//! Terminal output formatting.
//!
//! All printing lives here; the core library only logs via `tracing`.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use owo_colors::OwoColorize;

use gramline_core::models::{AccountStats, FeedPost, UserProfile, UserSummary};

/// Placeholder for absent optional fields
const NONE_PLACEHOLDER: &str = "N/A";

/// Caption column width in the feed table
const CAPTION_WIDTH: usize = 50;

pub fn success(message: &str) {
    println!("{} {}", "✔".green(), message);
}

pub fn info(message: &str) {
    println!("{} {}", "•".blue(), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", "✘".red(), message);
}

fn optional(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => NONE_PLACEHOLDER,
    }
}

fn field(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", format!("{label:<10}").cyan().bold(), value);
}

pub fn print_profile(profile: &UserProfile) {
    println!();
    field("Username", format!("@{}", profile.username));
    field("Full name", optional(profile.full_name.as_deref()));
    field("Biography", optional(profile.biography.as_deref()));
    field("Followers", profile.follower_count);
    field("Following", profile.following_count);
    field("Posts", profile.media_count);
    field("Private", if profile.is_private { "Yes" } else { "No" });
    field("Verified", if profile.is_verified { "Yes" } else { "No" });
    if let Some(url) = profile.external_url.as_deref() {
        if !url.is_empty() {
            field("Link", url);
        }
    }
    println!();
}

pub fn print_stats(stats: &AccountStats) {
    println!();
    field("Followers", stats.followers);
    field("Following", stats.following);
    field("Posts", stats.posts);
    println!();
}

pub fn print_search_results(users: &[UserSummary]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Username", "Full Name", "Followers", "Private", "Verified"]);
    for user in users {
        table.add_row(vec![
            Cell::new(format!("@{}", user.username)),
            Cell::new(optional(user.full_name.as_deref())),
            Cell::new(user.follower_count).set_alignment(CellAlignment::Right),
            Cell::new(if user.is_private { "yes" } else { "" }),
            Cell::new(if user.is_verified { "✓" } else { "" }),
        ]);
    }
    println!("{table}");
}

pub fn print_feed(posts: &[FeedPost]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Username", "Caption", "Likes", "Comments", "Posted"]);
    for (idx, post) in posts.iter().enumerate() {
        let caption = match post.caption_text() {
            "" => "No caption".to_string(),
            text => truncate(text, CAPTION_WIDTH),
        };
        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(format!("@{}", post.user.username)),
            Cell::new(caption),
            Cell::new(post.like_count).set_alignment(CellAlignment::Right),
            Cell::new(post.comment_count).set_alignment(CellAlignment::Right),
            Cell::new(post.taken_at.format("%b %d, %Y")),
        ]);
    }
    println!("{table}");
}

/// Truncate a string to a maximum length, adding ellipsis if needed
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
    }

    #[test]
    fn test_optional() {
        assert_eq!(optional(Some("bio")), "bio");
        assert_eq!(optional(Some("")), NONE_PLACEHOLDER);
        assert_eq!(optional(None), NONE_PLACEHOLDER);
    }
}
