//! Retry-wrapped account operations over a validated client.
//!
//! Every remote call goes through `RetryPolicy::run`, which absorbs
//! transient rate limiting with exponential backoff and lets every other
//! error propagate on first occurrence.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ClientError, RemoteClient};
use crate::models::{AccountStats, FeedPost, UserProfile, UserSummary};

/// Photo formats accepted for upload.
const ALLOWED_PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("rate limit exceeded - please try again later")]
    RateLimitExceeded,

    #[error("{0}")]
    Photo(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Bounded exponential backoff for rate-limited calls. No jitter; delays
/// are deterministic.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(5),
            backoff_multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Run `op`, retrying on `RateLimited` with exponentially growing
    /// delays, up to `max_attempts` total attempts. Exhaustion surfaces
    /// as `RateLimitExceeded`; any other error propagates immediately.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(ClientError::RateLimited) => {
                    if attempt >= self.max_attempts {
                        return Err(GatewayError::RateLimitExceeded);
                    }
                    warn!(attempt, delay_secs = delay.as_secs(), "rate limited, backing off");
                    tokio::time::sleep(delay).await;
                    delay *= self.backoff_multiplier;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Account operations over a validated client.
pub struct Gateway<C: RemoteClient> {
    client: C,
    policy: RetryPolicy,
}

impl<C: RemoteClient> Gateway<C> {
    pub fn new(client: C) -> Self {
        Self::with_policy(client, RetryPolicy::default())
    }

    pub fn with_policy(client: C, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Follower/following/post counts for the authenticated account.
    pub async fn account_stats(&self) -> Result<AccountStats, GatewayError> {
        let client = &self.client;
        let profile = self.policy.run(|| client.current_account()).await?;
        Ok(profile.stats())
    }

    /// Full profile of the authenticated account.
    pub async fn current_user(&self) -> Result<UserProfile, GatewayError> {
        let client = &self.client;
        self.policy.run(|| client.current_account()).await
    }

    /// Profile lookup by username. A leading `@` is accepted and stripped.
    pub async fn user_info(&self, username: &str) -> Result<UserProfile, GatewayError> {
        let username = username.trim_start_matches('@');
        let client = &self.client;
        let user_id = self
            .policy
            .run(|| client.user_id_from_username(username))
            .await?;
        self.policy.run(|| client.user_info(user_id)).await
    }

    /// Search for users. The remote call is not limit-aware, so results
    /// are truncated client-side; a small limit does not reduce
    /// round-trip cost.
    pub async fn search_users(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<UserSummary>, GatewayError> {
        let client = &self.client;
        let mut users = self.policy.run(|| client.search_users(query)).await?;
        users.truncate(limit);
        Ok(users)
    }

    /// One timeline page reduced to organic media, in original order,
    /// truncated to `limit`. Ads and non-media units are skipped.
    pub async fn feed(&self, limit: usize) -> Result<Vec<FeedPost>, GatewayError> {
        let client = &self.client;
        let entries = self.policy.run(|| client.timeline_feed()).await?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| entry.into_media())
            .take(limit)
            .collect())
    }

    /// Upload a photo and publish it with a caption. The file must exist
    /// and carry an accepted extension; both are checked before any
    /// remote call is made.
    pub async fn post_photo(&self, path: &Path, caption: &str) -> Result<String, GatewayError> {
        if !path.exists() {
            return Err(GatewayError::Photo(format!(
                "photo not found: {}",
                path.display()
            )));
        }
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some(ext) if ALLOWED_PHOTO_EXTENSIONS.contains(&ext) => {}
            _ => {
                return Err(GatewayError::Photo(
                    "photo must be JPG, JPEG, or PNG format".into(),
                ))
            }
        }

        info!(photo = %path.display(), "uploading photo");
        let client = &self.client;
        self.policy.run(|| client.upload_photo(path, caption)).await
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::Arc;

    use super::*;
    use crate::api::mock::{
        ad_entry, media_entry, non_media_entry, profile, summary, MockClient, MockScript,
    };

    fn gateway(script: Arc<MockScript>) -> Gateway<MockClient> {
        Gateway::new(MockClient::new(script))
    }

    #[tokio::test(start_paused = true)]
    async fn retry_sleeps_five_then_ten_seconds_before_succeeding() {
        let policy = RetryPolicy::default();
        let attempts = Cell::new(0u32);
        let start = tokio::time::Instant::now();

        let result = policy
            .run(|| {
                let n = attempts.get() + 1;
                attempts.set(n);
                async move {
                    if n < 3 {
                        Err(ClientError::RateLimited)
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.get(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_gives_up_after_max_attempts() {
        let policy = RetryPolicy::default();
        let attempts = Cell::new(0u32);
        let start = tokio::time::Instant::now();

        let result: Result<(), _> = policy
            .run(|| {
                attempts.set(attempts.get() + 1);
                async { Err::<(), _>(ClientError::RateLimited) }
            })
            .await;

        assert!(matches!(result, Err(GatewayError::RateLimitExceeded)));
        assert_eq!(attempts.get(), 3);
        // sleeps happen after attempts 1 and 2 only
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_propagates_other_errors_immediately() {
        let policy = RetryPolicy::default();
        let attempts = Cell::new(0u32);
        let start = tokio::time::Instant::now();

        let result: Result<(), _> = policy
            .run(|| {
                attempts.set(attempts.get() + 1);
                async { Err::<(), _>(ClientError::AuthExpired) }
            })
            .await;

        assert!(matches!(
            result,
            Err(GatewayError::Client(ClientError::AuthExpired))
        ));
        assert_eq!(attempts.get(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn operations_retry_through_transient_rate_limits() {
        let script = Arc::new(MockScript::default());
        MockScript::push(&script.current_account, Err(ClientError::RateLimited));
        MockScript::push(&script.current_account, Ok(profile("jane", 250)));
        let gateway = gateway(script.clone());

        let stats = gateway.account_stats().await.unwrap();
        assert_eq!(stats.followers, 250);
        assert_eq!(script.call_count("current_account"), 2);
    }

    #[tokio::test]
    async fn user_info_strips_leading_at_sign() {
        let script = Arc::new(MockScript::default());
        MockScript::push(&script.user_id_from_username, Ok(7));
        MockScript::push(&script.user_info, Ok(profile("jane", 100)));
        let gateway = gateway(script.clone());

        let result = gateway.user_info("@jane").await.unwrap();
        assert_eq!(result.username, "jane");
        assert!(script
            .calls()
            .contains(&"user_id_from_username:jane".to_string()));
    }

    #[tokio::test]
    async fn search_truncates_results_client_side() {
        let script = Arc::new(MockScript::default());
        MockScript::push(
            &script.search_users,
            Ok(vec![
                summary("a"),
                summary("b"),
                summary("c"),
                summary("d"),
            ]),
        );
        let gateway = gateway(script);

        let results = gateway.search_users("a", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].username, "a");
        assert_eq!(results[1].username, "b");
    }

    #[tokio::test]
    async fn feed_filters_non_media_and_truncates_in_order() {
        let script = Arc::new(MockScript::default());
        // 8 units, 2 of them non-media
        MockScript::push(
            &script.timeline_feed,
            Ok(vec![
                media_entry("1"),
                media_entry("2"),
                ad_entry("3"),
                media_entry("4"),
                non_media_entry(),
                media_entry("5"),
                media_entry("6"),
                media_entry("7"),
            ]),
        );
        let gateway = gateway(script);

        let posts = gateway.feed(5).await.unwrap();
        let ids: Vec<_> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "4", "5", "6"]);
    }

    #[tokio::test]
    async fn post_photo_rejects_unsupported_extension_before_any_remote_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        std::fs::write(&path, b"gif").unwrap();

        let script = Arc::new(MockScript::default());
        let gateway = gateway(script.clone());

        let err = gateway.post_photo(&path, "").await.unwrap_err();
        assert!(matches!(err, GatewayError::Photo(_)));
        assert_eq!(script.call_count("upload_photo"), 0);
    }

    #[tokio::test]
    async fn post_photo_rejects_missing_file_before_any_remote_call() {
        let dir = tempfile::tempdir().unwrap();
        let script = Arc::new(MockScript::default());
        let gateway = gateway(script.clone());

        let err = gateway
            .post_photo(&dir.path().join("nope.jpg"), "")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Photo(_)));
        assert_eq!(script.call_count("upload_photo"), 0);
    }

    #[tokio::test]
    async fn post_photo_uploads_accepted_formats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Sunset.JPG");
        std::fs::write(&path, b"jpeg bytes").unwrap();

        let script = Arc::new(MockScript::default());
        MockScript::push(&script.upload_photo, Ok("3100_42".to_string()));
        let gateway = gateway(script.clone());

        let media_id = gateway.post_photo(&path, "golden hour").await.unwrap();
        assert_eq!(media_id, "3100_42");
        assert_eq!(script.call_count("upload_photo"), 1);
    }
}
