//! Scripted client for exercising the authenticator and gateway without a
//! network. Results are queued per operation and every call is recorded.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use super::{ClientError, RemoteClient, SessionState};
use crate::models::{Caption, FeedEntry, FeedPost, PostAuthor, UserProfile, UserSummary};

type Scripted<T> = Mutex<VecDeque<Result<T, ClientError>>>;

/// Shared script and call log. Clients created by a factory in the same
/// test all point at one script, so expectations survive re-creation.
#[derive(Default, Debug)]
pub(crate) struct MockScript {
    pub login: Scripted<SessionState>,
    pub current_account: Scripted<UserProfile>,
    pub user_id_from_username: Scripted<u64>,
    pub user_info: Scripted<UserProfile>,
    pub search_users: Scripted<Vec<UserSummary>>,
    pub timeline_feed: Scripted<Vec<FeedEntry>>,
    pub upload_photo: Scripted<String>,
    calls: Mutex<Vec<String>>,
}

impl MockScript {
    pub fn record(&self, entry: impl Into<String>) {
        self.calls.lock().unwrap().push(entry.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls to the named operation.
    pub fn call_count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.split(':').next() == Some(name))
            .count()
    }

    pub fn push<T>(queue: &Scripted<T>, result: Result<T, ClientError>) {
        queue.lock().unwrap().push_back(result);
    }

    fn take<T>(queue: &Scripted<T>, name: &str) -> Result<T, ClientError> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted result for {name}"))
    }
}

#[derive(Debug)]
pub(crate) struct MockClient {
    pub script: Arc<MockScript>,
    pub session: Option<SessionState>,
}

impl MockClient {
    pub fn new(script: Arc<MockScript>) -> Self {
        Self {
            script,
            session: None,
        }
    }
}

#[async_trait]
impl RemoteClient for MockClient {
    async fn login(&mut self, username: &str, _password: &str) -> Result<(), ClientError> {
        self.script.record(format!("login:{username}"));
        let state = MockScript::take(&self.script.login, "login")?;
        self.session = Some(state);
        Ok(())
    }

    fn restore_session(&mut self, state: SessionState) {
        self.script.record("restore_session");
        self.session = Some(state);
    }

    fn export_session(&self) -> Result<SessionState, ClientError> {
        self.session.clone().ok_or(ClientError::AuthExpired)
    }

    fn user_id(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.user_id)
    }

    async fn current_account(&self) -> Result<UserProfile, ClientError> {
        self.script.record("current_account");
        MockScript::take(&self.script.current_account, "current_account")
    }

    async fn user_id_from_username(&self, username: &str) -> Result<u64, ClientError> {
        self.script
            .record(format!("user_id_from_username:{username}"));
        MockScript::take(&self.script.user_id_from_username, "user_id_from_username")
    }

    async fn user_info(&self, user_id: u64) -> Result<UserProfile, ClientError> {
        self.script.record(format!("user_info:{user_id}"));
        MockScript::take(&self.script.user_info, "user_info")
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserSummary>, ClientError> {
        self.script.record(format!("search_users:{query}"));
        MockScript::take(&self.script.search_users, "search_users")
    }

    async fn timeline_feed(&self) -> Result<Vec<FeedEntry>, ClientError> {
        self.script.record("timeline_feed");
        MockScript::take(&self.script.timeline_feed, "timeline_feed")
    }

    async fn upload_photo(&self, path: &Path, _caption: &str) -> Result<String, ClientError> {
        self.script
            .record(format!("upload_photo:{}", path.display()));
        MockScript::take(&self.script.upload_photo, "upload_photo")
    }
}

// Fixtures shared by the authenticator and gateway tests.

pub(crate) fn session_state(token: &str) -> SessionState {
    SessionState {
        device_id: "android-0123456789abcdef".into(),
        session_token: token.into(),
        csrf_token: "csrf".into(),
        user_id: 42,
        username: "jane".into(),
        created_at: Utc::now(),
    }
}

pub(crate) fn profile(username: &str, followers: u64) -> UserProfile {
    UserProfile {
        pk: 42,
        username: username.into(),
        full_name: Some("Jane Doe".into()),
        biography: None,
        follower_count: followers,
        following_count: 10,
        media_count: 5,
        is_private: false,
        is_verified: false,
        external_url: None,
        profile_pic_url: None,
    }
}

pub(crate) fn summary(username: &str) -> UserSummary {
    UserSummary {
        pk: 7,
        username: username.into(),
        full_name: None,
        follower_count: 100,
        is_private: false,
        is_verified: false,
    }
}

pub(crate) fn media_entry(id: &str) -> FeedEntry {
    FeedEntry {
        media_or_ad: Some(FeedPost {
            id: id.into(),
            user: PostAuthor {
                username: "jane".into(),
                full_name: None,
            },
            caption: Some(Caption {
                text: format!("post {id}"),
            }),
            like_count: 1,
            comment_count: 0,
            media_type: 1,
            taken_at: Utc::now(),
            injected: false,
        }),
    }
}

pub(crate) fn ad_entry(id: &str) -> FeedEntry {
    let mut entry = media_entry(id);
    if let Some(post) = entry.media_or_ad.as_mut() {
        post.injected = true;
    }
    entry
}

pub(crate) fn non_media_entry() -> FeedEntry {
    FeedEntry { media_or_ad: None }
}
