//! Concrete HTTP client for the platform's private REST API.
//!
//! Holds the reqwest client and the in-memory session, and translates the
//! wire format into the domain models. All error classification funnels
//! through `ClientError::from_status`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use reqwest::{header, multipart, Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use super::{ClientError, RemoteClient, SessionState};
use crate::models::{FeedEntry, UserProfile, UserSummary};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the private API.
const API_BASE_URL: &str = "https://i.instagram.com/api/v1";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// User agent of the mobile app build the private API expects.
const USER_AGENT: &str =
    "Instagram 265.0.0.19.301 Android (30/11; 420dpi; 1080x2260; samsung; SM-G975F; beyond2; exynos9820; en_US)";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    logged_in_user: LoggedInUser,
}

#[derive(Debug, Deserialize)]
struct LoggedInUser {
    pk: u64,
    username: String,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: UserProfile,
}

#[derive(Debug, Deserialize)]
struct UsersEnvelope {
    #[serde(default)]
    users: Vec<UserSummary>,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    feed_items: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_id: String,
}

#[derive(Debug, Deserialize)]
struct ConfigureResponse {
    media: ConfiguredMedia,
}

#[derive(Debug, Deserialize)]
struct ConfiguredMedia {
    id: String,
}

/// API client holding the connection pool and the current session.
pub struct ApiClient {
    client: Client,
    session: Option<SessionState>,
}

impl ApiClient {
    pub fn new() -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            session: None,
        })
    }

    /// Generate a device id in the format the API expects.
    fn generate_device_id() -> String {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..16)
            .map(|_| format!("{:x}", rng.gen_range(0..16)))
            .collect();
        format!("android-{}", suffix)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ClientError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref session) = self.session {
            let cookie = format!(
                "sessionid={}; csrftoken={}",
                session.session_token, session.csrf_token
            );
            headers.insert(
                header::COOKIE,
                header::HeaderValue::from_str(&cookie).map_err(|_| {
                    ClientError::InvalidResponse("session token is not header-safe".into())
                })?,
            );
            if !session.csrf_token.is_empty() {
                headers.insert(
                    header::HeaderName::from_static("x-csrftoken"),
                    header::HeaderValue::from_str(&session.csrf_token).map_err(|_| {
                        ClientError::InvalidResponse("csrf token is not header-safe".into())
                    })?,
                );
            }
        }
        Ok(headers)
    }

    /// Check if a response is successful, classifying the body if not.
    async fn check_response(response: Response) -> Result<Response, ClientError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ClientError::from_status(status, &body))
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let response = self
            .client
            .get(url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Pull a named cookie out of the Set-Cookie headers of a response.
    fn extract_cookie(headers: &header::HeaderMap, name: &str) -> Option<String> {
        headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|cookie| {
                let (pair, _) = cookie.split_once(';').unwrap_or((cookie, ""));
                let (key, value) = pair.split_once('=')?;
                (key.trim() == name && !value.is_empty()).then(|| value.to_string())
            })
    }
}

#[async_trait]
impl RemoteClient for ApiClient {
    async fn login(&mut self, username: &str, password: &str) -> Result<(), ClientError> {
        // Reuse the device id from a restored session; the server ties
        // session validity to it.
        let device_id = self
            .session
            .as_ref()
            .map(|s| s.device_id.clone())
            .unwrap_or_else(Self::generate_device_id);

        let url = format!("{}/accounts/login/", API_BASE_URL);
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .form(&[
                ("username", username),
                ("password", password),
                ("device_id", device_id.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let session_token = Self::extract_cookie(response.headers(), "sessionid");
        let csrf_token = Self::extract_cookie(response.headers(), "csrftoken");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status, &body));
        }

        let login: LoginResponse = response.json().await?;
        debug!(user_id = login.logged_in_user.pk, "login accepted");

        // When the server revalidates a restored session it may not set
        // fresh cookies; keep the ones we already have in that case.
        let session_token = session_token
            .or_else(|| self.session.as_ref().map(|s| s.session_token.clone()))
            .ok_or_else(|| {
                ClientError::InvalidResponse("login response carried no session cookie".into())
            })?;
        let csrf_token = csrf_token
            .or_else(|| self.session.as_ref().map(|s| s.csrf_token.clone()))
            .unwrap_or_default();

        self.session = Some(SessionState {
            device_id,
            session_token,
            csrf_token,
            user_id: login.logged_in_user.pk,
            username: login.logged_in_user.username,
            created_at: Utc::now(),
        });
        Ok(())
    }

    fn restore_session(&mut self, state: SessionState) {
        self.session = Some(state);
    }

    fn export_session(&self) -> Result<SessionState, ClientError> {
        self.session.clone().ok_or(ClientError::AuthExpired)
    }

    fn user_id(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.user_id)
    }

    async fn current_account(&self) -> Result<UserProfile, ClientError> {
        let url = format!("{}/accounts/current_user/", API_BASE_URL);
        let envelope: UserEnvelope = self.get_json(&url).await?;
        Ok(envelope.user)
    }

    async fn user_id_from_username(&self, username: &str) -> Result<u64, ClientError> {
        let url = format!("{}/users/{}/usernameinfo/", API_BASE_URL, username);
        let envelope: UserEnvelope = self.get_json(&url).await?;
        Ok(envelope.user.pk)
    }

    async fn user_info(&self, user_id: u64) -> Result<UserProfile, ClientError> {
        let url = format!("{}/users/{}/info/", API_BASE_URL, user_id);
        let envelope: UserEnvelope = self.get_json(&url).await?;
        Ok(envelope.user)
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserSummary>, ClientError> {
        let url = format!("{}/users/search/", API_BASE_URL);
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .query(&[("q", query)])
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        let envelope: UsersEnvelope = response.json().await?;
        Ok(envelope.users)
    }

    async fn timeline_feed(&self) -> Result<Vec<FeedEntry>, ClientError> {
        let url = format!("{}/feed/timeline/", API_BASE_URL);
        let timeline: TimelineResponse = self.get_json(&url).await?;
        debug!(items = timeline.feed_items.len(), "timeline page received");
        Ok(timeline.feed_items)
    }

    async fn upload_photo(&self, path: &Path, caption: &str) -> Result<String, ClientError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ClientError::UploadFailed(format!("{}: {}", path.display(), e)))?;

        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("photo.jpg")
            .to_string();
        let mime = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => "image/png",
            _ => "image/jpeg",
        };

        let upload_id = Utc::now().timestamp_millis().to_string();
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| ClientError::UploadFailed(e.to_string()))?;
        let form = multipart::Form::new()
            .text("upload_id", upload_id)
            .part("photo", part);

        let url = format!("{}/upload/photo/", API_BASE_URL);
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .multipart(form)
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        let upload: UploadResponse = response.json().await?;
        debug!(upload_id = %upload.upload_id, "photo uploaded");

        // Publishing is a second step: configure attaches the caption and
        // makes the media visible.
        let url = format!("{}/media/configure/", API_BASE_URL);
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .form(&[
                ("upload_id", upload.upload_id.as_str()),
                ("caption", caption),
            ])
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        let configured: ConfigureResponse = response.json().await?;
        Ok(configured.media.id)
    }
}
