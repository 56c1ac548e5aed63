//! Command handlers.
//!
//! Each authenticated command starts by asking the authenticator for a
//! validated handle; the explicit precondition replaces any notion of a
//! guarded command registry. Handlers never print errors themselves:
//! they return one message per failure and `main` prints it once.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use gramline_core::api::{ApiClient, ClientError};
use gramline_core::auth::session::SessionStore;
use gramline_core::auth::{AuthError, Authenticator};
use gramline_core::config::Config;
use gramline_core::gateway::{Gateway, GatewayError};

use crate::output;

fn authenticator(
) -> Result<Authenticator<ApiClient, impl Fn() -> Result<ApiClient, ClientError>>> {
    let store = SessionStore::from_env()?;
    Ok(Authenticator::new(store, ApiClient::new))
}

/// Validated gateway for authenticated commands, or a user-facing error
/// telling the user what to do.
async fn gateway() -> Result<Gateway<ApiClient>> {
    let auth = authenticator()?;
    let client = match auth.handle().await {
        Ok(client) => client,
        Err(AuthError::NotAuthenticated) => {
            bail!("Not authenticated. Please run 'gramline login' first.")
        }
        Err(AuthError::SessionExpired) => {
            bail!("Session expired. Please run 'gramline login' again.")
        }
        Err(err) => return Err(err).context("Failed to validate session"),
    };
    Ok(Gateway::new(client))
}

pub async fn login(username: Option<String>) -> Result<()> {
    let mut config = Config::load().unwrap_or_default();

    let username = match username {
        Some(username) => username,
        None => prompt_username(config.last_username.as_deref())?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    let auth = authenticator()?;
    output::info("Logging in...");
    match auth.login(&username, &password).await {
        Ok(_) => {
            output::info(&format!(
                "Session saved to {}",
                auth.store().path().display()
            ));
            output::success(&format!("Logged in as @{username}"));

            config.last_username = Some(username);
            if let Err(err) = config.save() {
                tracing::warn!(error = %err, "failed to save config");
            }
            Ok(())
        }
        Err(AuthError::Client(ClientError::BadCredentials)) => {
            bail!("Invalid password. Please check your credentials.")
        }
        Err(AuthError::Client(ClientError::TwoFactorRequired)) => {
            bail!("Two-factor authentication is required. Disable 2FA or use an app-specific password.")
        }
        Err(AuthError::Client(ClientError::ChallengeRequired)) => {
            bail!("Additional verification is required. Verify your account through the app first.")
        }
        Err(err) => Err(err).context("Login failed"),
    }
}

fn prompt_username(default: Option<&str>) -> Result<String> {
    match default {
        Some(default) => print!("Username [{default}]: "),
        None => print!("Username: "),
    }
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let input = line.trim();
    if input.is_empty() {
        if let Some(default) = default {
            return Ok(default.to_string());
        }
        bail!("Username is required");
    }
    Ok(input.to_string())
}

pub fn logout() -> Result<()> {
    let auth = authenticator()?;
    if auth.logout()? {
        output::success("Logged out successfully");
    } else {
        output::info("No active session found");
    }
    Ok(())
}

pub async fn stats() -> Result<()> {
    let gateway = gateway().await?;
    let stats = gateway
        .account_stats()
        .await
        .context("Failed to get stats")?;
    output::print_stats(&stats);
    Ok(())
}

pub async fn whoami() -> Result<()> {
    let gateway = gateway().await?;
    let profile = gateway
        .current_user()
        .await
        .context("Failed to get user info")?;
    output::print_profile(&profile);
    Ok(())
}

pub async fn user(username: &str) -> Result<()> {
    let gateway = gateway().await?;
    let profile = gateway.user_info(username).await.with_context(|| {
        format!(
            "Failed to get user info for @{}",
            username.trim_start_matches('@')
        )
    })?;
    output::print_profile(&profile);
    Ok(())
}

pub async fn search(query: &str, limit: usize) -> Result<()> {
    let gateway = gateway().await?;
    let results = gateway
        .search_users(query, limit)
        .await
        .context("Search failed")?;

    if results.is_empty() {
        output::info(&format!("No users found for query: {query}"));
        return Ok(());
    }
    output::print_search_results(&results);
    output::info(&format!("Found {} user(s)", results.len()));
    Ok(())
}

pub async fn feed(limit: usize) -> Result<()> {
    let gateway = gateway().await?;
    output::info(&format!("Fetching up to {limit} posts from your feed..."));
    let posts = gateway.feed(limit).await.context("Failed to get feed")?;

    if posts.is_empty() {
        output::info("No posts found in your feed");
        return Ok(());
    }
    output::print_feed(&posts);
    output::info(&format!("Showing {} post(s)", posts.len()));
    Ok(())
}

pub async fn post(photo: &Path, caption: &str) -> Result<()> {
    let gateway = gateway().await?;
    let media_id = match gateway.post_photo(photo, caption).await {
        Ok(id) => id,
        Err(GatewayError::Photo(message)) => bail!("{message}"),
        Err(err) => return Err(err).context("Failed to post photo"),
    };
    output::success(&format!("Photo posted successfully! Media ID: {media_id}"));
    Ok(())
}
