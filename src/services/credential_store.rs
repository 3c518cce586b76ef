use crate::db::repositories::UserRepository;
use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// How close to expiry a stored access token is still considered usable.
/// Tokens inside this window are refreshed eagerly so a tool call never
/// starts with a token about to lapse mid-flight.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: i64,
}

/// Hands out a usable Google access token for a user, refreshing it against
/// the OAuth token endpoint when the stored one has expired.
#[derive(Clone)]
pub struct CredentialStore {
    user_repo: UserRepository,
    http: Client,
    client_id: String,
    client_secret: String,
    token_url: String,
}

impl CredentialStore {
    pub fn new(
        user_repo: UserRepository,
        http: Client,
        client_id: String,
        client_secret: String,
    ) -> Self {
        Self {
            user_repo,
            http,
            client_id,
            client_secret,
            token_url: GOOGLE_TOKEN_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_token_url(
        user_repo: UserRepository,
        http: Client,
        client_id: String,
        client_secret: String,
        token_url: String,
    ) -> Self {
        Self {
            user_repo,
            http,
            client_id,
            client_secret,
            token_url,
        }
    }

    /// Current access token for the user, refreshed if the stored one is
    /// expired or missing an expiry. Fails when the user never linked a
    /// Google account (no refresh token on file).
    pub async fn get_valid_access_token(&self, user_id: &Uuid) -> AppResult<String> {
        let credentials = self
            .user_repo
            .get_google_credentials(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let refresh_token = credentials.google_refresh_token.ok_or_else(|| {
            AppError::Auth("No Google account linked for this user".to_string())
        })?;

        let still_valid = credentials
            .google_token_expires_at
            .map(|expires_at| expires_at > Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS))
            .unwrap_or(false);

        if still_valid {
            if let Some(token) = credentials.google_access_token {
                return Ok(token);
            }
        }

        self.refresh(user_id, &refresh_token).await
    }

    async fn refresh(&self, user_id: &Uuid, refresh_token: &str) -> AppResult<String> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::External(format!("Token refresh request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!(
                "Google token refresh rejected ({}): {}",
                status, body
            )));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| AppError::External(format!("Malformed token refresh response: {}", e)))?;

        let expires_at = Utc::now() + Duration::seconds(refreshed.expires_in);
        self.user_repo
            .update_google_access_token(user_id, &refreshed.access_token, &expires_at)
            .await?;

        info!("Refreshed Google access token for user {}", user_id);
        Ok(refreshed.access_token)
    }
}
