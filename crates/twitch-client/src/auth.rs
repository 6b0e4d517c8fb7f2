//! OAuth token management for Twitch authentication.
//!
//! Authorization-code flow plus refresh; persistence is left to the caller.

use chrono::Utc;
use serde::Deserialize;
use url::Url;

use crate::{SCOPES, Token, TwitchError};

const AUTHORIZE_URL: &str = "https://id.twitch.tv/oauth2/authorize";
const TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Refresh once fewer than this many seconds of validity remain.
pub const REFRESH_MARGIN_SECS: i64 = 30 * 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    scope: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
}

/// Manages Twitch OAuth authentication.
pub struct TwitchAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http: reqwest::Client,
}

impl TwitchAuth {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            http: reqwest::Client::new(),
        }
    }

    /// Authorization URL carrying `state` for CSRF protection.
    pub fn get_auth_url(&self, state: &str) -> Result<String, TwitchError> {
        let mut url = Url::parse(AUTHORIZE_URL)?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &SCOPES.join(" "))
            .append_pair("state", state);
        Ok(url.to_string())
    }

    /// Exchange an authorization code for access and refresh tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<Token, TwitchError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        let resp = self.http.post(TOKEN_URL).form(&params).send().await?;
        parse_token_response(resp.status(), &resp.text().await?)
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Token, TwitchError> {
        tracing::info!("Refreshing Twitch OAuth token");

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        let resp = self.http.post(TOKEN_URL).form(&params).send().await?;
        parse_token_response(resp.status(), &resp.text().await?)
    }

    /// Refresh `current` if it expires within [`REFRESH_MARGIN_SECS`].
    ///
    /// `Ok(None)` means the current token is still good; `Ok(Some(_))` is a
    /// new token the caller should persist.
    pub async fn get_or_refresh_token(
        &self,
        current: &Token,
    ) -> Result<Option<Token>, TwitchError> {
        if !current.expires_within(REFRESH_MARGIN_SECS) {
            return Ok(None);
        }

        if current.refresh_token.is_empty() {
            return Err(TwitchError::AuthRequired);
        }

        tracing::info!(
            expires_in_secs = current.expires_at - Utc::now().timestamp(),
            "Token expiring soon, refreshing"
        );
        self.refresh_token(&current.refresh_token).await.map(Some)
    }
}

fn parse_token_response(status: reqwest::StatusCode, body: &str) -> Result<Token, TwitchError> {
    if !status.is_success() {
        let err: ErrorResponse = serde_json::from_str(body).unwrap_or(ErrorResponse {
            error: Some(status.to_string()),
            message: None,
            error_description: Some(body.to_string()),
        });
        let detail = err.error_description.or(err.message).unwrap_or_default();
        return Err(TwitchError::TokenRefreshFailed(format!(
            "{}: {detail}",
            err.error.unwrap_or_default()
        )));
    }

    let token_resp: TokenResponse = serde_json::from_str(body)
        .map_err(|e| TwitchError::TokenRefreshFailed(format!("failed to parse response: {e}")))?;

    let scope = token_resp
        .scope
        .map(|s| s.join(" "))
        .unwrap_or_else(|| SCOPES.join(" "));

    Ok(Token {
        access_token: token_resp.access_token,
        refresh_token: token_resp.refresh_token,
        scope,
        expires_at: Utc::now().timestamp() + token_resp.expires_in,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_url_carries_scope_and_state() {
        let auth = TwitchAuth::new(
            "test_client_id".into(),
            "test_secret".into(),
            "http://localhost:8090/callback".into(),
        );
        let url = auth.get_auth_url("xyz").unwrap();

        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state=xyz"));
        assert!(url.contains("user%3Aread%3Afollows"));
    }

    #[tokio::test]
    async fn valid_token_is_not_refreshed() {
        let auth = TwitchAuth::new("id".into(), "secret".into(), "http://localhost".into());
        let token = Token {
            access_token: "abc".into(),
            refresh_token: "def".into(),
            scope: "read".into(),
            expires_at: Utc::now().timestamp() + 7200,
        };

        let result = auth.get_or_refresh_token(&token).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn expiring_token_without_refresh_requires_auth() {
        let auth = TwitchAuth::new("id".into(), "secret".into(), "http://localhost".into());
        let token = Token {
            access_token: "abc".into(),
            refresh_token: String::new(),
            scope: String::new(),
            expires_at: Utc::now().timestamp() + 60,
        };

        let err = auth.get_or_refresh_token(&token).await.unwrap_err();
        assert!(matches!(err, TwitchError::AuthRequired));
    }

    #[test]
    fn token_response_parsing() {
        let body = r#"{"access_token":"a","refresh_token":"r","expires_in":3600,"scope":["user:read:follows"],"token_type":"bearer"}"#;
        let token = parse_token_response(reqwest::StatusCode::OK, body).unwrap();
        assert_eq!(token.access_token, "a");
        assert_eq!(token.scope, "user:read:follows");
        assert!(token.expires_at > Utc::now().timestamp());

        let body = r#"{"status":400,"message":"Invalid refresh token"}"#;
        let err = parse_token_response(reqwest::StatusCode::BAD_REQUEST, body).unwrap_err();
        assert!(err.to_string().contains("Invalid refresh token"));
    }
}
