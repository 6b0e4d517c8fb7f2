//! Authenticated access to the Twitch API: token lookup, refresh and a single
//! retry after a rejected token.

use std::future::Future;
use std::sync::Arc;

use notifier_db::{Database, DbError};
use tokio::sync::{Mutex, RwLock};
use twitch_client::TwitchError;
use twitch_client::api::TwitchApiClient;
use twitch_client::auth::TwitchAuth;

use crate::config::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Twitch credentials not configured")]
    NotConfigured,

    #[error("No Twitch token stored")]
    NoToken,

    #[error(transparent)]
    Twitch(#[from] TwitchError),

    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

impl SessionError {
    /// Whether the user has to (re)authorize before calls can succeed.
    pub fn needs_auth(&self) -> bool {
        match self {
            Self::NoToken => true,
            Self::Twitch(e) => {
                matches!(e, TwitchError::AuthRequired | TwitchError::TokenRefreshFailed(_))
                    || e.is_unauthorized()
            }
            _ => false,
        }
    }
}

pub(crate) fn to_twitch_token(db: &notifier_db::Token) -> twitch_client::Token {
    twitch_client::Token {
        access_token: db.access_token.clone(),
        refresh_token: db.refresh_token.clone(),
        scope: db.scope.clone(),
        expires_at: db.expires_at,
    }
}

pub(crate) fn to_db_token(t: &twitch_client::Token) -> notifier_db::Token {
    notifier_db::Token {
        access_token: t.access_token.clone(),
        refresh_token: t.refresh_token.clone(),
        scope: t.scope.clone(),
        expires_at: t.expires_at,
    }
}

fn is_rotated_refresh_token(current: &twitch_client::Token, latest: &twitch_client::Token) -> bool {
    latest.refresh_token != current.refresh_token
}

pub struct TwitchSession {
    db: Database,
    config: Arc<RwLock<AppConfig>>,
    http: reqwest::Client,
    refresh_lock: Mutex<()>,
}

impl TwitchSession {
    pub fn new(db: Database, config: Arc<RwLock<AppConfig>>) -> Self {
        Self {
            db,
            config,
            http: reqwest::Client::new(),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub async fn auth(&self) -> Result<TwitchAuth, SessionError> {
        let config = self.config.read().await;
        if !config.twitch_configured() {
            return Err(SessionError::NotConfigured);
        }
        let redirect_uri = format!("http://localhost:{}/callback", config.server_port);
        Ok(TwitchAuth::new(
            config.client_id.clone(),
            config.client_secret.clone(),
            redirect_uri,
        ))
    }

    pub async fn client(&self) -> TwitchApiClient {
        let client_id = self.config.read().await.client_id.clone();
        TwitchApiClient::with_http(self.http.clone(), client_id)
    }

    pub async fn user_id(&self) -> String {
        self.config.read().await.twitch_user_id.clone()
    }

    pub fn has_token(&self) -> Result<bool, SessionError> {
        Ok(self.db.get_latest_token()?.is_some())
    }

    /// Stored token, refreshed first when it is about to expire.
    pub async fn valid_token(&self) -> Result<twitch_client::Token, SessionError> {
        let db_token = self.db.get_latest_token()?.ok_or(SessionError::NoToken)?;
        let current = to_twitch_token(&db_token);

        let auth = self.auth().await?;
        if let Some(token) = auth.get_or_refresh_token(&current).await? {
            self.db.save_token(&to_db_token(&token))?;
            tracing::info!(expires_at = token.expires_at, "Token auto-refreshed");
            return Ok(token);
        }
        Ok(current)
    }

    /// Refresh unconditionally, unless a concurrent caller already rotated it.
    pub async fn force_refresh(
        &self,
        current: &twitch_client::Token,
    ) -> Result<twitch_client::Token, SessionError> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(db_token) = self.db.get_latest_token()? {
            let latest = to_twitch_token(&db_token);
            if is_rotated_refresh_token(current, &latest) {
                tracing::info!("Token already refreshed by another request; reusing latest token");
                return Ok(latest);
            }
        }

        let auth = self.auth().await?;
        let new_token = auth.refresh_token(&current.refresh_token).await?;
        self.db.save_token(&to_db_token(&new_token))?;
        tracing::info!(expires_at = new_token.expires_at, "Token refreshed after 401");
        Ok(new_token)
    }

    /// Run an API call with a valid token, refreshing and retrying once on 401.
    pub async fn call<T, F, Fut>(&self, f: F) -> Result<T, SessionError>
    where
        F: Fn(TwitchApiClient, twitch_client::Token) -> Fut,
        Fut: Future<Output = Result<T, TwitchError>>,
    {
        let client = self.client().await;
        let token = self.valid_token().await?;

        match f(client.clone(), token.clone()).await {
            Ok(v) => Ok(v),
            Err(e) if e.is_unauthorized() => {
                tracing::warn!("Twitch API returned 401, refreshing token and retrying");
                let refreshed = self.force_refresh(&token).await?;
                Ok(f(client, refreshed).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Finish the OAuth flow: exchange the code, store the token and remember
    /// who logged in.
    pub async fn complete_login(&self, code: &str) -> Result<twitch_client::Token, SessionError> {
        let auth = self.auth().await?;
        let token = auth.exchange_code(code).await?;
        self.db.save_token(&to_db_token(&token))?;
        tracing::info!(expires_at = token.expires_at, "OAuth token saved");

        let client = self.client().await;
        match client.get_current_user(&token).await {
            Ok(user) => {
                self.db.set_setting("TWITCH_USER_ID", &user.id, "normal")?;
                self.config.write().await.twitch_user_id = user.id.clone();
                tracing::info!(login = %user.login, "Logged in to Twitch");
            }
            Err(e) => tracing::warn!("Failed to resolve logged-in user: {e}"),
        }
        Ok(token)
    }

    pub fn logout(&self) -> Result<(), SessionError> {
        self.db.delete_all_tokens()?;
        tracing::info!("Twitch tokens removed");
        Ok(())
    }
}
