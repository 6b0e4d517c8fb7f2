use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use notifier_db::Database;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio_util::sync::CancellationToken;

use crate::config::{AppConfig, SettingsManager};
use crate::notification::Notifier;
use crate::services::twitch_session::TwitchSession;

/// Application shared state accessible from axum handlers and background loops.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<SharedStateInner>,
}

struct SharedStateInner {
    /// Broadcast channel for WebSocket messages
    ws_tx: broadcast::Sender<String>,
    /// Application configuration (reloadable)
    config: Arc<RwLock<AppConfig>>,
    db: Database,
    data_dir: PathBuf,
    shutdown_token: CancellationToken,
    /// CSRF state of the OAuth flow in progress
    oauth_state: Mutex<Option<String>>,
    session: Arc<TwitchSession>,
    /// Set once the notification system is built
    notifier: OnceLock<Arc<Notifier>>,
}

impl SharedState {
    /// Create shared state from an already-opened database and loaded config.
    pub fn new(db: Database, config: AppConfig, data_dir: PathBuf) -> Self {
        let (ws_tx, _) = broadcast::channel(256);
        let config = Arc::new(RwLock::new(config));
        let session = Arc::new(TwitchSession::new(db.clone(), config.clone()));

        Self {
            inner: Arc::new(SharedStateInner {
                ws_tx,
                config,
                db,
                data_dir,
                shutdown_token: CancellationToken::new(),
                oauth_state: Mutex::new(None),
                session,
                notifier: OnceLock::new(),
            }),
        }
    }

    pub fn server_port(&self) -> u16 {
        self.inner
            .config
            .try_read()
            .map(|c| c.server_port)
            .unwrap_or(8090)
    }

    pub fn ws_sender(&self) -> &broadcast::Sender<String> {
        &self.inner.ws_tx
    }

    pub fn subscribe_ws(&self) -> broadcast::Receiver<String> {
        self.inner.ws_tx.subscribe()
    }

    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.inner.data_dir
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown_token
    }

    pub fn session(&self) -> &Arc<TwitchSession> {
        &self.inner.session
    }

    /// Get a read lock on the current config.
    pub async fn config(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.config.read().await
    }

    /// Reload config from the database.
    pub async fn reload_config(&self) -> Result<(), anyhow::Error> {
        let sm = SettingsManager::new(self.inner.db.clone());
        let mut config = self.inner.config.write().await;
        config.reload(&sm)?;
        Ok(())
    }

    pub async fn set_oauth_state(&self, value: String) {
        *self.inner.oauth_state.lock().await = Some(value);
    }

    pub async fn take_oauth_state(&self) -> Option<String> {
        self.inner.oauth_state.lock().await.take()
    }

    pub fn notifier(&self) -> Option<&Arc<Notifier>> {
        self.inner.notifier.get()
    }

    /// Install the notification system. Only the first call has an effect.
    pub fn set_notifier(&self, notifier: Arc<Notifier>) -> bool {
        self.inner.notifier.set(notifier).is_ok()
    }
}
