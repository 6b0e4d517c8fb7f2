//! Core of the live-stream notifier.
//!
//! Polls followed streams, reconciles them against what was already seen,
//! filters by per-channel preference, batches notifications and hands them
//! to a notification provider with platform-aware fallback.
//!
//! Every I/O concern (fetching, preference storage, icon files, rendering)
//! is a trait supplied by the caller.

pub mod batcher;
pub mod filter;
pub mod poller;
pub mod provider;
pub mod reconcile;
pub mod source;
pub mod stream;

pub use batcher::{BatchOptions, ClickAction, IconCache, NotificationBatcher, StreamClickHandler};
pub use filter::{ChannelFilter, ChannelPreference, PreferenceLookup};
pub use poller::{NotifierMode, NotifyPreferences, Poller, PollerConfig, PollerDeps, PollerStatus};
pub use provider::{
    FallbackMemo, NotificationData, NotificationProvider, OnClick, Platform, PlatformKey,
    ProviderCapability, ProviderInstance, ProviderRegistry, ProviderSelector, SetupData,
};
pub use reconcile::{Reconciliation, ReconciliationEngine, reconcile};
pub use source::StreamSource;
pub use stream::{RemoteStream, StreamSnapshot};

/// Unified error type for the notify-core crate.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Stream fetch failed: {0}")]
    Fetch(String),

    #[error("Channel preference lookup failed: {0}")]
    PreferenceLookup(String),

    #[error("Icon download failed: {0}")]
    IconDownload(String),

    #[error("Cache cleanup failed: {0}")]
    Cleanup(String),

    #[error("Unknown notification provider: {0}")]
    UnknownProvider(String),

    #[error("Notification provider {provider} unavailable: {message}")]
    ProviderUnavailable { provider: String, message: String },

    #[error("Notification provider {provider} failed: {message}")]
    ProviderFailed { provider: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NotifyError>;
