//! In-app notifications rendered by WebSocket clients.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use notify_core::{
    NotificationData, NotificationProvider, OnClick, PlatformKey, ProviderCapability,
    ProviderInstance, SetupData,
};
use tokio::sync::broadcast;

use super::RICH;
use crate::events::{self, RichNotificationPayload};

/// Clicks remembered for notifications still on screen.
const MAX_PENDING_CLICKS: usize = 100;

#[derive(Default)]
struct Clicks {
    next_id: u64,
    pending: VecDeque<(u64, OnClick)>,
}

/// Click callbacks of rich notifications, looked up by the id sent to clients.
#[derive(Clone, Default)]
pub struct ClickRegistry {
    inner: Arc<Mutex<Clicks>>,
}

impl ClickRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Clicks> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate an id, remembering `on_click` if present.
    pub fn register(&self, on_click: Option<OnClick>) -> u64 {
        let mut clicks = self.lock();
        clicks.next_id += 1;
        let id = clicks.next_id;
        if let Some(on_click) = on_click {
            if clicks.pending.len() == MAX_PENDING_CLICKS {
                clicks.pending.pop_front();
            }
            clicks.pending.push_back((id, on_click));
        }
        id
    }

    /// Run and forget the callback of notification `id`.
    pub fn invoke(&self, id: u64) -> bool {
        let on_click = {
            let mut clicks = self.lock();
            let Some(pos) = clicks.pending.iter().position(|(i, _)| *i == id) else {
                return false;
            };
            clicks.pending.remove(pos).map(|(_, f)| f)
        };
        match on_click {
            Some(f) => {
                f();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Last-resort provider: always available, shown by the control UI.
pub struct RichProvider {
    capability: ProviderCapability,
    ws_tx: broadcast::Sender<String>,
    clicks: ClickRegistry,
}

impl RichProvider {
    pub fn new(ws_tx: broadcast::Sender<String>, clicks: ClickRegistry) -> Self {
        Self {
            capability: ProviderCapability::new(RICH)
                .on(PlatformKey::Win32, None)
                .on(PlatformKey::Darwin, None)
                .on(PlatformKey::Linux, None),
            ws_tx,
            clicks,
        }
    }
}

#[async_trait]
impl NotificationProvider for RichProvider {
    fn capability(&self) -> &ProviderCapability {
        &self.capability
    }

    async fn test(&self) -> notify_core::Result<SetupData> {
        Ok(SetupData::Null)
    }

    fn create(&self, _setup: SetupData) -> notify_core::Result<Arc<dyn ProviderInstance>> {
        Ok(Arc::new(RichInstance {
            ws_tx: self.ws_tx.clone(),
            clicks: self.clicks.clone(),
        }))
    }
}

struct RichInstance {
    ws_tx: broadcast::Sender<String>,
    clicks: ClickRegistry,
}

#[async_trait]
impl ProviderInstance for RichInstance {
    async fn notify(&self, data: &NotificationData) -> notify_core::Result<()> {
        let id = self.clicks.register(data.on_click.clone());
        let payload = RichNotificationPayload {
            id,
            title: data.title.clone(),
            body: data.body.clone(),
            icon: data.icon.as_ref().map(|p| p.to_string_lossy().into_owned()),
            clickable: data.on_click.is_some(),
        };
        events::broadcast(&self.ws_tx, events::RICH_NOTIFICATION, &payload);
        Ok(())
    }
}
