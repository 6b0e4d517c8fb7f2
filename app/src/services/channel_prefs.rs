//! Per-channel notification preferences stored in SQLite.

use async_trait::async_trait;
use notifier_db::Database;
use notify_core::{ChannelPreference, NotifyError, PreferenceLookup};

pub struct DbPreferences {
    db: Database,
}

impl DbPreferences {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PreferenceLookup for DbPreferences {
    async fn channel_preference(&self, channel_id: &str) -> notify_core::Result<ChannelPreference> {
        self.db
            .get_channel_notify(channel_id)
            .map(ChannelPreference::from)
            .map_err(|e| NotifyError::PreferenceLookup(format!("{channel_id}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn maps_stored_choices() {
        let db = Database::open_in_memory().unwrap();
        db.set_channel_notify("1", "One", Some(true)).unwrap();
        db.set_channel_notify("2", "Two", Some(false)).unwrap();
        db.set_channel_notify("3", "Three", None).unwrap();

        let prefs = DbPreferences::new(db);
        assert_eq!(prefs.channel_preference("1").await.unwrap(), ChannelPreference::Enabled);
        assert_eq!(prefs.channel_preference("2").await.unwrap(), ChannelPreference::Disabled);
        assert_eq!(prefs.channel_preference("3").await.unwrap(), ChannelPreference::Unset);
        assert_eq!(prefs.channel_preference("4").await.unwrap(), ChannelPreference::Unset);
    }
}
