//! Per-channel notification preferences.
//!
//! `notify_enabled` is tri-state: `NULL` means the user never chose and the
//! global default applies.

use serde::Serialize;

use crate::{Database, DbError, OptionalExt};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSetting {
    pub channel_id: String,
    pub display_name: String,
    pub notify_enabled: Option<bool>,
    pub updated_at: String,
}

impl Database {
    pub fn get_channel_notify(&self, channel_id: &str) -> Result<Option<bool>, DbError> {
        self.with_conn(|conn| {
            let value = conn
                .query_row(
                    "SELECT notify_enabled FROM channel_settings WHERE channel_id = ?1",
                    [channel_id],
                    |row| row.get::<_, Option<bool>>(0),
                )
                .optional()?;
            Ok(value.flatten())
        })
    }

    pub fn get_channel_setting(&self, channel_id: &str) -> Result<Option<ChannelSetting>, DbError> {
        self.with_conn(|conn| {
            let setting = conn
                .query_row(
                    "SELECT channel_id, display_name, notify_enabled, COALESCE(updated_at, '')
                     FROM channel_settings WHERE channel_id = ?1",
                    [channel_id],
                    map_row,
                )
                .optional()?;
            Ok(setting)
        })
    }

    /// Store a preference. `None` clears the explicit choice but keeps the row.
    pub fn set_channel_notify(
        &self,
        channel_id: &str,
        display_name: &str,
        notify_enabled: Option<bool>,
    ) -> Result<(), DbError> {
        if channel_id.is_empty() {
            return Err(DbError::InvalidData("channel_id must not be empty".into()));
        }
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO channel_settings (channel_id, display_name, notify_enabled, updated_at)
                 VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
                 ON CONFLICT(channel_id) DO UPDATE SET
                    display_name = CASE WHEN ?2 = '' THEN display_name ELSE ?2 END,
                    notify_enabled = ?3,
                    updated_at = CURRENT_TIMESTAMP",
                rusqlite::params![channel_id, display_name, notify_enabled],
            )?;
            Ok(())
        })
    }

    /// Returns true when a row was removed.
    pub fn delete_channel_setting(&self, channel_id: &str) -> Result<bool, DbError> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM channel_settings WHERE channel_id = ?1",
                [channel_id],
            )?;
            Ok(removed > 0)
        })
    }

    pub fn list_channel_settings(&self) -> Result<Vec<ChannelSetting>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT channel_id, display_name, notify_enabled, COALESCE(updated_at, '')
                 FROM channel_settings ORDER BY display_name COLLATE NOCASE, channel_id",
            )?;
            let rows = stmt
                .query_map([], map_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChannelSetting> {
    Ok(ChannelSetting {
        channel_id: row.get(0)?,
        display_name: row.get(1)?,
        notify_enabled: row.get(2)?,
        updated_at: row.get(3)?,
    })
}
