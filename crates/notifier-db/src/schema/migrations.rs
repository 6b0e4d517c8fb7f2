use rusqlite::Connection;

use crate::DbError;

/// Bring tables created by older releases up to the current schema.
pub(super) fn migrate_legacy_tables(conn: &Connection) -> Result<(), DbError> {
    migrate_channel_settings_add_display_name(conn)?;
    Ok(())
}

/// channel_settings: early releases stored only the id and the flag.
fn migrate_channel_settings_add_display_name(conn: &Connection) -> Result<(), DbError> {
    if column_exists(conn, "channel_settings", "display_name")? {
        return Ok(());
    }
    tracing::info!("Adding display_name column to channel_settings");
    conn.execute_batch(
        "ALTER TABLE channel_settings ADD COLUMN display_name TEXT NOT NULL DEFAULT '';",
    )?;
    Ok(())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DbError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|name| name == column))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_display_name_to_old_channel_settings() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE channel_settings (
                channel_id TEXT PRIMARY KEY,
                notify_enabled BOOLEAN,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
            INSERT INTO channel_settings (channel_id, notify_enabled) VALUES ('1', 0);",
        )
        .unwrap();

        crate::schema::run_migrations(&conn).unwrap();
        assert!(column_exists(&conn, "channel_settings", "display_name").unwrap());

        let name: String = conn
            .query_row(
                "SELECT display_name FROM channel_settings WHERE channel_id = '1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(name, "");
    }
}
