//! OAuth token storage.

use serde::{Deserialize, Serialize};

use crate::{Database, DbError, OptionalExt};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_at: i64,
}

impl Database {
    /// Store a token; only the most recent one is ever read back.
    pub fn save_token(&self, token: &Token) -> Result<(), DbError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM tokens", [])?;
            tx.execute(
                "INSERT INTO tokens (access_token, refresh_token, scope, expires_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![token.access_token, token.refresh_token, token.scope, token.expires_at],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_latest_token(&self) -> Result<Option<Token>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT access_token, refresh_token, scope, expires_at FROM tokens ORDER BY id DESC LIMIT 1",
            )?;
            let token = stmt
                .query_row([], |row| {
                    Ok(Token {
                        access_token: row.get(0)?,
                        refresh_token: row.get(1)?,
                        scope: row.get(2)?,
                        expires_at: row.get(3)?,
                    })
                })
                .optional()?;
            Ok(token)
        })
    }

    pub fn delete_all_tokens(&self) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM tokens", [])?;
            Ok(())
        })
    }
}
