use std::collections::HashMap;

use super::test_db;
use crate::tokens;

#[test]
fn test_open_and_migrate() {
    let db = test_db();
    let settings = db.get_all_settings().unwrap();
    assert!(settings.is_empty());
    assert!(db.list_channel_settings().unwrap().is_empty());
}

#[test]
fn test_settings_crud() {
    let db = test_db();
    db.set_setting("key1", "value1", "normal").unwrap();
    assert_eq!(db.get_setting("key1").unwrap(), Some("value1".into()));

    db.set_setting("key1", "value2", "normal").unwrap();
    assert_eq!(db.get_setting("key1").unwrap(), Some("value2".into()));

    db.delete_setting("key1").unwrap();
    assert_eq!(db.get_setting("key1").unwrap(), None);
}

#[test]
fn test_settings_bulk_update() {
    let db = test_db();
    let mut batch = HashMap::new();
    batch.insert("NOTIFY_GROUPING".to_string(), ("false".to_string(), "normal"));
    batch.insert("CLIENT_SECRET".to_string(), ("s3cret".to_string(), "secret"));
    db.update_settings_bulk(&batch).unwrap();

    let all = db.get_all_settings().unwrap();
    assert_eq!(all.get("NOTIFY_GROUPING").map(String::as_str), Some("false"));
    assert_eq!(all.get("CLIENT_SECRET").map(String::as_str), Some("s3cret"));
}

#[test]
fn test_tokens_keep_latest_only() {
    let db = test_db();
    assert!(db.get_latest_token().unwrap().is_none());

    for access in ["first", "second"] {
        db.save_token(&tokens::Token {
            access_token: access.into(),
            refresh_token: "def".into(),
            scope: "user:read:follows".into(),
            expires_at: 9_999_999,
        })
        .unwrap();
    }

    let got = db.get_latest_token().unwrap().unwrap();
    assert_eq!(got.access_token, "second");
    let rows: i64 = db
        .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM tokens", [], |r| r.get(0))?))
        .unwrap();
    assert_eq!(rows, 1);

    db.delete_all_tokens().unwrap();
    assert!(db.get_latest_token().unwrap().is_none());
}
