//! Stream values exchanged between the poller stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A live stream as reported by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStream {
    pub channel_id: String,
    pub channel_login: String,
    pub created_at: DateTime<Utc>,
    pub display_name: String,
    pub status_text: String,
    pub logo_url: Option<String>,
}

impl RemoteStream {
    /// Whether this sighting started strictly after `snapshot` was first observed.
    pub fn is_newer_than(&self, snapshot: &StreamSnapshot) -> bool {
        self.created_at > snapshot.observed_since
    }
}

/// A channel that was live at some earlier poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSnapshot {
    pub channel_id: String,
    pub observed_since: DateTime<Utc>,
    pub consecutive_misses: u32,
}

impl From<&RemoteStream> for StreamSnapshot {
    fn from(stream: &RemoteStream) -> Self {
        Self {
            channel_id: stream.channel_id.clone(),
            observed_since: stream.created_at,
            consecutive_misses: 0,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};

    use super::{RemoteStream, StreamSnapshot};

    pub fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    pub fn stream(id: &str, created: i64) -> RemoteStream {
        RemoteStream {
            channel_id: id.to_string(),
            channel_login: id.to_lowercase(),
            created_at: at(created),
            display_name: id.to_uppercase(),
            status_text: format!("{id} status"),
            logo_url: Some(format!("https://cdn.example/{id}.png")),
        }
    }

    pub fn snapshot(id: &str, since: i64, misses: u32) -> StreamSnapshot {
        StreamSnapshot {
            channel_id: id.to_string(),
            observed_since: at(since),
            consecutive_misses: misses,
        }
    }
}
