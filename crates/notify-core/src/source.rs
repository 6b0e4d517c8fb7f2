use async_trait::async_trait;

use crate::Result;
use crate::stream::RemoteStream;

/// Supplies the currently-live followed streams.
#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Fetch at most `limit` live followed streams.
    async fn followed_streams(&self, limit: u32) -> Result<Vec<RemoteStream>>;

    /// Look up a single channel's live stream, if it is live.
    async fn live_stream(&self, channel_id: &str) -> Result<Option<RemoteStream>>;
}
