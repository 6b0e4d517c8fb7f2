use super::channels::paged_url;
use super::*;

impl TwitchApiClient {
    /// Get one page of live streams from channels the user follows.
    pub async fn get_followed_streams_page(
        &self,
        token: &Token,
        user_id: &str,
        first: u32,
        after: Option<&str>,
    ) -> Result<(Vec<StreamInfo>, Option<String>), TwitchError> {
        let url = paged_url("streams/followed", user_id, first, after);
        let body = self.authenticated_get(&url, token).await?;
        let resp: HelixPaginatedResponse<StreamInfo> = serde_json::from_str(&body)?;
        let next_cursor = resp.pagination.and_then(|p| p.cursor);
        Ok((resp.data, next_cursor))
    }

    /// Get live streams for multiple broadcasters (up to 100 user IDs).
    pub async fn get_streams_by_user_ids(
        &self,
        token: &Token,
        user_ids: &[String],
    ) -> Result<Vec<StreamInfo>, TwitchError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = build_streams_query(user_ids);
        let url = format!("{HELIX_BASE}/streams?{query}");
        let body = self.authenticated_get(&url, token).await?;
        let resp: HelixResponse<StreamInfo> = serde_json::from_str(&body)?;
        Ok(resp.data)
    }
}

pub(super) fn build_streams_query(user_ids: &[String]) -> String {
    let limited: Vec<&String> = user_ids.iter().take(MAX_PAGE_SIZE as usize).collect();
    let first = limited.len().clamp(1, MAX_PAGE_SIZE as usize);
    let users = limited
        .into_iter()
        .map(|id| format!("user_id={id}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("first={first}&{users}")
}
