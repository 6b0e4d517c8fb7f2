use super::*;

impl TwitchApiClient {
    /// Get one page of channels followed by the specified user.
    pub async fn get_followed_channels_page(
        &self,
        token: &Token,
        user_id: &str,
        first: u32,
        after: Option<&str>,
    ) -> Result<(Vec<FollowedChannel>, Option<String>), TwitchError> {
        let url = paged_url("channels/followed", user_id, first, after);
        let body = self.authenticated_get(&url, token).await?;
        let resp: HelixPaginatedResponse<FollowedChannel> = serde_json::from_str(&body)?;
        let next_cursor = resp.pagination.and_then(|p| p.cursor);
        Ok((resp.data, next_cursor))
    }
}

/// `{HELIX_BASE}/{path}?user_id=..&first=..[&after=..]` with `first` clamped
/// to the Helix page limit.
pub(super) fn paged_url(path: &str, user_id: &str, first: u32, after: Option<&str>) -> String {
    let clamped = first.clamp(1, MAX_PAGE_SIZE);
    let mut url = format!("{HELIX_BASE}/{path}?user_id={user_id}&first={clamped}");
    if let Some(cursor) = after.filter(|v| !v.is_empty()) {
        url.push_str("&after=");
        url.push_str(cursor);
    }
    url
}
