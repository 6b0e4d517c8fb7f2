use super::*;

impl TwitchApiClient {
    /// Get the currently authenticated user.
    pub async fn get_current_user(&self, token: &Token) -> Result<TwitchUser, TwitchError> {
        let url = format!("{HELIX_BASE}/users");
        let body = self.authenticated_get(&url, token).await?;
        let resp: HelixResponse<TwitchUser> = serde_json::from_str(&body)?;

        resp.data
            .into_iter()
            .next()
            .ok_or_else(|| TwitchError::ApiError {
                status: 404,
                message: "Authenticated user not found".into(),
            })
    }

    /// Get users by user IDs, batching requests by 100.
    pub async fn get_users_by_ids(
        &self,
        token: &Token,
        user_ids: &[String],
    ) -> Result<Vec<TwitchUser>, TwitchError> {
        let mut users = Vec::with_capacity(user_ids.len());
        for chunk in user_ids.chunks(MAX_PAGE_SIZE as usize) {
            let query = chunk
                .iter()
                .map(|id| format!("id={id}"))
                .collect::<Vec<_>>()
                .join("&");
            let url = format!("{HELIX_BASE}/users?{query}");
            let body = self.authenticated_get(&url, token).await?;
            let resp: HelixResponse<TwitchUser> = serde_json::from_str(&body)?;
            users.extend(resp.data);
        }
        Ok(users)
    }
}
