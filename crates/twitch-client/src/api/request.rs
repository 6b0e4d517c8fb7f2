use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use super::*;

impl TwitchApiClient {
    pub fn new(client_id: String) -> Self {
        Self::with_http(reqwest::Client::new(), client_id)
    }

    /// Share an existing HTTP client (connection pool) with this API client.
    pub fn with_http(http: reqwest::Client, client_id: String) -> Self {
        Self { http, client_id }
    }

    fn auth_headers(&self, token: &Token) -> Result<HeaderMap, TwitchError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", token.access_token);
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&bearer)?);
        headers.insert("Client-Id", HeaderValue::from_str(&self.client_id)?);
        Ok(headers)
    }

    /// Execute a GET request with auth headers.
    ///
    /// A 401 is returned as `ApiError { status: 401 }` so the caller can
    /// refresh the token and retry.
    pub(super) async fn authenticated_get(
        &self,
        url: &str,
        token: &Token,
    ) -> Result<String, TwitchError> {
        let headers = self.auth_headers(token)?;
        let resp = self.http.get(url).headers(headers).send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            tracing::warn!(url, "Got 401, caller should refresh token and retry");
        }

        if !status.is_success() {
            return Err(TwitchError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(body)
    }
}
