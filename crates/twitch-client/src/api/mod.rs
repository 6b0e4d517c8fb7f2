//! Twitch Helix REST API client.
//!
//! Typed access to the endpoints the notifier polls, with Bearer token +
//! Client-ID header injection.

mod channels;
mod request;
mod streams;
mod users;

pub mod models;

pub use models::{
    FollowedChannel, HelixPaginatedResponse, HelixPagination, HelixResponse, StreamInfo,
    TwitchUser,
};

use crate::{Token, TwitchError};

const HELIX_BASE: &str = "https://api.twitch.tv/helix";

/// Largest page Helix accepts for list endpoints.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Twitch Helix API client with automatic auth header injection.
#[derive(Clone)]
pub struct TwitchApiClient {
    pub(super) http: reqwest::Client,
    pub(super) client_id: String,
}
