//! Adapters between the notifier core and the outside world.

pub mod channel_prefs;
pub mod followed_streams;
pub mod icon_cache;
pub mod twitch_session;
