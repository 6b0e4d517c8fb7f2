pub mod app;
pub mod background;
pub mod bootstrap;
pub mod config;
pub mod events;
pub mod notification;
pub mod platform;
pub mod providers;
pub mod server;
pub mod services;
pub mod shutdown;

pub use bootstrap::init_foundation;
