//! Host platform detection for notification provider selection.

use std::sync::LazyLock;

use notify_core::{Platform, PlatformKey};
use regex::Regex;
use tokio::process::Command;

static RE_VERSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)").unwrap());

/// Windows 8 is NT 6.2.
const WIN8: (u32, u32) = (6, 2);
/// OS X Mountain Lion introduced Notification Center.
const MOUNTAIN_LION: (u32, u32) = (10, 8);

/// First `major.minor` pair in a version string.
pub fn parse_version(text: &str) -> Option<(u32, u32)> {
    let caps = RE_VERSION.captures(text)?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    Some((major, minor))
}

/// Platform keys for an OS family and (optional) version.
pub fn platform_keys(os: &str, version: Option<(u32, u32)>) -> Vec<PlatformKey> {
    match os {
        "windows" => {
            let mut keys = vec![PlatformKey::Win32];
            if version.is_some_and(|v| v >= WIN8) {
                keys.push(PlatformKey::Win32Gte8);
            }
            keys
        }
        "macos" => {
            let mut keys = vec![PlatformKey::Darwin];
            if version.is_some_and(|v| v >= MOUNTAIN_LION) {
                keys.push(PlatformKey::MountainLion);
            }
            keys
        }
        _ => vec![PlatformKey::Linux],
    }
}

async fn os_version(os: &str) -> Option<(u32, u32)> {
    let output = match os {
        "windows" => Command::new("cmd").args(["/C", "ver"]).output().await,
        "macos" => Command::new("sw_vers").arg("-productVersion").output().await,
        _ => return None,
    };
    match output {
        Ok(out) if out.status.success() => parse_version(&String::from_utf8_lossy(&out.stdout)),
        Ok(out) => {
            tracing::warn!("OS version query exited with {}", out.status);
            None
        }
        Err(e) => {
            tracing::warn!("Failed to query OS version: {e}");
            None
        }
    }
}

/// Detect the platform the notifier runs on.
pub async fn detect() -> Platform {
    let os = std::env::consts::OS;
    let version = os_version(os).await;
    let platform = Platform::new(platform_keys(os, version));
    tracing::info!(os, ?version, keys = ?platform.keys(), "Detected platform");
    platform
}
