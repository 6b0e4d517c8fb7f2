//! Growl client command lines.

use notify_core::{NotificationData, PlatformKey, ProviderCapability};

use super::command::{CommandProvider, Render};
use super::desktop::APP_NAME;
use super::{GROWL, RICH};

fn icon_arg(data: &NotificationData) -> Option<String> {
    data.icon.as_ref().map(|p| p.to_string_lossy().into_owned())
}

/// Growl client programs differ per OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowlFlavor {
    /// growlnotify.exe for Growl for Windows
    Windows,
    /// growlnotify for Growl on macOS
    Mac,
    /// gntp-send
    Gntp,
}

impl GrowlFlavor {
    pub fn for_os(os: &str) -> Self {
        match os {
            "windows" => Self::Windows,
            "macos" => Self::Mac,
            _ => Self::Gntp,
        }
    }

    fn program(self) -> &'static str {
        match self {
            Self::Windows | Self::Mac => "growlnotify",
            Self::Gntp => "gntp-send",
        }
    }

    fn render(self) -> Render {
        match self {
            Self::Windows => render_windows,
            Self::Mac => render_mac,
            Self::Gntp => render_gntp,
        }
    }
}

fn render_windows(data: &NotificationData) -> Vec<String> {
    let mut args = vec![format!("/a:{APP_NAME}"), format!("/t:{}", data.title)];
    if let Some(icon) = icon_arg(data) {
        args.push(format!("/i:{icon}"));
    }
    args.push(data.body.clone());
    args
}

fn render_mac(data: &NotificationData) -> Vec<String> {
    let mut args = vec![
        "-n".into(),
        APP_NAME.into(),
        "-t".into(),
        data.title.clone(),
        "-m".into(),
        data.body.clone(),
    ];
    if let Some(icon) = icon_arg(data) {
        args.push("--image".into());
        args.push(icon);
    }
    args
}

fn render_gntp(data: &NotificationData) -> Vec<String> {
    let mut args = vec![data.title.clone(), data.body.clone()];
    args.extend(icon_arg(data));
    args
}

pub fn growl(flavor: GrowlFlavor) -> CommandProvider {
    CommandProvider::new(
        ProviderCapability::new(GROWL)
            .on(PlatformKey::Win32, Some(RICH))
            .on(PlatformKey::Darwin, Some(RICH))
            .on(PlatformKey::Linux, Some(RICH)),
        flavor.program(),
        flavor.render(),
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn data() -> NotificationData {
        NotificationData {
            icon: Some(PathBuf::from("/tmp/icons/a.png")),
            ..NotificationData::new("Alice has started streaming", "Say \"hi\" & 'bye'")
        }
    }

    #[test]
    fn flavor_follows_os() {
        assert_eq!(GrowlFlavor::for_os("windows").program(), "growlnotify");
        assert_eq!(GrowlFlavor::for_os("macos").program(), "growlnotify");
        assert_eq!(GrowlFlavor::for_os("linux").program(), "gntp-send");
    }

    #[test]
    fn windows_args_use_slash_options() {
        assert_eq!(
            render_windows(&data()),
            vec![
                "/a:Stream Notifier",
                "/t:Alice has started streaming",
                "/i:/tmp/icons/a.png",
                "Say \"hi\" & 'bye'",
            ]
        );
    }

    #[test]
    fn mac_args_end_with_image() {
        let args = render_mac(&data());
        assert_eq!(&args[args.len() - 2..], ["--image", "/tmp/icons/a.png"]);

        let plain = render_mac(&NotificationData::new("t", "b"));
        assert!(!plain.contains(&"--image".to_string()));
    }

    #[test]
    fn gntp_icon_is_optional() {
        assert_eq!(render_gntp(&data()).len(), 3);
        assert_eq!(render_gntp(&NotificationData::new("t", "b")), vec!["t", "b"]);
    }
}
