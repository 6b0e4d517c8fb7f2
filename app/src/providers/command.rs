//! Back-ends that render by running a notifier program.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use notify_core::{
    NotificationData, NotificationProvider, NotifyError, ProviderCapability, ProviderInstance,
    SetupData,
};
use serde_json::json;
use tokio::process::Command;

/// Renders the program arguments for one notification.
pub type Render = fn(&NotificationData) -> Vec<String>;

pub struct CommandProvider {
    capability: ProviderCapability,
    program: &'static str,
    render: Render,
}

impl CommandProvider {
    pub fn new(capability: ProviderCapability, program: &'static str, render: Render) -> Self {
        Self {
            capability,
            program,
            render,
        }
    }

    fn unavailable(&self, message: String) -> NotifyError {
        NotifyError::ProviderUnavailable {
            provider: self.capability.name.clone(),
            message,
        }
    }
}

#[async_trait]
impl NotificationProvider for CommandProvider {
    fn capability(&self) -> &ProviderCapability {
        &self.capability
    }

    async fn test(&self) -> notify_core::Result<SetupData> {
        let path = which::which(self.program)
            .map_err(|e| self.unavailable(format!("{}: {e}", self.program)))?;
        tracing::debug!("Found {} at {}", self.program, path.display());
        Ok(json!({ "path": path }))
    }

    fn create(&self, setup: SetupData) -> notify_core::Result<Arc<dyn ProviderInstance>> {
        let program = setup
            .get("path")
            .and_then(|p| p.as_str())
            .map(PathBuf::from)
            .or_else(|| which::which(self.program).ok())
            .ok_or_else(|| self.unavailable(format!("{} not found on PATH", self.program)))?;
        Ok(Arc::new(CommandInstance {
            name: self.capability.name.clone(),
            program,
            render: self.render,
        }))
    }
}

pub struct CommandInstance {
    name: String,
    program: PathBuf,
    render: Render,
}

impl CommandInstance {
    fn failed(&self, message: String) -> NotifyError {
        NotifyError::ProviderFailed {
            provider: self.name.clone(),
            message,
        }
    }
}

fn program_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[async_trait]
impl ProviderInstance for CommandInstance {
    /// Runs the program to completion. These programs have no click
    /// feedback, so a click handler on `data` is never called.
    async fn notify(&self, data: &NotificationData) -> notify_core::Result<()> {
        let out = Command::new(&self.program)
            .args((self.render)(data))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.failed(e.to_string()))?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(self.failed(format!(
                "{} exited with {}: {}",
                program_name(&self.program),
                out.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use notify_core::PlatformKey;

    use super::*;

    fn echo_args(data: &NotificationData) -> Vec<String> {
        vec![data.title.clone()]
    }

    #[tokio::test]
    async fn missing_program_fails_test() {
        let provider = CommandProvider::new(
            ProviderCapability::new("fake").on(PlatformKey::Linux, None),
            "definitely-not-a-notifier-program",
            echo_args,
        );
        let err = provider.test().await.unwrap_err();
        assert!(matches!(
            err,
            NotifyError::ProviderUnavailable { ref provider, .. } if provider == "fake"
        ));
    }

    #[tokio::test]
    async fn create_uses_tested_path() {
        let provider = CommandProvider::new(ProviderCapability::new("fake"), "fake", echo_args);
        let setup = json!({ "path": "/opt/fake/bin/fake" });
        assert!(provider.create(setup).is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_program_and_reports_exit_status() {
        let ok = CommandInstance {
            name: "true".into(),
            program: PathBuf::from("true"),
            render: echo_args,
        };
        ok.notify(&NotificationData::new("t", "b")).await.unwrap();

        let failing = CommandInstance {
            name: "false".into(),
            program: PathBuf::from("false"),
            render: echo_args,
        };
        let err = failing
            .notify(&NotificationData::new("t", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::ProviderFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn clickable_notification_reports_program_failure() {
        let failing = CommandInstance {
            name: "false".into(),
            program: PathBuf::from("false"),
            render: echo_args,
        };
        let data = NotificationData {
            on_click: Some(Arc::new(|| {})),
            ..NotificationData::new("t", "b")
        };
        let err = failing.notify(&data).await.unwrap_err();
        assert!(matches!(err, NotifyError::ProviderFailed { ref provider, .. } if provider == "false"));
    }
}
