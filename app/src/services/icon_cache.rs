//! On-disk cache of channel logos used as notification icons.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use notify_core::{IconCache, NotifyError};
use sha1::{Digest, Sha1};

const DEFAULT_EXTENSION: &str = "png";

#[derive(Clone, Default)]
pub struct HttpIconCache {
    http: reqwest::Client,
}

impl HttpIconCache {
    async fn download(&self, url: &str, path: &Path) -> Result<(), NotifyError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| NotifyError::IconDownload(format!("{url}: {e}")))?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| NotifyError::IconDownload(format!("{url}: {e}")))?;

        // Write next to the target and rename so readers never see a partial file.
        let partial = path.with_extension("part");
        tokio::fs::write(&partial, &bytes).await?;
        tokio::fs::rename(&partial, path).await?;
        tracing::debug!(bytes = bytes.len(), "Cached icon {}", path.display());
        Ok(())
    }
}

fn hash_url(url: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

fn extension_of(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty() && ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext
        }
        _ => DEFAULT_EXTENSION,
    }
}

/// Cache file name for `url`: stable across runs, unique per URL.
pub fn icon_file_name(url: &str) -> String {
    format!("{}.{}", hash_url(url), extension_of(url))
}

fn touch(path: &Path) -> std::io::Result<()> {
    std::fs::File::options()
        .write(true)
        .open(path)?
        .set_modified(SystemTime::now())
}

/// Bump the mtime so garbage collection keeps icons that are still in use.
async fn refresh_mtime(path: PathBuf) {
    match tokio::task::spawn_blocking(move || touch(&path)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!("Failed to refresh icon mtime: {e}"),
        Err(e) => tracing::debug!("Icon mtime task failed: {e}"),
    }
}

#[async_trait]
impl IconCache for HttpIconCache {
    async fn fetch(&self, url: &str, dir: &Path) -> notify_core::Result<PathBuf> {
        let path = dir.join(icon_file_name(url));
        if tokio::fs::try_exists(&path).await? {
            refresh_mtime(path.clone()).await;
            return Ok(path);
        }

        tokio::fs::create_dir_all(dir).await?;
        self.download(url, &path).await?;
        Ok(path)
    }

    async fn collect_garbage(&self, dir: &Path, max_age: Duration) -> notify_core::Result<()> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(NotifyError::Cleanup(format!("{}: {e}", dir.display()))),
        };

        let now = SystemTime::now();
        let mut removed = 0u32;
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let age = meta
                .modified()
                .ok()
                .and_then(|m| now.duration_since(m).ok())
                .unwrap_or_default();
            if age > max_age {
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Expired icons cleaned up");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_keep_extension() {
        let name = icon_file_name("https://static-cdn.jtvnw.net/a/logo-300x300.jpeg");
        assert!(name.ends_with(".jpeg"));
        assert_eq!(name.len(), 40 + ".jpeg".len());

        assert!(icon_file_name("https://cdn/x.png?size=70").ends_with(".png"));
        assert!(icon_file_name("https://cdn/logo").ends_with(".png"));
        assert_ne!(icon_file_name("https://cdn/a.png"), icon_file_name("https://cdn/b.png"));
    }

    #[tokio::test]
    async fn cached_icon_is_reused_without_download() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://cdn.invalid/logo.png";
        let expected = dir.path().join(icon_file_name(url));
        std::fs::write(&expected, b"png").unwrap();

        let cache = HttpIconCache::default();
        let path = cache.fetch(url, dir.path()).await.unwrap();
        assert_eq!(path, expected);
    }

    #[tokio::test]
    async fn reused_icon_survives_garbage_collection() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://cdn.invalid/logo.png";
        let cached = dir.path().join(icon_file_name(url));
        std::fs::write(&cached, b"png").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&cached)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(3600))
            .unwrap();

        let cache = HttpIconCache::default();
        cache.fetch(url, dir.path()).await.unwrap();
        cache
            .collect_garbage(dir.path(), Duration::from_secs(600))
            .await
            .unwrap();
        assert!(cached.exists());
    }

    #[tokio::test]
    async fn garbage_collection_removes_only_old_files() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.png");
        let fresh = dir.path().join("fresh.png");
        std::fs::write(&old, b"x").unwrap();
        std::fs::write(&fresh, b"y").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(3600))
            .unwrap();

        let cache = HttpIconCache::default();
        cache
            .collect_garbage(dir.path(), Duration::from_secs(600))
            .await
            .unwrap();

        assert!(!old.exists());
        assert!(fresh.exists());
    }

    #[tokio::test]
    async fn missing_directory_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HttpIconCache::default();
        cache
            .collect_garbage(&dir.path().join("nope"), Duration::from_secs(1))
            .await
            .unwrap();
    }
}
