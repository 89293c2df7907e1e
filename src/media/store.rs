use std::path::{Path, PathBuf};

use anyhow::Context;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

use super::kind::MediaKind;
use crate::{config::MediaConfig, error::AppError};

/// URL prefix the media root is served under.
pub const PUBLIC_PREFIX: &str = "/public";

/// A file that made it to its final location.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub url: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Media files on local disk, laid out as `{root}/{audio|image}/{owner}.{ext}`.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    max_upload_bytes: usize,
}

impl MediaStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: config.root.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub async fn ensure_dirs(&self) -> anyhow::Result<()> {
        for kind in MediaKind::ALL {
            let dir = self.root.join(kind.dir());
            fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("create media dir {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn path_for(&self, kind: MediaKind, owner: &str, ext: &str) -> PathBuf {
        self.root.join(kind.dir()).join(format!("{}.{}", owner, ext))
    }

    pub fn public_url(kind: MediaKind, owner: &str, ext: &str) -> String {
        format!("{}/{}/{}.{}", PUBLIC_PREFIX, kind.dir(), owner, ext)
    }

    /// Maps a stored `/public/...` URL back to its file. Anything that does
    /// not look like a URL this store produced yields `None`.
    pub fn resolve_url(&self, url: &str) -> Option<PathBuf> {
        let rest = url.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
        let (dir, name) = rest.split_once('/')?;
        let kind = MediaKind::ALL.into_iter().find(|k| k.dir() == dir)?;
        let valid_name = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(['/', '\\'])
            && name != "..";
        valid_name.then(|| self.root.join(kind.dir()).join(name))
    }

    /// Streams an upload to `{owner}.{ext}`.
    ///
    /// Bytes go to a hidden temp file in the target directory which is
    /// synced and renamed over the final name only once complete, so a
    /// reader never sees a partial file. On any failure the temp file is
    /// removed and the previous file stays untouched.
    pub async fn save<S, E>(
        &self,
        kind: MediaKind,
        owner: &str,
        ext: &str,
        stream: S,
    ) -> Result<StoredFile, AppError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<AppError>,
    {
        let dir = self.root.join(kind.dir());
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("create media dir {}", dir.display()))?;

        let path = self.path_for(kind, owner, ext);
        let tmp = dir.join(format!(".{}.{}.part", owner, Uuid::new_v4()));

        let size = match self.write_temp(&tmp, stream).await {
            Ok(size) => size,
            Err(e) => {
                discard(&tmp).await;
                return Err(e);
            }
        };
        if let Err(e) = fs::rename(&tmp, &path).await {
            discard(&tmp).await;
            return Err(anyhow::Error::new(e)
                .context(format!("move upload to {}", path.display()))
                .into());
        }

        debug!(path = %path.display(), size, "media stored");
        Ok(StoredFile {
            url: Self::public_url(kind, owner, ext),
            path,
            size,
        })
    }

    async fn write_temp<S, E>(&self, tmp: &Path, stream: S) -> Result<u64, AppError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<AppError>,
    {
        tokio::pin!(stream);
        let mut file = fs::File::create(tmp)
            .await
            .with_context(|| format!("create {}", tmp.display()))?;

        let limit = self.max_upload_bytes as u64;
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => return Err(e.into()),
            };
            written += chunk.len() as u64;
            if written > limit {
                warn!(limit, "upload over the size limit");
                return Err(AppError::PayloadTooLarge);
            }
            file.write_all(&chunk).await.context("write upload chunk")?;
        }
        if written == 0 {
            return Err(AppError::BadRequest("Uploaded file is empty".into()));
        }

        file.sync_all().await.context("sync upload")?;
        Ok(written)
    }

    /// Deletes the file behind `previous` once a new upload for the same
    /// record landed under a different name.
    pub async fn discard_replaced(&self, previous: Option<&str>, current: &str) {
        match previous {
            Some(prev) if prev != current => self.remove(Some(prev)).await,
            _ => {}
        }
    }

    /// Best-effort removal of a stored file. Missing files are not an error.
    pub async fn remove(&self, url: Option<&str>) {
        let Some(url) = url else { return };
        let Some(path) = self.resolve_url(url) else {
            warn!(url, "refusing to remove a path outside the media root");
            return;
        };
        match fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "media removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, path = %path.display(), "failed to remove media"),
        }
    }
}

async fn discard(tmp: &Path) {
    if let Err(e) = fs::remove_file(tmp).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(error = %e, path = %tmp.display(), "failed to remove temp upload");
        }
    }
}

#[cfg(test)]
mod tests {
    use futures_util::stream;

    use super::*;

    fn store(root: &Path, limit: usize) -> MediaStore {
        MediaStore::new(&MediaConfig {
            root: root.to_path_buf(),
            max_upload_bytes: limit,
        })
    }

    fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = Result<Bytes, AppError>> {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::from_static(p)))
                .collect::<Vec<_>>(),
        )
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn save_writes_the_deterministic_path() {
        let root = tempfile::tempdir().unwrap();
        let store = store(root.path(), 1024);
        store.ensure_dirs().await.unwrap();

        let stored = store
            .save(MediaKind::Audio, "42", "mp3", chunks(&[b"ID3", b"data"]))
            .await
            .unwrap();
        assert_eq!(stored.url, "/public/audio/42.mp3");
        assert_eq!(stored.size, 7);
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"ID3data");
        assert_eq!(dir_entries(&root.path().join("audio")), vec!["42.mp3"]);
    }

    #[tokio::test]
    async fn oversized_upload_leaves_no_trace() {
        let root = tempfile::tempdir().unwrap();
        let store = store(root.path(), 4);
        store.ensure_dirs().await.unwrap();

        let err = store
            .save(MediaKind::Image, "7", "png", chunks(&[b"abc", b"def"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge));
        assert!(dir_entries(&root.path().join("image")).is_empty());
    }

    #[tokio::test]
    async fn failed_stream_keeps_the_previous_file() {
        let root = tempfile::tempdir().unwrap();
        let store = store(root.path(), 1024);
        store
            .save(MediaKind::Image, "7", "png", chunks(&[b"old"]))
            .await
            .unwrap();

        let broken = stream::iter(vec![
            Ok(Bytes::from_static(b"new")),
            Err(AppError::BadRequest("connection reset".into())),
        ]);
        assert!(store.save(MediaKind::Image, "7", "png", broken).await.is_err());

        let image_dir = root.path().join("image");
        assert_eq!(dir_entries(&image_dir), vec!["7.png"]);
        assert_eq!(std::fs::read(image_dir.join("7.png")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn replaced_file_with_other_extension_is_removed() {
        let root = tempfile::tempdir().unwrap();
        let store = store(root.path(), 1024);
        let old = store
            .save(MediaKind::Image, "3", "png", chunks(&[b"png"]))
            .await
            .unwrap();
        let new = store
            .save(MediaKind::Image, "3", "jpg", chunks(&[b"jpg"]))
            .await
            .unwrap();

        store.discard_replaced(Some(&old.url), &new.url).await;
        assert_eq!(dir_entries(&root.path().join("image")), vec!["3.jpg"]);

        // Same name: nothing to remove.
        store.discard_replaced(Some(&new.url), &new.url).await;
        assert!(new.path.exists());
    }

    #[test]
    fn resolve_url_stays_inside_the_root() {
        let root = tempfile::tempdir().unwrap();
        let store = store(root.path(), 1024);
        assert_eq!(
            store.resolve_url("/public/audio/1.mp3"),
            Some(root.path().join("audio").join("1.mp3"))
        );
        assert_eq!(store.resolve_url("/public/audio/../../etc/passwd"), None);
        assert_eq!(store.resolve_url("/public/video/1.mp4"), None);
        assert_eq!(store.resolve_url("/public/image/.hidden"), None);
        assert_eq!(store.resolve_url("https://cdn.example.com/1.mp3"), None);
    }
}
