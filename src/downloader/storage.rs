// Scratch storage for downloaded and muxed files
//
// Every artifact is a uniquely named file under one shared scratch root.
// Dropping an `Artifact` deletes its file, so early returns and `?` clean up
// the same way success does.

use futures_util::StreamExt;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use super::traits::ByteStream;

/// Process-wide scratch directory
#[derive(Debug, Clone)]
pub struct TempStore {
    root: PathBuf,
}

impl TempStore {
    /// Use `root` as scratch directory, creating it if needed
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate an empty, uniquely named file: `<prefix><random><suffix>`
    pub fn create(&self, prefix: &str, suffix: &str) -> io::Result<Artifact> {
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(&self.root)?;

        Ok(Artifact {
            path: Some(file.into_temp_path()),
        })
    }
}

/// Which side of a copy failed
#[derive(Debug, Error)]
pub enum CopyError {
    /// Reading the incoming stream failed
    #[error("source stream error: {0}")]
    Source(#[source] io::Error),

    /// Writing the scratch file failed
    #[error("write error: {0}")]
    Sink(#[source] io::Error),
}

/// One scratch file, owned by the request that created it
#[derive(Debug)]
pub struct Artifact {
    path: Option<TempPath>,
}

impl Artifact {
    pub fn path(&self) -> &Path {
        match &self.path {
            Some(path) => &**path,
            None => Path::new(""),
        }
    }

    /// Copy the whole stream into the file, replacing previous content.
    ///
    /// A failure leaves whatever was written so far; callers drop the
    /// artifact instead of reusing it.
    pub async fn write_from(&mut self, mut stream: ByteStream) -> Result<u64, CopyError> {
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(self.path())
            .await
            .map_err(CopyError::Sink)?;

        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(CopyError::Source)?;
            file.write_all(&chunk).await.map_err(CopyError::Sink)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(CopyError::Sink)?;

        Ok(written)
    }

    /// Remove the file now. Missing files are not an error.
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        let shown = path.display().to_string();
        match path.close() {
            Ok(()) => tracing::debug!("[TempStore] Removed {}", shown),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("[TempStore] Failed to remove {}: {}", shown, e),
        }
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        self.remove();
    }
}
