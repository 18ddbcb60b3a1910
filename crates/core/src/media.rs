//! Media artifacts produced by a fetch and consumed by delivery.
//!
//! A fetched artifact may be staged on local disk. [`ScratchFile`] owns such
//! a file and removes it when dropped, so every exit path of a job (success,
//! delivery failure, panic unwinding) releases the transient copy.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::messages;

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// What kind of media a locator resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Stable lowercase name used in payloads and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        }
    }

    /// File extension used when staging the artifact on disk.
    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Image => "jpg",
        }
    }

    /// Caption attached to the delivered artifact.
    pub fn caption(self) -> &'static str {
        match self {
            MediaKind::Video => messages::CAPTION_VIDEO,
            MediaKind::Image => messages::CAPTION_IMAGE,
        }
    }

    /// Classify a `Content-Type` value (`video/*` or `image/*`).
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if essence.starts_with("video/") {
            Some(MediaKind::Video)
        } else if essence.starts_with("image/") {
            Some(MediaKind::Image)
        } else {
            None
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Scratch file
// ---------------------------------------------------------------------------

/// A transient file on local disk, deleted when the guard is dropped.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Take ownership of an existing file at `path`.
    pub fn adopt(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write `bytes` to `path` and return a guard owning the new file.
    pub async fn create(path: impl Into<PathBuf>, bytes: &[u8]) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        // Adopt before writing so a partial write is still cleaned up.
        let guard = Self::adopt(path);
        tokio::fs::write(&guard.path, bytes).await?;
        Ok(guard)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Scratch file removed");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove scratch file",
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// Where the bytes of a fetched artifact live.
#[derive(Debug)]
pub enum MediaSource {
    /// Bytes held in memory.
    Memory(Vec<u8>),
    /// Bytes staged on disk; removed when the source is dropped.
    Scratch(ScratchFile),
}

impl MediaSource {
    /// Read the full artifact.
    pub async fn read(&self) -> io::Result<Vec<u8>> {
        match self {
            MediaSource::Memory(bytes) => Ok(bytes.clone()),
            MediaSource::Scratch(file) => tokio::fs::read(file.path()).await,
        }
    }

    /// File name presented to the delivery channel.
    pub fn file_name(&self, kind: MediaKind) -> String {
        match self {
            MediaSource::Scratch(file) => file
                .path()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("media.{}", kind.extension())),
            MediaSource::Memory(_) => format!("media.{}", kind.extension()),
        }
    }
}

/// Result of a successful fetch: media kind plus a byte source.
#[derive(Debug)]
pub struct MediaFile {
    pub kind: MediaKind,
    pub source: MediaSource,
}

impl MediaFile {
    pub fn new(kind: MediaKind, source: MediaSource) -> Self {
        Self { kind, source }
    }

    /// Convenience constructor for an in-memory artifact.
    pub fn in_memory(kind: MediaKind, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(kind, MediaSource::Memory(bytes.into()))
    }
}
