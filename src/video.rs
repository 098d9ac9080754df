use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

/// The only MIME type the file selector accepts
pub const ACCEPTED_MIME: &str = "video/mp4";

/// A file offered to the selector by a picker change event
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// The currently selected video, owned by the form
///
/// Replaced wholesale when a new file is chosen; there is never more than
/// one active selection.
#[derive(Debug, Clone)]
pub struct SelectedVideo {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedVideo {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl From<FileCandidate> for SelectedVideo {
    fn from(file: FileCandidate) -> Self {
        Self {
            name: file.name,
            mime_type: file.mime_type,
            bytes: file.bytes,
        }
    }
}

/// Revocable on-disk handle to the selected video, for display only
///
/// Holds a named temporary file with the video bytes. The file is removed
/// when the reference is revoked or dropped, so superseding a selection
/// releases the previous preview.
#[derive(Debug)]
pub struct PreviewReference {
    file: NamedTempFile,
}

impl PreviewReference {
    /// Materialize a preview for the given selection
    pub fn new(video: &SelectedVideo) -> std::io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("video-preview-")
            .suffix(".mp4")
            .tempfile()?;
        file.write_all(&video.bytes)?;
        file.flush()?;

        debug!(
            "🎬 Preview materialized for '{}' at {}",
            video.name,
            file.path().display()
        );
        Ok(Self { file })
    }

    /// Path to the preview file
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Explicitly release the preview file
    pub fn revoke(self) -> std::io::Result<()> {
        self.file.close()
    }
}
