/// Transcribe Uploader - Rust Implementation
///
/// Converts a locally chosen video into a compressed MP3 clip through an
/// ffmpeg-backed transcoding engine, uploads the clip to a remote
/// transcription service, and requests a transcription for the stored
/// asset, tracking progress through a five-stage submission status.
pub mod api;
pub mod audio;
pub mod config;
pub mod engine;
pub mod form;
pub mod status;
pub mod video;

// Re-export main types for easy access
pub use crate::api::{ApiError, TranscriptionApi, UploadClient, VideoId};
pub use crate::audio::{AudioConverter, ConvertedAudio};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::engine::{get_engine, EngineError, FfmpegEngine, TranscodingEngine};
pub use crate::form::UploadForm;
pub use crate::status::{StatusTracker, SubmissionStatus};
pub use crate::video::{FileCandidate, PreviewReference, SelectedVideo};
