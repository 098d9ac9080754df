use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::api::{TranscriptionApi, VideoId};
use crate::audio::AudioConverter;
use crate::engine::TranscodingEngine;
use crate::status::{StatusTracker, SubmissionStatus};
use crate::video::{FileCandidate, PreviewReference, SelectedVideo, ACCEPTED_MIME};

/// Callback fired once per successful submission with the stored asset's id
pub type VideoUploadedHook = Box<dyn Fn(&VideoId) + Send + Sync>;

/// The upload form: one selected video, one prompt, one submission pipeline
///
/// A submission runs convert → upload → request-transcription as a single
/// sequential pass, advancing the status tracker at each step boundary.
/// Errors are not caught here: a failing step propagates to the caller and
/// leaves the status frozen at the step that was in progress. The form has
/// no reset; a fresh instance starts a fresh flow.
pub struct UploadForm {
    selected: Option<SelectedVideo>,
    preview: Option<PreviewReference>,
    prompt_input: String,
    status: StatusTracker,
    converter: AudioConverter,
    api: Arc<dyn TranscriptionApi>,
    on_video_uploaded: Option<VideoUploadedHook>,
}

impl UploadForm {
    pub fn new(engine: Arc<dyn TranscodingEngine>, api: Arc<dyn TranscriptionApi>) -> Self {
        Self {
            selected: None,
            preview: None,
            prompt_input: String::new(),
            status: StatusTracker::new(),
            converter: AudioConverter::new(engine),
            api,
            on_video_uploaded: None,
        }
    }

    /// Register the upward notification hook
    pub fn with_on_video_uploaded(
        mut self,
        hook: impl Fn(&VideoId) + Send + Sync + 'static,
    ) -> Self {
        self.on_video_uploaded = Some(Box::new(hook));
        self
    }

    /// Handle a picker change event carrying candidate files
    ///
    /// Only the first candidate is considered, and only `video/mp4` is
    /// accepted. An empty candidate list is a no-op. A new selection
    /// supersedes the previous one and releases its preview.
    pub fn handle_file_selected(&mut self, candidates: Vec<FileCandidate>) -> Result<()> {
        let Some(file) = candidates.into_iter().next() else {
            debug!("file selection ignored: no file chosen");
            return Ok(());
        };

        if file.mime_type != ACCEPTED_MIME {
            debug!(
                "file selection ignored: '{}' is {}, only {} is accepted",
                file.name, file.mime_type, ACCEPTED_MIME
            );
            return Ok(());
        }

        let video: SelectedVideo = file.into();
        let preview = PreviewReference::new(&video)
            .with_context(|| format!("failed to materialize preview for '{}'", video.name))?;

        info!("🎬 Selected video '{}' ({} bytes)", video.name, video.size());

        // Dropping the previous reference releases its file
        self.preview = Some(preview);
        self.selected = Some(video);
        Ok(())
    }

    /// Write the prompt field; ignored while a submission is in flight
    pub fn set_prompt(&mut self, text: impl Into<String>) {
        if !self.controls_enabled() {
            debug!("prompt write ignored: controls disabled");
            return;
        }
        self.prompt_input = text.into();
    }

    /// Current prompt field contents
    pub fn prompt(&self) -> &str {
        &self.prompt_input
    }

    pub fn selected_video(&self) -> Option<&SelectedVideo> {
        self.selected.as_ref()
    }

    /// Preview location for the current selection, if any
    pub fn preview_path(&self) -> Option<&Path> {
        self.preview.as_ref().map(PreviewReference::path)
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status.current()
    }

    /// Whether the prompt field and submit control accept input
    pub fn controls_enabled(&self) -> bool {
        self.status.is_waiting()
    }

    /// Label for the submit control in the current status
    pub fn submit_label(&self) -> &'static str {
        self.status.current().label()
    }

    /// Observe status transitions
    pub fn subscribe_status(&self) -> watch::Receiver<SubmissionStatus> {
        self.status.subscribe()
    }

    /// Run one submission: convert, upload, request transcription
    ///
    /// The prompt is read once, here. With no selected video this is a
    /// silent no-op with no status change.
    pub async fn submit(&mut self) -> Result<()> {
        if !self.controls_enabled() {
            debug!("submit ignored: submission already in flight");
            return Ok(());
        }

        let prompt = match self.prompt_input.as_str() {
            "" => None,
            text => Some(text.to_string()),
        };

        let Some(video) = self.selected.as_ref() else {
            debug!("submit ignored: no video selected");
            return Ok(());
        };

        self.status.advance(SubmissionStatus::Converting);
        let audio = self
            .converter
            .convert(video)
            .await
            .context("video conversion failed")?;

        self.status.advance(SubmissionStatus::Uploading);
        let video_id = self
            .api
            .create_video(&audio)
            .await
            .context("audio upload failed")?;

        self.status.advance(SubmissionStatus::Transcribing);
        self.api
            .request_transcription(&video_id, prompt.as_deref())
            .await
            .context("transcription request failed")?;

        self.status.advance(SubmissionStatus::Success);
        info!("🎉 Submission complete, video id {}", video_id);

        if let Some(hook) = &self.on_video_uploaded {
            hook(&video_id);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::audio::ConvertedAudio;
    use crate::engine::{EngineError, ProgressFn};
    use async_trait::async_trait;

    /// Engine that fails the test if any pipeline step reaches it
    struct UnreachableEngine;

    #[async_trait]
    impl TranscodingEngine for UnreachableEngine {
        async fn load_input(&self, _name: &str, _bytes: &[u8]) -> Result<(), EngineError> {
            panic!("engine must not be called");
        }

        async fn run(
            &self,
            _args: &[String],
            _progress: Option<ProgressFn>,
        ) -> Result<(), EngineError> {
            panic!("engine must not be called");
        }

        async fn read_output(&self, _name: &str) -> Result<Vec<u8>, EngineError> {
            panic!("engine must not be called");
        }
    }

    /// API that fails the test if any pipeline step reaches it
    struct UnreachableApi;

    #[async_trait]
    impl TranscriptionApi for UnreachableApi {
        async fn create_video(&self, _audio: &ConvertedAudio) -> Result<VideoId, ApiError> {
            panic!("api must not be called");
        }

        async fn request_transcription(
            &self,
            _id: &VideoId,
            _prompt: Option<&str>,
        ) -> Result<(), ApiError> {
            panic!("api must not be called");
        }
    }

    fn idle_form() -> UploadForm {
        UploadForm::new(Arc::new(UnreachableEngine), Arc::new(UnreachableApi))
    }

    fn mp4_candidate(name: &str) -> FileCandidate {
        FileCandidate {
            name: name.to_string(),
            mime_type: ACCEPTED_MIME.to_string(),
            bytes: b"mock mp4 payload".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_selection_sets_video_and_preview() {
        let mut form = idle_form();
        form.handle_file_selected(vec![mp4_candidate("clip.mp4")]).unwrap();

        assert_eq!(form.selected_video().unwrap().name, "clip.mp4");
        let preview = form.preview_path().unwrap();
        assert!(preview.exists());
    }

    #[tokio::test]
    async fn test_empty_selection_is_a_no_op() {
        let mut form = idle_form();
        form.handle_file_selected(Vec::new()).unwrap();

        assert!(form.selected_video().is_none());
        assert!(form.preview_path().is_none());
    }

    #[tokio::test]
    async fn test_non_mp4_selection_is_rejected() {
        let mut form = idle_form();
        form.handle_file_selected(vec![FileCandidate {
            name: "clip.mkv".to_string(),
            mime_type: "video/x-matroska".to_string(),
            bytes: vec![0],
        }])
        .unwrap();

        assert!(form.selected_video().is_none());
    }

    #[tokio::test]
    async fn test_new_selection_releases_previous_preview() {
        let mut form = idle_form();
        form.handle_file_selected(vec![mp4_candidate("first.mp4")]).unwrap();
        let first_preview = form.preview_path().unwrap().to_path_buf();

        form.handle_file_selected(vec![mp4_candidate("second.mp4")]).unwrap();

        assert!(!first_preview.exists());
        assert_eq!(form.selected_video().unwrap().name, "second.mp4");
    }

    #[tokio::test]
    async fn test_submit_without_selection_is_silent() {
        let mut form = idle_form();
        form.set_prompt("keywords");

        // The unreachable fakes panic if any step runs
        form.submit().await.unwrap();

        assert_eq!(form.status(), SubmissionStatus::Waiting);
        assert!(form.controls_enabled());
    }

    #[tokio::test]
    async fn test_prompt_is_writable_while_waiting() {
        let mut form = idle_form();
        form.set_prompt("guard, sweep, submission");
        assert_eq!(form.prompt(), "guard, sweep, submission");
    }

    #[tokio::test]
    async fn test_submit_label_follows_status() {
        let form = idle_form();
        assert_eq!(form.submit_label(), "Upload video");
    }
}
