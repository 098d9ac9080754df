use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

/// Progress of one submission through the upload pipeline
///
/// The ordering of the variants is the pipeline order; transitions only ever
/// move forward. There is no failure variant: a step that errors leaves the
/// status frozen at the in-progress value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Idle, controls enabled, nothing submitted yet
    Waiting,
    /// Video bytes are being transcoded to audio
    Converting,
    /// Audio is being uploaded to the remote service
    Uploading,
    /// Transcription has been requested for the stored asset
    Transcribing,
    /// Pipeline finished, terminal for this form instance
    Success,
}

impl SubmissionStatus {
    /// Label shown on the submit control for this status
    pub fn label(&self) -> &'static str {
        match self {
            SubmissionStatus::Waiting => "Upload video",
            SubmissionStatus::Converting => "Converting...",
            SubmissionStatus::Uploading => "Uploading...",
            SubmissionStatus::Transcribing => "Transcribing...",
            SubmissionStatus::Success => "Success!",
        }
    }

    /// The status that follows this one in the pipeline, if any
    pub fn next(&self) -> Option<SubmissionStatus> {
        match self {
            SubmissionStatus::Waiting => Some(SubmissionStatus::Converting),
            SubmissionStatus::Converting => Some(SubmissionStatus::Uploading),
            SubmissionStatus::Uploading => Some(SubmissionStatus::Transcribing),
            SubmissionStatus::Transcribing => Some(SubmissionStatus::Success),
            SubmissionStatus::Success => None,
        }
    }
}

/// Forward-only status holder with notify-on-change subscriptions
///
/// Backed by a watch channel so embedding callers can observe transitions
/// without polling. There is no reset: a finished or stuck tracker stays
/// where it is for the lifetime of the form that owns it.
#[derive(Debug)]
pub struct StatusTracker {
    tx: watch::Sender<SubmissionStatus>,
}

impl StatusTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SubmissionStatus::Waiting);
        Self { tx }
    }

    /// Current status value
    pub fn current(&self) -> SubmissionStatus {
        *self.tx.borrow()
    }

    /// Whether the form controls are enabled (nothing in flight)
    pub fn is_waiting(&self) -> bool {
        self.current() == SubmissionStatus::Waiting
    }

    /// Subscribe to status changes
    pub fn subscribe(&self) -> watch::Receiver<SubmissionStatus> {
        self.tx.subscribe()
    }

    /// Advance to `next`, ignoring anything that is not a forward move
    pub fn advance(&self, next: SubmissionStatus) {
        let current = self.current();
        if next <= current {
            debug!("ignoring non-forward status change {:?} -> {:?}", current, next);
            return;
        }
        self.tx.send_replace(next);
        info!("📍 Submission status: {}", next.label());
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}
