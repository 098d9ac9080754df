use std::sync::Arc;

use tracing::{debug, info};

use crate::engine::{EngineError, ProgressFn, TranscodingEngine};
use crate::video::SelectedVideo;

/// Engine input name for the staged video bytes
pub const INPUT_NAME: &str = "input.mp4";

/// Engine output name read back after conversion
pub const OUTPUT_NAME: &str = "output.mp3";

/// File name given to the converted clip when it is uploaded
pub const AUDIO_FILE_NAME: &str = "audio.mp3";

/// MIME type of the converted clip
pub const AUDIO_MIME: &str = "audio/mpeg";

/// The fixed instruction set for the conversion run: audio stream only,
/// MP3 at 20 kbit/s.
pub fn conversion_args() -> Vec<String> {
    [
        "-i",
        INPUT_NAME,
        "-map",
        "0:a",
        "-b:a",
        "20k",
        "-acodec",
        "libmp3lame",
        OUTPUT_NAME,
    ]
    .iter()
    .map(|arg| arg.to_string())
    .collect()
}

/// A converted audio clip, ready for upload
#[derive(Debug, Clone)]
pub struct ConvertedAudio {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl ConvertedAudio {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Converts a selected video into a compressed audio clip
///
/// Deterministic for a fixed input: the instruction set never varies, and
/// there are no retries or timeouts. Engine failures propagate to the
/// caller untouched.
pub struct AudioConverter {
    engine: Arc<dyn TranscodingEngine>,
}

impl AudioConverter {
    pub fn new(engine: Arc<dyn TranscodingEngine>) -> Self {
        Self { engine }
    }

    /// Run the video through the engine and wrap the resulting clip
    pub async fn convert(&self, video: &SelectedVideo) -> Result<ConvertedAudio, EngineError> {
        info!(
            "🎵 Converting '{}' to audio ({} bytes in)",
            video.name,
            video.size()
        );

        self.engine.load_input(INPUT_NAME, &video.bytes).await?;

        let progress: ProgressFn = Arc::new(|fraction: f64| {
            debug!("Convert progress: {}%", (fraction * 100.0).round());
        });
        self.engine.run(&conversion_args(), Some(progress)).await?;

        let bytes = self.engine.read_output(OUTPUT_NAME).await?;

        info!("✅ Conversion finished ({} bytes out)", bytes.len());

        Ok(ConvertedAudio {
            bytes,
            file_name: AUDIO_FILE_NAME.to_string(),
            mime_type: AUDIO_MIME.to_string(),
        })
    }
}
