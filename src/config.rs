use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for the upload pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote transcription service settings
    pub api: ApiConfig,

    /// Transcoding engine settings
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the transcription service
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// ffmpeg binary used for transcoding runs
    pub ffmpeg_path: String,

    /// ffprobe binary used to derive progress fractions
    pub ffprobe_path: String,
}

impl Config {
    /// Load configuration from file, falling back to the environment
    pub fn load() -> Result<Self> {
        let config_paths = [
            "transcribe-uploader.toml",
            "config/transcribe-uploader.toml",
            "~/.config/transcribe-uploader/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Ok(Self::from_env())
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("TRANSCRIBE_UPLOADER_API_URL") {
            config.api.base_url = base_url;
        }

        if let Ok(ffmpeg) = std::env::var("TRANSCRIBE_UPLOADER_FFMPEG") {
            config.engine.ffmpeg_path = ffmpeg;
        }

        if let Ok(ffprobe) = std::env::var("TRANSCRIBE_UPLOADER_FFPROBE") {
            config.engine.ffprobe_path = ffprobe;
        }

        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.api.base_url)
            .map_err(|e| anyhow!("invalid api.base_url '{}': {}", self.api.base_url, e))?;

        if self.engine.ffmpeg_path.is_empty() {
            return Err(anyhow!("engine.ffmpeg_path must not be empty"));
        }

        if self.engine.ffprobe_path.is_empty() {
            return Err(anyhow!("engine.ffprobe_path must not be empty"));
        }

        Ok(())
    }

    /// Human-readable runtime summary
    pub fn summary(&self) -> String {
        format!(
            "Transcribe Uploader Configuration:\n\
            - API Base URL: {}\n\
            - FFmpeg: {}\n\
            - FFprobe: {}",
            self.api.base_url, self.engine.ffmpeg_path, self.engine.ffprobe_path
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3333".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.api.base_url = base_url.into();
        self
    }

    pub fn with_ffmpeg_path(mut self, path: impl Into<String>) -> Self {
        self.config.engine.ffmpeg_path = path.into();
        self
    }

    pub fn with_ffprobe_path(mut self, path: impl Into<String>) -> Self {
        self.config.engine.ffprobe_path = path.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
