use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Arg, Command};
use tracing::{info, warn};

mod api;
mod audio;
mod config;
mod engine;
mod form;
mod status;
mod video;

use crate::api::UploadClient;
use crate::config::Config;
use crate::engine::get_engine;
use crate::form::UploadForm;
use crate::video::{FileCandidate, ACCEPTED_MIME};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("Transcribe Uploader")
        .version("0.1.0")
        .about("Convert a video to audio and submit it for transcription")
        .arg(
            Arg::new("video")
                .short('i')
                .long("video")
                .value_name("FILE")
                .help("Video file to submit (mp4 only)")
                .required(true),
        )
        .arg(
            Arg::new("prompt")
                .short('p')
                .long("prompt")
                .value_name("TEXT")
                .help("Comma-separated keywords mentioned in the video"),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .value_name("URL")
                .help("Base URL of the transcription service"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");

    // Initialize logging
    let filter = if verbose {
        "transcribe_uploader=debug,info"
    } else {
        "transcribe_uploader=info,warn"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let video_path = PathBuf::from(
        matches
            .get_one::<String>("video")
            .ok_or_else(|| anyhow!("missing video argument"))?,
    );

    // Load configuration
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    if let Some(api_url) = matches.get_one::<String>("api-url") {
        config.api.base_url = api_url.clone();
    }

    config.validate()?;

    info!("🚀 Transcribe Uploader starting...");
    info!("📹 Video: {}", video_path.display());
    info!("🌐 API: {}", config.api.base_url);

    // The picker accepts mp4 only
    let is_mp4 = video_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("mp4"))
        .unwrap_or(false);
    if !is_mp4 {
        return Err(anyhow!(
            "only {} is accepted: {}",
            ACCEPTED_MIME,
            video_path.display()
        ));
    }

    let bytes = tokio::fs::read(&video_path).await?;
    let file_name = video_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "video.mp4".to_string());

    // Shared engine handle, created on first use
    let engine = get_engine(&config.engine).await?;
    if !engine.is_available().await {
        return Err(anyhow!(
            "transcoding engine '{}' is not available",
            config.engine.ffmpeg_path
        ));
    }

    let client = UploadClient::new(&config.api)?;

    let mut form = UploadForm::new(engine, Arc::new(client)).with_on_video_uploaded(|id| {
        info!("🆔 Video id: {}", id);
        println!("{}", id.as_str());
    });

    // Print status transitions as the pipeline advances
    let mut status_rx = form.subscribe_status();
    tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let status = *status_rx.borrow_and_update();
            info!("⏳ {}", status.label());
        }
    });

    form.handle_file_selected(vec![FileCandidate {
        name: file_name,
        mime_type: ACCEPTED_MIME.to_string(),
        bytes,
    }])?;

    if let Some(prompt) = matches.get_one::<String>("prompt") {
        form.set_prompt(prompt.clone());
    }

    form.submit().await?;

    info!("🎉 Done");
    Ok(())
}
