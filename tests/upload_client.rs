use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use transcribe_uploader::config::ApiConfig;
use transcribe_uploader::{ApiError, ConvertedAudio, TranscriptionApi, UploadClient, VideoId};

fn sample_audio() -> ConvertedAudio {
    ConvertedAudio {
        bytes: b"encoded audio".to_vec(),
        file_name: "audio.mp3".to_string(),
        mime_type: "audio/mpeg".to_string(),
    }
}

fn client_for(server: &MockServer) -> UploadClient {
    UploadClient::new(&ApiConfig {
        base_url: server.uri(),
    })
    .expect("client")
}

#[tokio::test]
async fn create_video_sends_multipart_file_and_extracts_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/videos"))
        .and(body_string_contains(r#"name="file""#))
        .and(body_string_contains(r#"filename="audio.mp3""#))
        .and(body_string_contains("audio/mpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "video": { "id": "abc123", "name": "audio.mp3" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let id = client.create_video(&sample_audio()).await.expect("upload ok");

    assert_eq!(id, VideoId::new("abc123"));
}

#[tokio::test]
async fn create_video_propagates_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.create_video(&sample_audio()).await.unwrap_err();

    match err {
        ApiError::Status { status, body, .. } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn create_video_rejects_body_without_video_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "video": { "name": "audio.mp3" }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.create_video(&sample_audio()).await.unwrap_err();

    assert!(matches!(err, ApiError::MalformedResponse { .. }));
}

#[tokio::test]
async fn request_transcription_posts_the_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/videos/abc123/transcription"))
        .and(body_json(json!({ "prompt": "guard, sweep" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .request_transcription(&VideoId::new("abc123"), Some("guard, sweep"))
        .await
        .expect("request ok");
}

#[tokio::test]
async fn request_transcription_omits_an_absent_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/videos/abc123/transcription"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .request_transcription(&VideoId::new("abc123"), None)
        .await
        .expect("request ok");
}

#[tokio::test]
async fn request_transcription_propagates_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/videos/abc123/transcription"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .request_transcription(&VideoId::new("abc123"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Status { .. }));
}
