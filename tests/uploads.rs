//! Upload, frame and location views over real HTTP.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

mod common;

fn file_form(field: &'static str, name: &'static str, mime: &str, data: &'static [u8]) -> Form {
    let part = Part::bytes(data).file_name(name).mime_str(mime).unwrap();
    Form::new().part(field, part)
}

#[tokio::test]
async fn test_dehaze_upload_stores_input_and_output() {
    let server = common::start_server(common::test_config()).await;

    let res = server
        .client
        .post(server.url("/dehaze/"))
        .multipart(file_form("image", "hazy.png", "image/png", b"\x89PNGhaze"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["input"]["kind"], "dehaze_input");
    assert_eq!(body["output"]["kind"], "dehaze_output");
    assert_eq!(body["input"]["original_name"], "hazy.png");
    assert_eq!(body["output"]["size"], 8);

    let output_url = body["output_url"].as_str().unwrap();
    assert!(output_url.starts_with("/media/"));

    let res = server.client.get(server.url(output_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(&res.bytes().await.unwrap()[..], b"\x89PNGhaze");
}

#[tokio::test]
async fn test_dehaze_rejects_bad_uploads() {
    let mut config = common::test_config();
    config.media.max_image_bytes = 4;
    let server = common::start_server(config).await;

    let wrong_field = server
        .client
        .post(server.url("/dehaze/"))
        .multipart(file_form("photo", "a.png", "image/png", b"png"))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_field.status(), StatusCode::BAD_REQUEST);

    let not_image = server
        .client
        .post(server.url("/dehaze/"))
        .multipart(file_form("image", "a.txt", "text/plain", b"txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(not_image.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let too_big = server
        .client
        .post(server.url("/dehaze/"))
        .multipart(file_form("image", "a.png", "image/png", b"0123456789"))
        .send()
        .await
        .unwrap();
    assert_eq!(too_big.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(server.state.media.count(), 0);
}

#[tokio::test]
async fn test_video_upload_and_processed_video() {
    let mut config = common::test_config();
    config.routes.disabled.clear();
    let server = common::start_server(config).await;

    let res = server.client.get(server.url("/processedvideo/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .post(server.url("/uploadvideo/"))
        .multipart(file_form("video", "clip.mp4", "video/mp4", b"ftypmp42data"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["kind"], "video");
    assert_eq!(body["size"], 12);
    assert!(body["url"].as_str().unwrap().starts_with("/media/"));

    let res = server.client.get(server.url("/processedvideo/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "video/mp4");
    assert_eq!(&res.bytes().await.unwrap()[..], b"ftypmp42data");
}

#[tokio::test]
async fn test_video_upload_limit() {
    let mut config = common::test_config();
    config.media.max_video_bytes = 8;
    let server = common::start_server(config).await;

    let res = server
        .client
        .post(server.url("/uploadvideo/"))
        .multipart(file_form("video", "clip.mp4", "video/mp4", b"0123456789abcdef"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(server.state.media.count(), 0);
}

#[tokio::test]
async fn test_media_route_unknown_id() {
    let server = common::start_server(common::test_config()).await;
    let res = server
        .client
        .get(server.url("/media/67e55044-10b1-426f-9247-bb680e5fe0c8/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_frames_reach_video_feed() {
    let server = common::start_server(common::test_config()).await;

    let mut feed = server.client.get(server.url("/video_feed/")).send().await.unwrap();
    assert_eq!(feed.status(), StatusCode::OK);

    let res = server
        .client
        .post(server.url("/process_frame/"))
        .header("content-type", "image/jpeg")
        .body(&b"\xff\xd8frame-1"[..])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let ack: Value = res.json().await.unwrap();
    assert_eq!(ack["content_type"], "image/jpeg");

    let mut received = Vec::new();
    let needle = b"\xff\xd8frame-1";
    while !received.windows(needle.len()).any(|w| w == needle) {
        let chunk = tokio::time::timeout(Duration::from_secs(2), feed.chunk())
            .await
            .expect("feed produced no frame")
            .unwrap()
            .expect("feed ended early");
        received.extend_from_slice(&chunk);
    }

    let text = String::from_utf8_lossy(&received);
    assert!(text.starts_with("--frame\r\nContent-Type: image/jpeg\r\n"));
}

#[tokio::test]
async fn test_location_data_flow() {
    let server = common::start_server(common::test_config()).await;

    for (lat, lon) in [(27.7, 85.3), (27.8, 85.4)] {
        let res = server
            .client
            .post(server.url("/location_data/"))
            .json(&serde_json::json!({ "latitude": lat, "longitude": lon, "accuracy": 4.5 }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = server
        .client
        .post(server.url("/location_data/"))
        .json(&serde_json::json!({ "latitude": 0.0, "longitude": 200.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = server
        .client
        .post(server.url("/location_data/"))
        .body("latitude=1")
        .header("content-type", "application/x-www-form-urlencoded")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let res = server
        .client
        .get(server.url("/location_data/?limit=1"))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["points"][0]["latitude"], 27.8);
    assert_eq!(body["points"][0]["seq"], 2);
}

fn multipart_body(field: &str, file_name: &str, mime: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--XB\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n--XB--\r\n");
    body
}

/// Open a raw connection and send only the request head.
async fn send_head(
    server: &common::TestServer,
    path: &str,
    content_type: &str,
    len: usize,
) -> TcpStream {
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    let head = format!(
        "POST {path} HTTP/1.1\r\nHost: {}\r\nContent-Type: {content_type}\r\nContent-Length: {len}\r\nConnection: close\r\n\r\n",
        server.addr
    );
    stream.write_all(head.as_bytes()).await.unwrap();
    stream
}

async fn read_response(mut stream: TcpStream) -> String {
    let mut buf = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buf))
        .await
        .expect("no response")
        .unwrap();
    String::from_utf8_lossy(&buf).into_owned()
}

fn stored_videos(server: &common::TestServer) -> usize {
    std::fs::read_dir(server.media_root.join("videos"))
        .map(|dir| dir.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_slow_upload_outlives_request_timeout() {
    let mut config = common::test_config();
    config.timeouts.request_secs = 1;
    let server = common::start_server(config).await;

    let video = vec![7u8; 64 * 1024];
    let body = multipart_body("video", "slow.mp4", "video/mp4", &video);
    let (first, rest) = body.split_at(body.len() / 2);

    let mut stream = send_head(
        &server,
        "/uploadvideo/",
        "multipart/form-data; boundary=XB",
        body.len(),
    )
    .await;
    stream.write_all(first).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    stream.write_all(rest).await.unwrap();

    let response = read_response(stream).await;
    assert!(response.starts_with("HTTP/1.1 201"), "{response}");
    assert_eq!(server.state.media.count(), 1);
    assert_eq!(stored_videos(&server), 1);
}

#[tokio::test]
async fn test_abandoned_upload_leaves_no_file() {
    let server = common::start_server(common::test_config()).await;

    let body = multipart_body("video", "gone.mp4", "video/mp4", &vec![1u8; 64 * 1024]);
    let mut stream = send_head(
        &server,
        "/uploadvideo/",
        "multipart/form-data; boundary=XB",
        body.len() + 1_000_000,
    )
    .await;
    stream.write_all(&body[..body.len() / 2]).await.unwrap();

    // Wait until the partial file exists, then hang up.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while stored_videos(&server) == 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(stored_videos(&server), 1);
    drop(stream);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while stored_videos(&server) > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(stored_videos(&server), 0);
    assert_eq!(server.state.media.count(), 0);
}

#[tokio::test]
async fn test_stalled_frame_times_out() {
    let mut config = common::test_config();
    config.timeouts.request_secs = 1;
    let server = common::start_server(config).await;

    let mut stream = send_head(&server, "/process_frame/", "image/png", 100).await;
    stream.write_all(b"\x89PNG").await.unwrap();

    let response = read_response(stream).await;
    assert!(response.starts_with("HTTP/1.1 408"), "{response}");
    assert!(server.state.frames.latest().is_none());
}

#[tokio::test]
async fn test_oversized_location_body_rejected() {
    let server = common::start_server(common::test_config()).await;
    let padded = format!(
        r#"{{"latitude": 1.0, "longitude": 2.0{}}}"#,
        " ".repeat(256 * 1024)
    );
    let res = server
        .client
        .post(server.url("/location_data/"))
        .header("content-type", "application/json")
        .body(padded)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(server.state.locations.is_empty());
}
