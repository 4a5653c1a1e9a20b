/// Integration tests for image uploads
///
/// - PNG/JPEG accepted, stored under a random name, reference returned
/// - Other types rejected with 415
/// - Oversized bodies rejected with 413
/// - The returned reference is accepted by signup

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{TestContext, MAX_UPLOAD_BYTES};
use serde_json::json;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn png(len: usize) -> Vec<u8> {
    let mut data = PNG_SIGNATURE.to_vec();
    data.resize(len.max(PNG_SIGNATURE.len()), 0);
    data
}

fn upload(content_type: &str, data: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/uploads/images")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(data))
        .unwrap()
}

#[tokio::test]
async fn test_png_upload_returns_reference() {
    let ctx = TestContext::new();

    let (status, body) = ctx.dispatch(upload("image/png", png(64))).await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let image = body["image"].as_str().unwrap();
    assert!(image.starts_with("http://localhost:5000/images/"));
    assert!(image.ends_with(".png"));

    let file_name = image.rsplit('/').next().unwrap();
    let stored = std::fs::read(ctx.uploads.path().join("images").join(file_name)).unwrap();
    assert_eq!(stored.len(), 64);
}

#[tokio::test]
async fn test_jpeg_upload_uses_jpg_extension() {
    let ctx = TestContext::new();
    let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    let (status, body) = ctx.dispatch(upload("image/jpeg", jpeg)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["image"].as_str().unwrap().ends_with(".jpg"));
}

#[tokio::test]
async fn test_unsupported_type_is_415() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .dispatch(upload("image/gif", b"GIF89a....".to_vec()))
        .await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["code"], "unsupported_media_type");

    // Declared PNG, but the bytes are not
    let (status, _) = ctx
        .dispatch(upload("image/png", b"not really a png".to_vec()))
        .await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_oversized_upload_is_413() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .dispatch(upload("image/png", png(MAX_UPLOAD_BYTES + 1)))
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "payload_too_large");
}

#[tokio::test]
async fn test_uploaded_reference_used_at_signup() {
    let ctx = TestContext::new();

    let (_, body) = ctx.dispatch(upload("image/png", png(32))).await;
    let image = body["image"].as_str().unwrap().to_string();

    let (status, session) = ctx
        .post(
            "/api/user/signup",
            None,
            json!({
                "name": "Ada",
                "surname": "Lovelace",
                "age": 36,
                "email": "ada@x.com",
                "password": "pw1",
                "image": image,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, user) = ctx
        .get(
            &format!("/api/user/{}", session["userId"].as_str().unwrap()),
            session["token"].as_str().unwrap(),
        )
        .await;
    assert_eq!(user["user"]["image"], image);
}
