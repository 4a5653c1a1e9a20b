/// Image upload endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/uploads/images
/// Content-Type: image/png
///
/// <raw image bytes>
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// { "image": "http://localhost:5000/images/<uuid>.png" }
/// ```
///
/// The returned reference goes into the `image` field of signup or
/// project requests.
///
/// # Errors
///
/// - `413 Payload Too Large`: Body exceeds `UPLOAD_MAX_BYTES`
/// - `415 Unsupported Media Type`: Not PNG or JPEG
/// - `422 Unprocessable Entity`: Empty body

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Upload response
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Public reference to the stored image
    pub image: String,
}

/// Store an uploaded image
pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(format!("Image exceeds {} bytes", state.blobs.max_bytes()))
        } else {
            ApiError::invalid("body", rejection.body_text())
        }
    })?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let size = body.len();
    let image = state.blobs.put(body, content_type).await?;

    info!(size, "Image uploaded");

    Ok((StatusCode::CREATED, Json(UploadResponse { image })))
}
