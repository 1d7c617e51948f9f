//! Chat-attachment storage: multipart upload into the attachments bucket,
//! public-URL construction, prefix-checked deletion.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use aws_sdk_s3::primitives::ByteStream;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::middleware::Claims;
use crate::errors::AppError;
use crate::models::chat::Attachment;
use crate::state::AppState;

const ATTACHMENT_CACHE_CONTROL: &str = "max-age=3600";

/// POST /api/v1/uploads
///
/// Accepts one or more files and stores each under the caller's prefix.
/// Responds with the `{url, name, type}` triples the chat UI attaches to a
/// message.
pub async fn upload_attachments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<Attachment>>), AppError> {
    let mut uploaded = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue; // non-file fields are ignored
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;

        let key = object_key(claims.sub, &file_name);
        state
            .s3
            .put_object()
            .bucket(&state.config.s3_bucket)
            .key(&key)
            .body(ByteStream::from(data.to_vec()))
            .content_type(&content_type)
            .cache_control(ATTACHMENT_CACHE_CONTROL)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("upload failed: {e}")))?;

        info!("Stored attachment {key} ({} bytes)", data.len());

        uploaded.push(Attachment {
            url: public_url(&state.config.s3_endpoint, &state.config.s3_bucket, &key),
            name: file_name,
            mime_type: content_type,
        });
    }

    if uploaded.is_empty() {
        return Err(AppError::Validation("no files in request".to_string()));
    }

    Ok((StatusCode::CREATED, Json(uploaded)))
}

#[derive(Debug, Deserialize)]
pub struct DeleteUploadRequest {
    pub url: String,
}

/// DELETE /api/v1/uploads
///
/// The object key must live under the caller's prefix; deleting another
/// account's attachment is refused.
pub async fn delete_attachment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<DeleteUploadRequest>,
) -> Result<StatusCode, AppError> {
    let key = key_from_url(&req.url, &state.config.s3_bucket)
        .ok_or_else(|| AppError::Validation("not an attachment URL".to_string()))?;

    if !key.starts_with(&format!("{}/", claims.sub)) {
        return Err(AppError::Forbidden);
    }

    state
        .s3
        .delete_object()
        .bucket(&state.config.s3_bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| AppError::Storage(format!("delete failed: {e}")))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Objects are keyed `<user_id>/<uuid>.<ext>`, preserving only the original
/// extension.
fn object_key(user_id: Uuid, file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("{user_id}/{}.{ext}", Uuid::new_v4()),
        _ => format!("{user_id}/{}", Uuid::new_v4()),
    }
}

fn public_url(endpoint: &str, bucket: &str, key: &str) -> String {
    format!("{}/{bucket}/{key}", endpoint.trim_end_matches('/'))
}

/// Extracts the object key from a public URL produced by `public_url`.
fn key_from_url<'a>(url: &'a str, bucket: &str) -> Option<&'a str> {
    let marker = format!("/{bucket}/");
    let idx = url.find(&marker)?;
    let key = &url[idx + marker.len()..];
    (!key.is_empty()).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_keys_are_scoped_to_the_user_and_keep_extension() {
        let user_id = Uuid::new_v4();
        let key = object_key(user_id, "vacation photo.PNG");
        assert!(key.starts_with(&format!("{user_id}/")));
        assert!(key.ends_with(".PNG"));
    }

    #[test]
    fn object_keys_without_extension_still_get_unique_names() {
        let user_id = Uuid::new_v4();
        let key = object_key(user_id, "README");
        assert!(key.starts_with(&format!("{user_id}/")));
        assert!(!key.contains('.'));
    }

    #[test]
    fn public_url_round_trips_through_key_extraction() {
        let url = public_url("http://minio:9000/", "chat-attachments", "u1/f1.png");
        assert_eq!(url, "http://minio:9000/chat-attachments/u1/f1.png");
        assert_eq!(key_from_url(&url, "chat-attachments"), Some("u1/f1.png"));
    }

    #[test]
    fn key_extraction_rejects_foreign_urls() {
        assert_eq!(key_from_url("http://elsewhere/other/u1/f1.png", "chat-attachments"), None);
    }
}
