use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use fundry_types::api::{Claims, FileUploadResponse, RecordFileRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{parse_sqlite_datetime, parse_uuid};

const ALLOWED_KINDS: [&str; 4] = ["pitch_deck", "logo", "profile_photo", "safe_agreement"];

/// Record upload metadata. The bytes themselves live in external storage;
/// the client uploads there first and registers the resulting URL here.
pub async fn record_upload(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RecordFileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.filename.trim().is_empty() || req.url.trim().is_empty() {
        return Err(ApiError::Validation("filename and url are required".into()));
    }
    if req.size_bytes <= 0 {
        return Err(ApiError::Validation("size must be positive".into()));
    }
    if !ALLOWED_KINDS.contains(&req.kind.as_str()) {
        return Err(ApiError::Validation(format!(
            "unknown file kind '{}'",
            req.kind
        )));
    }

    let file_id = Uuid::new_v4();
    state
        .db
        .record_file_upload(
            &file_id.to_string(),
            &claims.sub.to_string(),
            req.filename.trim(),
            &req.mime_type,
            req.size_bytes,
            req.url.trim(),
            &req.kind,
        )
        .map_err(ApiError::Internal)?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": file_id })),
    ))
}

pub async fn list_uploads(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .db
        .list_file_uploads(&claims.sub.to_string())
        .map_err(ApiError::Internal)?;

    let responses = rows
        .into_iter()
        .map(|row| {
            Ok(FileUploadResponse {
                id: parse_uuid(&row.id)?,
                filename: row.filename,
                mime_type: row.mime_type,
                size_bytes: row.size_bytes,
                url: row.url,
                kind: row.kind,
                created_at: parse_sqlite_datetime(&row.created_at),
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(Json(responses))
}
