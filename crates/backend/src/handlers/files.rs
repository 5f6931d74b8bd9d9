use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use crate::shared::files;
use crate::system::auth::extractor::CurrentSession;

/// POST /api/files — загрузка документа (multipart), возвращает URL
/// для поля downloadUrl / sheetUrl
pub async fn upload(
    CurrentSession(session): CurrentSession,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, StatusCode> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(|n| n.to_string())
            .unwrap_or_else(|| "upload.bin".to_string());
        let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        if bytes.is_empty() {
            return Err(StatusCode::BAD_REQUEST);
        }

        let url = files::save_file(&file_name, &bytes).await.map_err(|e| {
            tracing::error!("File upload failed for agent {}: {}", session.agent_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        return Ok(Json(json!({ "url": url, "fileName": file_name })));
    }

    Err(StatusCode::BAD_REQUEST)
}
