//! PDF upload endpoint

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use std::path::Path;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::ingestion::MetadataOverrides;
use crate::server::state::AppState;
use crate::types::UploadResponse;

/// Reduce a client-supplied file name to its final path component
pub(crate) fn sanitize_filename(raw: &str) -> Option<String> {
    let normalized = raw.replace('\\', "/");
    Path::new(&normalized)
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
}

fn text_value(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// POST /upload-pdf - Store a PDF in the scratch directory and index it
pub async fn upload_pdf(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let mut multipart = multipart?;
    let start = Instant::now();
    let mut upload: Option<(String, bytes::Bytes)> = None;
    let mut overrides = MetadataOverrides::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Internal(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if let Some(raw_filename) = field.file_name().map(str::to_string) {
            let filename = sanitize_filename(&raw_filename).ok_or_else(|| {
                Error::Internal(format!("Invalid upload file name: '{}'", raw_filename))
            })?;
            let data = field
                .bytes()
                .await
                .map_err(|e| Error::Internal(format!("Failed to read file: {}", e)))?;
            upload = Some((filename, data));
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| Error::Internal(format!("Failed to read field '{}': {}", name, e)))?;
        match name.as_str() {
            "title" => overrides.title = text_value(text),
            "author" => overrides.author = text_value(text),
            "document_type" => overrides.document_type = text_value(text),
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }

    let (filename, data) =
        upload.ok_or_else(|| Error::Internal("No file found in upload".to_string()))?;

    let upload_dir = &state.config().server.upload_dir;
    tokio::fs::create_dir_all(upload_dir).await?;
    let path = upload_dir.join(&filename);
    tokio::fs::write(&path, &data).await?;
    tracing::info!("Saved upload {} ({} bytes)", path.display(), data.len());

    let chunks = state.index_pdf(&path, overrides).await?;
    tracing::info!(
        "Uploaded {} as {} chunks in {:.1}s",
        filename,
        chunks,
        start.elapsed().as_secs_f64()
    );

    Ok(Json(UploadResponse::indexed(&filename)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf").as_deref(), Some("report.pdf"));
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_filename("C:\\Users\\me\\cv.pdf").as_deref(), Some("cv.pdf"));
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename(""), None);
    }
}
