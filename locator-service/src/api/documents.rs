use std::path::Path as FsPath;

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tokio_util::io::ReaderStream;

use super::{
    error::{observed, ApiError, Identifier},
    AppState, SharedState,
};
use crate::config::{AllowedDocument, DocumentsConfig};

/// Reduces a requested name to its final path component. Empty and hidden
/// names are refused.
pub fn normalize_filename(raw: &str) -> Option<&str> {
    let name = raw.trim().rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name.starts_with('.') {
        return None;
    }
    Some(name)
}

fn allowed<'a>(docs: &'a DocumentsConfig, requested: &str) -> Option<&'a AllowedDocument> {
    let name = normalize_filename(requested)?;
    docs.allowed.iter().find(|d| d.filename == name)
}

fn content_type(filename: &str) -> &'static str {
    let ext = FsPath::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("doc") => "application/msword",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<SharedState>) -> Response {
    observed("documents", Ok::<_, ApiError>(Json(state.documents.allowed.clone()))).into_response()
}

#[tracing::instrument(skip(state))]
pub async fn download(State(state): State<SharedState>, Path(filename): Path<String>) -> Response {
    observed("download", serve(&state, &filename).await).into_response()
}

async fn serve(state: &AppState, requested: &str) -> Result<Response, ApiError> {
    let doc = allowed(&state.documents, requested).ok_or(ApiError::NotFound(Identifier::Document))?;
    let path = state.documents.dir.join(&doc.filename);

    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "allow-listed document is not readable");
        ApiError::NotFound(Identifier::Document)
    })?;

    let headers = [
        (header::CONTENT_TYPE, content_type(&doc.filename).to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", doc.filename)),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_keeps_only_the_last_component() {
        assert_eq!(normalize_filename(" uputstvo.pdf "), Some("uputstvo.pdf"));
        assert_eq!(normalize_filename("../../etc/uputstvo.pdf"), Some("uputstvo.pdf"));
        assert_eq!(normalize_filename("docs\\uputstvo.pdf"), Some("uputstvo.pdf"));
        assert_eq!(normalize_filename(".env"), None);
        assert_eq!(normalize_filename("docs/"), None);
        assert_eq!(normalize_filename("   "), None);
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type("Uputstvo.PDF"), "application/pdf");
        assert_eq!(content_type("readme"), "application/octet-stream");
    }
}
