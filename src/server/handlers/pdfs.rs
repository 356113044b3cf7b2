use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Multipart, Path as UrlPath, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::state::AppState;

struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
}

/// Reads a multipart body into `conversation_id` and file parts. Both the
/// single upload (`file`) and the batch upload (`files`) use the same shape.
async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(Option<String>, Vec<UploadedFile>), ApiError> {
    let mut conversation_id: Option<String> = None;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("conversation_id") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                if !value.trim().is_empty() {
                    conversation_id = Some(value);
                }
            }
            Some("file") | Some("files") => {
                let filename = sanitize_filename(field.file_name().unwrap_or("upload.pdf"));
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                files.push(UploadedFile {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok((conversation_id, files))
}

fn sanitize_filename(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload.pdf".to_string())
}

/// Writes an uploaded file into its own staging directory, keeping the
/// client's filename (it becomes the stored `source` metadata) while letting
/// concurrent uploads of the same name coexist.
async fn stage_upload(state: &AppState, file: &UploadedFile) -> Result<PathBuf, ApiError> {
    let staging_dir = state
        .paths
        .upload_dir
        .join(Uuid::new_v4().simple().to_string());
    tokio::fs::create_dir_all(&staging_dir)
        .await
        .map_err(ApiError::internal)?;

    let staged = staging_dir.join(&file.filename);
    tokio::fs::write(&staged, &file.bytes)
        .await
        .map_err(ApiError::internal)?;
    Ok(staged)
}

async fn discard_upload(staged: &Path) {
    let _ = tokio::fs::remove_file(staged).await;
    if let Some(dir) = staged.parent() {
        let _ = tokio::fs::remove_dir(dir).await;
    }
}

pub async fn upload_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (conversation_id, mut files) = read_multipart(multipart).await?;
    let file = files
        .pop()
        .ok_or_else(|| ApiError::BadRequest("missing file field".to_string()))?;

    if !file.filename.to_lowercase().ends_with(".pdf") {
        return Err(ApiError::BadRequest("Only PDF files are allowed".to_string()));
    }

    let staged = stage_upload(&state, &file).await?;

    let rag = state.rag().await;
    let result = rag.upload_pdf(&staged, conversation_id.as_deref()).await;
    discard_upload(&staged).await;
    let pdf_id = result?;

    Ok(Json(json!({
        "pdf_id": pdf_id,
        "filename": file.filename,
        "conversation_id": conversation_id,
        "message": "PDF uploaded and processed successfully",
    })))
}

pub async fn upload_pdfs_batch(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (conversation_id, files) = read_multipart(multipart).await?;
    if files.is_empty() {
        return Err(ApiError::BadRequest("missing files field".to_string()));
    }

    let mut staged_paths = Vec::with_capacity(files.len());
    for file in &files {
        staged_paths.push(stage_upload(&state, file).await?);
    }

    let rag = state.rag().await;
    let results = rag
        .upload_pdfs_batch(&staged_paths, conversation_id.as_deref())
        .await;

    for staged in &staged_paths {
        discard_upload(staged).await;
    }

    Ok(Json(json!({ "results": results })))
}

pub async fn get_conversation_pdfs(
    State(state): State<Arc<AppState>>,
    UrlPath(conversation_id): UrlPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let pdfs = state
        .pdf_service
        .get_conversation_pdfs(&conversation_id)
        .await?;
    Ok(Json(pdfs))
}

pub async fn get_global_pdfs(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let pdfs = state.pdf_service.get_global_pdfs().await?;
    Ok(Json(pdfs))
}

pub async fn get_pdf_info(
    State(state): State<Arc<AppState>>,
    UrlPath(pdf_id): UrlPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let pdf = state.pdf_service.get_pdf(&pdf_id).await?;

    // chunk_count == 0 flags an upload whose vectors never got indexed.
    let rag = state.rag().await;
    let chunk_count = rag.count_chunks_for_pdf(&pdf_id).await?;

    Ok(Json(json!({
        "pdf_id": pdf.pdf_id,
        "filename": pdf.filename,
        "conversation_id": pdf.conversation_id,
        "uploaded_at": pdf.uploaded_at,
        "chunk_count": chunk_count,
    })))
}

pub async fn download_pdf(
    State(state): State<Arc<AppState>>,
    UrlPath(pdf_id): UrlPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.pdf_service.get_pdf(&pdf_id).await?;
    let bytes = state.pdf_service.download(&pdf_id).await?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", record.filename),
        ),
    ];

    Ok((headers, bytes))
}

pub async fn delete_pdf(
    State(state): State<Arc<AppState>>,
    UrlPath(pdf_id): UrlPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let rag = state.rag().await;
    rag.delete_pdf(&pdf_id).await?;
    Ok(Json(json!({ "message": "PDF deleted successfully" })))
}
