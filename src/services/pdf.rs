use crate::core::errors::ApiError;
use crate::repositories::{Database, PdfRecord, PdfRepository};

/// Read-side PDF lookups. Deletion goes through `RagService` so indexed
/// chunks are cleaned up together with the record.
#[derive(Clone)]
pub struct PdfService {
    pdfs: PdfRepository,
}

impl PdfService {
    pub fn new(db: &Database) -> Self {
        Self { pdfs: db.pdfs() }
    }

    pub async fn get_pdf(&self, pdf_id: &str) -> Result<PdfRecord, ApiError> {
        self.pdfs
            .find_by_id(pdf_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("PDF not found: {}", pdf_id)))
    }

    pub async fn download(&self, pdf_id: &str) -> Result<Vec<u8>, ApiError> {
        self.pdfs
            .content(pdf_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("PDF not found: {}", pdf_id)))
    }

    pub async fn get_conversation_pdfs(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<PdfRecord>, ApiError> {
        self.pdfs.find_by_conversation(conversation_id).await
    }

    pub async fn get_global_pdfs(&self) -> Result<Vec<PdfRecord>, ApiError> {
        self.pdfs.find_global().await
    }
}
