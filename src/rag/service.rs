//! Retrieval orchestration: ingestion, question answering, history-aware
//! chat, statistics and cascade deletion. One `RagService` instance is bound
//! to a fixed (llm, embedding, vectordb) triple for its whole lifetime;
//! switching providers means building a new instance.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::core::config::Settings;
use crate::core::errors::ApiError;
use crate::document::PdfProcessor;
use crate::embedding::EmbeddingProvider;
use crate::llm::LlmProvider;
use crate::repositories::{
    ConversationRepository, Database, MessageRecord, MessageRepository, PdfRepository,
};
use crate::vectordb::{ChunkMetadata, ScoredChunk, VectorStore};

#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub user_message_id: i64,
    pub assistant_message_id: i64,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchUploadResult {
    pub filename: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total_conversations: i64,
    pub total_pdfs: i64,
    pub global_pdfs: i64,
    pub conversation_pdfs: i64,
}

pub struct RagService {
    llm: Arc<dyn LlmProvider>,
    embedding: Arc<dyn EmbeddingProvider>,
    vectordb: Arc<dyn VectorStore>,
    processor: PdfProcessor,
    pdfs: PdfRepository,
    conversations: ConversationRepository,
    messages: MessageRepository,
    chat_includes_global: bool,
}

impl RagService {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        embedding: Arc<dyn EmbeddingProvider>,
        vectordb: Arc<dyn VectorStore>,
        db: &Database,
        settings: &Settings,
    ) -> Self {
        Self {
            llm,
            embedding,
            vectordb,
            processor: PdfProcessor::new(settings.chunk_size, settings.chunk_overlap),
            pdfs: db.pdfs(),
            conversations: db.conversations(),
            messages: db.messages(),
            chat_includes_global: settings.chat_includes_global,
        }
    }

    /// Extract, chunk, embed and index one PDF. Returns the new `pdf_id`.
    pub async fn upload_pdf(
        &self,
        path: &Path,
        conversation_id: Option<&str>,
    ) -> Result<String, ApiError> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.pdf".to_string());

        let text = self.processor.extract_text(path).await?;
        let content = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::DocumentProcessing(format!("failed to read {}: {}", filename, e)))?;

        self.ingest_document(&filename, &content, &text, conversation_id)
            .await
    }

    /// The ingestion pipeline after extraction.
    ///
    /// PDF record and vector upsert are two separate writes; a failure in
    /// between leaves a PDF with zero indexed chunks, which callers can
    /// detect and re-ingest.
    async fn ingest_document(
        &self,
        filename: &str,
        content: &[u8],
        text: &str,
        conversation_id: Option<&str>,
    ) -> Result<String, ApiError> {
        if text.trim().is_empty() {
            return Err(ApiError::DocumentProcessing(format!(
                "no extractable text in {}",
                filename
            )));
        }

        let chunks = self.processor.split_text(text);
        let embeddings = self.embedding.embed(&chunks).await?;

        let pdf_id = format!("pdf_{}", Uuid::new_v4().simple());
        let scope = conversation_id.unwrap_or("");

        self.pdfs
            .create(&pdf_id, filename, content, scope)
            .await?;

        let metadata: Vec<ChunkMetadata> = chunks
            .iter()
            .map(|_| ChunkMetadata {
                source: filename.to_string(),
                pdf_id: pdf_id.clone(),
                conversation_id: scope.to_string(),
            })
            .collect();
        let ids: Vec<String> = (0..chunks.len())
            .map(|i| format!("{}_chunk_{}", pdf_id, i))
            .collect();

        self.vectordb
            .add_documents(&chunks, &embeddings, &metadata, &ids)
            .await?;

        tracing::info!(
            "ingested {} as {} ({} chunks, scope {:?})",
            filename,
            pdf_id,
            chunks.len(),
            scope
        );

        Ok(pdf_id)
    }

    /// Sequential batch ingestion. One result entry per input file, in input
    /// order; a failing file never aborts its siblings.
    pub async fn upload_pdfs_batch(
        &self,
        paths: &[PathBuf],
        conversation_id: Option<&str>,
    ) -> Vec<BatchUploadResult> {
        let mut results = Vec::with_capacity(paths.len());

        for path in paths {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            match self.upload_pdf(path, conversation_id).await {
                Ok(pdf_id) => results.push(BatchUploadResult {
                    filename,
                    status: "success",
                    pdf_id: Some(pdf_id),
                    error: None,
                }),
                Err(err) => {
                    tracing::warn!("batch upload failed for {}: {}", filename, err);
                    results.push(BatchUploadResult {
                        filename,
                        status: "failed",
                        pdf_id: None,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        results
    }

    /// Stateless question answering. A `conversation_id` narrows retrieval to
    /// that conversation plus global documents; without one, everything is in
    /// scope. Nothing is persisted.
    pub async fn query(
        &self,
        question: &str,
        conversation_id: Option<&str>,
        top_k: usize,
    ) -> Result<String, ApiError> {
        let query_embedding = self.embed_single(question).await?;
        let results = self.vectordb.search(&query_embedding, top_k).await?;

        let results = match conversation_id {
            Some(scope) => filter_by_scope(results, scope, true),
            None => results,
        };

        // An empty result set still goes to the model: the prompt instructs
        // it to answer with the fallback sentence.
        let context = join_context(&results);
        let prompt = build_query_prompt(&context, question);

        self.llm.generate(&prompt).await
    }

    /// Conversation-scoped chat. The user message is persisted before
    /// generation, so a provider failure leaves a dangling (retryable) user
    /// turn rather than losing input.
    pub async fn chat(
        &self,
        conversation_id: &str,
        message: &str,
        top_k: usize,
        history_limit: i64,
    ) -> Result<ChatOutcome, ApiError> {
        let user_message_id = self
            .messages
            .create(conversation_id, "user", message)
            .await?;

        let query_embedding = self.embed_single(message).await?;
        let results = self.vectordb.search(&query_embedding, top_k).await?;
        let results = filter_by_scope(results, conversation_id, self.chat_includes_global);

        let context = join_context(&results);
        let history = self
            .messages
            .find_by_conversation(conversation_id, history_limit)
            .await?;
        let prompt = build_chat_prompt(&history, &context, message);

        let answer = self.llm.generate(&prompt).await?;

        let assistant_message_id = self
            .messages
            .create(conversation_id, "assistant", &answer)
            .await?;

        Ok(ChatOutcome {
            user_message_id,
            assistant_message_id,
            answer,
        })
    }

    /// Read-only aggregation over the repositories.
    pub async fn get_statistics(&self) -> Result<Statistics, ApiError> {
        let total_conversations = self.conversations.count_all().await?;
        let total_pdfs = self.pdfs.count_all().await?;
        let global_pdfs = self.pdfs.count_global().await?;

        Ok(Statistics {
            total_conversations,
            total_pdfs,
            global_pdfs,
            conversation_pdfs: total_pdfs - global_pdfs,
        })
    }

    /// Chunks indexed for a PDF. Zero for an existing record means the
    /// two-step ingestion stopped between the metadata write and the vector
    /// upsert; re-uploading repairs it.
    pub async fn count_chunks_for_pdf(&self, pdf_id: &str) -> Result<usize, ApiError> {
        self.vectordb.count_by_pdf(pdf_id).await
    }

    /// Removes a PDF record and its indexed chunks.
    pub async fn delete_pdf(&self, pdf_id: &str) -> Result<(), ApiError> {
        let deleted = self.pdfs.delete(pdf_id).await?;
        if deleted == 0 {
            return Err(ApiError::NotFound(format!("PDF not found: {}", pdf_id)));
        }

        self.vectordb.delete_by_pdf(pdf_id).await?;
        Ok(())
    }

    /// Removes a conversation with its messages, PDFs and indexed chunks.
    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<(), ApiError> {
        let deleted = self.conversations.delete(conversation_id).await?;
        if deleted == 0 {
            return Err(ApiError::NotFound(format!(
                "Conversation not found: {}",
                conversation_id
            )));
        }

        self.messages.delete_by_conversation(conversation_id).await?;
        self.pdfs.delete_by_conversation(conversation_id).await?;
        self.vectordb.delete_by_conversation(conversation_id).await?;
        Ok(())
    }

    async fn embed_single(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let texts = [text.to_string()];
        let mut embeddings = self.embedding.embed(&texts).await?;
        embeddings
            .pop()
            .ok_or_else(|| ApiError::Provider("embedding provider returned no vector".to_string()))
    }
}

fn filter_by_scope(
    results: Vec<ScoredChunk>,
    conversation_id: &str,
    include_global: bool,
) -> Vec<ScoredChunk> {
    results
        .into_iter()
        .filter(|r| {
            r.metadata.conversation_id == conversation_id
                || (include_global && r.metadata.conversation_id.is_empty())
        })
        .collect()
}

fn join_context(results: &[ScoredChunk]) -> String {
    results
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn build_query_prompt(context: &str, question: &str) -> String {
    format!(
        "You are an expert driving assistant knowledgeable about driving laws, road safety, and car maintenance.\n\
         \n\
         Use ONLY the context below to answer.\n\
         If the context does not clearly contain the answer, reply: \"I'm not sure based on the context.\"\n\
         \n\
         Context:\n\
         ---\n\
         {}\n\
         ---\n\
         \n\
         Question: {}\n\
         \n\
         Provide a short, accurate, and helpful answer in one paragraph.\n\
         If it's a legal question, mention what driving law or rule applies.",
        context, question
    )
}

fn build_chat_prompt(history: &[MessageRecord], context: &str, question: &str) -> String {
    let transcript = history
        .iter()
        .map(|m| format!("{}: {}", m.role.to_uppercase(), m.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Conversation History:\n\
         {}\n\
         \n\
         Context:\n\
         {}\n\
         \n\
         Question: {}\n\
         \n\
         Answer based on the context and conversation history. If unsure, say so.",
        transcript, context, question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::llm::FALLBACK_ANSWER;
    use crate::repositories::test_database;
    use crate::vectordb::sqlite::SqliteVectorStore;

    /// Records every prompt and answers with a canned reply.
    #[derive(Debug)]
    struct MockLlm {
        prompts: Mutex<Vec<String>>,
        reply: String,
    }

    impl MockLlm {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                prompts: Mutex::new(Vec::new()),
                reply: reply.to_string(),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlm {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    /// Constant-vector embedding: every text maps to the same unit vector, so
    /// similarity ties and retrieval order equals insertion order.
    #[derive(Debug)]
    struct MockEmbedding;

    #[async_trait]
    impl EmbeddingProvider for MockEmbedding {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
        }
    }

    async fn test_service(reply: &str, chat_includes_global: bool) -> (RagService, Arc<MockLlm>) {
        let db = test_database().await;
        let vectors = std::env::temp_dir().join(format!(
            "roadmate-rag-test-{}.db",
            Uuid::new_v4()
        ));
        let store = SqliteVectorStore::open(vectors).await.unwrap();

        let llm = MockLlm::new(reply);
        let settings = Settings {
            chat_includes_global,
            ..Settings::default()
        };

        let service = RagService::new(
            llm.clone(),
            Arc::new(MockEmbedding),
            Arc::new(store),
            &db,
            &settings,
        );
        (service, llm)
    }

    async fn seed_chunk(service: &RagService, id: &str, text: &str, conversation_id: &str) {
        service
            .vectordb
            .add_documents(
                &[text.to_string()],
                &[vec![1.0, 0.0, 0.0]],
                &[ChunkMetadata {
                    source: "seed.pdf".to_string(),
                    pdf_id: "pdf_seed".to_string(),
                    conversation_id: conversation_id.to_string(),
                }],
                &[id.to_string()],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn ingest_stores_one_chunk_per_split_with_stable_ids() {
        let (service, _) = test_service("ok", false).await;

        let text = "Always yield to pedestrians. ".repeat(100);
        let expected = service.processor.split_text(&text).len();

        let pdf_id = service
            .ingest_document("laws.pdf", b"%PDF", &text, Some("conv_1"))
            .await
            .unwrap();

        assert!(pdf_id.starts_with("pdf_"));
        assert_eq!(service.vectordb.count().await.unwrap(), expected);

        // Re-ingesting the same text under a new pdf_id adds distinct ids.
        let second = service
            .ingest_document("laws.pdf", b"%PDF", &text, Some("conv_1"))
            .await
            .unwrap();
        assert_ne!(pdf_id, second);
        assert_eq!(service.vectordb.count().await.unwrap(), expected * 2);
    }

    #[tokio::test]
    async fn ingest_rejects_documents_without_text() {
        let (service, _) = test_service("ok", false).await;

        let err = service
            .ingest_document("blank.pdf", b"%PDF", "   \n ", None)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::DocumentProcessing(_)));
        assert_eq!(service.vectordb.count().await.unwrap(), 0);
        assert_eq!(service.pdfs.count_all().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn uploaded_pdf_appears_in_the_right_listing() {
        let (service, _) = test_service("ok", false).await;

        let global_id = service
            .ingest_document("laws.pdf", b"%PDF", "Yield to the right.", None)
            .await
            .unwrap();
        let scoped_id = service
            .ingest_document("notes.pdf", b"%PDF", "Check tire pressure monthly.", Some("conv_1"))
            .await
            .unwrap();

        let global = service.pdfs.find_global().await.unwrap();
        assert_eq!(global.len(), 1);
        assert_eq!(global[0].pdf_id, global_id);

        let scoped = service.pdfs.find_by_conversation("conv_1").await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].pdf_id, scoped_id);

        // A global upload never shows up under a conversation.
        assert!(service
            .pdfs
            .find_by_conversation("conv_2")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn query_scope_includes_global_documents() {
        let (service, llm) = test_service("answer", false).await;

        seed_chunk(&service, "c_global", "global driving law text", "").await;
        seed_chunk(&service, "c_mine", "my conversation text", "conv_a").await;
        seed_chunk(&service, "c_other", "someone else's text", "conv_b").await;

        let answer = service.query("what?", Some("conv_a"), 10).await.unwrap();
        assert_eq!(answer, "answer");

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("global driving law text"));
        assert!(prompts[0].contains("my conversation text"));
        assert!(!prompts[0].contains("someone else's text"));
    }

    #[tokio::test]
    async fn query_without_scope_sees_everything() {
        let (service, llm) = test_service("answer", false).await;

        seed_chunk(&service, "c1", "alpha text", "conv_a").await;
        seed_chunk(&service, "c2", "beta text", "conv_b").await;

        service.query("what?", None, 10).await.unwrap();

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("alpha text"));
        assert!(prompt.contains("beta text"));
    }

    #[tokio::test]
    async fn chat_scope_excludes_global_documents_by_default() {
        let (service, llm) = test_service("reply", false).await;

        seed_chunk(&service, "c_global", "global driving law text", "").await;
        seed_chunk(&service, "c_mine", "my conversation text", "conv_a").await;

        let outcome = service.chat("conv_a", "hello", 10, 20).await.unwrap();
        assert_eq!(outcome.answer, "reply");

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("my conversation text"));
        // Stricter than query: global documents are filtered out.
        assert!(!prompt.contains("global driving law text"));
    }

    #[tokio::test]
    async fn chat_can_be_configured_to_include_globals() {
        let (service, llm) = test_service("reply", true).await;

        seed_chunk(&service, "c_global", "global driving law text", "").await;

        service.chat("conv_a", "hello", 10, 20).await.unwrap();
        assert!(llm.prompts()[0].contains("global driving law text"));
    }

    #[tokio::test]
    async fn chat_persists_both_turns_and_builds_history() {
        let (service, llm) = test_service("the reply", false).await;

        let first = service.chat("conv_a", "first question", 3, 20).await.unwrap();
        assert!(first.user_message_id < first.assistant_message_id);

        let second = service
            .chat("conv_a", "second question", 3, 20)
            .await
            .unwrap();
        assert_eq!(second.answer, "the reply");

        let history = service
            .messages
            .find_by_conversation("conv_a", 0)
            .await
            .unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[1].role, "assistant");

        // The second prompt carries the transcript of the first exchange.
        let prompt = &llm.prompts()[1];
        assert!(prompt.contains("USER: first question"));
        assert!(prompt.contains("ASSISTANT: the reply"));
        assert!(prompt.contains("Question: second question"));
    }

    #[tokio::test]
    async fn empty_retrieval_still_asks_the_model() {
        let (service, llm) = test_service(FALLBACK_ANSWER, false).await;

        seed_chunk(&service, "c_other", "someone else's text", "conv_b").await;

        let answer = service.query("what?", Some("conv_a"), 5).await.unwrap();
        assert_eq!(answer, FALLBACK_ANSWER);

        // The prompt was sent with an empty context block, not short-circuited.
        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Context:\n---\n\n---"));
    }

    #[tokio::test]
    async fn batch_upload_isolates_failures_in_input_order() {
        let (service, _) = test_service("ok", false).await;

        let dir = std::env::temp_dir();
        let paths = vec![
            dir.join(format!("missing-{}.pdf", Uuid::new_v4())),
            dir.join(format!("missing-{}.pdf", Uuid::new_v4())),
            dir.join(format!("missing-{}.pdf", Uuid::new_v4())),
        ];

        let results = service.upload_pdfs_batch(&paths, None).await;

        assert_eq!(results.len(), 3);
        for (result, path) in results.iter().zip(&paths) {
            assert_eq!(result.status, "failed");
            assert!(result.error.is_some());
            assert_eq!(
                result.filename,
                path.file_name().unwrap().to_string_lossy()
            );
        }
    }

    #[tokio::test]
    async fn statistics_are_idempotent_and_consistent() {
        let (service, _) = test_service("ok", false).await;

        service.conversations.create("conv_1", "t").await.unwrap();
        service
            .ingest_document("a.pdf", b"%PDF", "global text", None)
            .await
            .unwrap();
        service
            .ingest_document("b.pdf", b"%PDF", "scoped text", Some("conv_1"))
            .await
            .unwrap();

        let first = service.get_statistics().await.unwrap();
        let second = service.get_statistics().await.unwrap();
        assert_eq!(first, second);

        assert_eq!(first.total_conversations, 1);
        assert_eq!(first.total_pdfs, 2);
        assert_eq!(first.global_pdfs, 1);
        assert_eq!(first.conversation_pdfs, 1);
    }

    #[tokio::test]
    async fn delete_conversation_cascades_to_chunks_messages_and_pdfs() {
        let (service, _) = test_service("ok", false).await;

        service.conversations.create("conv_1", "t").await.unwrap();
        service.chat("conv_1", "hello", 3, 20).await.unwrap();
        service
            .ingest_document("a.pdf", b"%PDF", "scoped text", Some("conv_1"))
            .await
            .unwrap();

        service.delete_conversation("conv_1").await.unwrap();

        assert_eq!(service.vectordb.count().await.unwrap(), 0);
        assert_eq!(service.pdfs.count_all().await.unwrap(), 0);
        assert_eq!(
            service
                .messages
                .count_by_conversation("conv_1")
                .await
                .unwrap(),
            0
        );

        let err = service.delete_conversation("conv_1").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn orphaned_uploads_are_detectable_by_zero_chunk_count() {
        let (service, _) = test_service("ok", false).await;

        // Simulates the non-transactional gap: the record exists but the
        // vector upsert never happened.
        service
            .pdfs
            .create("pdf_orphan", "laws.pdf", b"%PDF", "")
            .await
            .unwrap();

        assert!(service.pdfs.find_by_id("pdf_orphan").await.unwrap().is_some());
        assert_eq!(service.count_chunks_for_pdf("pdf_orphan").await.unwrap(), 0);

        let healthy = service
            .ingest_document("ok.pdf", b"%PDF", "some indexed text", None)
            .await
            .unwrap();
        assert!(service.count_chunks_for_pdf(&healthy).await.unwrap() > 0);
    }

    #[tokio::test]
    async fn delete_pdf_removes_its_chunks() {
        let (service, _) = test_service("ok", false).await;

        let pdf_id = service
            .ingest_document("a.pdf", b"%PDF", "some global text", None)
            .await
            .unwrap();
        assert!(service.vectordb.count().await.unwrap() > 0);

        service.delete_pdf(&pdf_id).await.unwrap();
        assert_eq!(service.vectordb.count().await.unwrap(), 0);

        let err = service.delete_pdf(&pdf_id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
