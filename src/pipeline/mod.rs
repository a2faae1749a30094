
use std::collections::BTreeMap;
use std::path::PathBuf;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chunking::split_documents;
use crate::config::Config;
use crate::document::{Document, INLINE_SOURCE, SOURCE_KEY, ScoredRecord, VectorRecord};
use crate::extract::load_pdf;
use crate::ollama::OllamaClient;
use crate::store::{ActiveStore, select_backend};
use crate::{ChatError, Result};

/// Provenance lists are capped at this many distinct sources.
const MAX_SOURCES: usize = 10;

/// System prompt enforcing strict grounding on the retrieved context.
const GROUNDING_PROMPT: &str = "You are a helpful assistant that answers questions using ONLY the \
supplied context. If the answer is only partially present in the context, state what is known and \
what is not. If the answer is not in the context at all, say that you don't know based on the \
available documents. Never invent information that is not in the context.";

/// Returned instead of a generated answer when retrieval finds nothing.
const NO_CONTEXT_MESSAGE: &str = "No relevant content has been indexed yet. Ingest documents \
before asking questions about them.";

/// One inline document in an ingestion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineDoc {
    pub content: String,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

/// An ingestion batch: inline documents, PDF paths, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    #[serde(default)]
    pub docs: Vec<InlineDoc>,
    #[serde(default)]
    pub pdf_paths: Vec<PathBuf>,
}

/// Outcome of an ingestion batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub success: bool,
    pub message: String,
    pub chunks_added: usize,
    pub documents_processed: usize,
    pub pdfs_processed: usize,
}

/// Answer to one question, with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    pub success: bool,
    pub answer: String,
    pub sources: Vec<String>,
    pub context_count: usize,
}

/// Current pipeline state for health reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub backend: String,
    pub records: u64,
    pub ollama_reachable: bool,
    pub fallback_reason: Option<String>,
}

/// The ingestion and query orchestrator.
///
/// Owns the Ollama client and the lazily selected vector store. Store
/// selection happens on first use behind a single-flight guard, so racing
/// first requests cannot double-initialize or observe a partially
/// initialized store. The selection is terminal for the process lifetime.
pub struct ChatPipeline {
    config: Config,
    ollama: OllamaClient,
    store: OnceCell<ActiveStore>,
}

impl ChatPipeline {
    #[inline]
    pub fn new(config: Config) -> Result<Self> {
        let ollama = OllamaClient::new(&config.ollama)?;
        Ok(Self {
            config,
            ollama,
            store: OnceCell::new(),
        })
    }

    /// The active store, selecting a backend on first use.
    fn active_store(&self) -> Result<&ActiveStore> {
        self.store.get_or_try_init(|| select_backend(&self.config))
    }

    /// Ingest a batch of inline documents and/or PDF files: normalize,
    /// chunk, embed, store.
    ///
    /// A PDF that cannot be read aborts the whole batch; nothing from the
    /// batch is stored in that case.
    #[inline]
    pub fn ingest(&self, request: &IngestRequest) -> Result<IngestReport> {
        if request.docs.is_empty() && request.pdf_paths.is_empty() {
            return Err(ChatError::Validation(
                "At least one document or PDF path is required".to_string(),
            ));
        }

        let mut documents = Vec::new();

        for doc in &request.docs {
            let mut metadata = doc.meta.clone();
            metadata
                .entry(SOURCE_KEY.to_string())
                .or_insert_with(|| INLINE_SOURCE.to_string());
            documents.push(Document {
                content: doc.content.clone(),
                metadata,
            });
        }

        let pdfs_processed = request.pdf_paths.len();
        for path in &request.pdf_paths {
            documents.push(load_pdf(path)?);
        }

        let documents_processed = documents.len();
        let chunks = split_documents(&documents, &self.config.chunking);

        let store = self.active_store()?;

        let chunks_added = if chunks.is_empty() {
            0
        } else {
            let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.ollama.embed_batch(&texts)?;

            let records: Vec<VectorRecord> = chunks
                .into_iter()
                .zip(embeddings)
                .map(|(chunk, vector)| VectorRecord::from_chunk(chunk, vector))
                .collect();
            let count = records.len();

            store.store.add(records)?;
            count
        };

        info!(
            backend = store.store.name(),
            chunks_added,
            documents_processed,
            pdfs_processed,
            success = true,
            "ingest complete"
        );

        Ok(IngestReport {
            success: true,
            message: format!(
                "Added {} chunks from {} documents",
                chunks_added, documents_processed
            ),
            chunks_added,
            documents_processed,
            pdfs_processed,
        })
    }

    /// Answer a question from the ingested corpus.
    ///
    /// An empty question is rejected before any external service is
    /// called. An empty retrieval produces the no-context response rather
    /// than invoking the generation model.
    #[inline]
    pub fn ask(&self, question: &str) -> Result<AskResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::Validation(
                "Question cannot be empty".to_string(),
            ));
        }

        let store = self.active_store()?;

        let query_vector = self.ollama.embed_one(question)?;
        let results = store.store.query(&query_vector, self.config.top_k)?;

        if results.is_empty() {
            info!(
                backend = store.store.name(),
                context_count = 0usize,
                success = false,
                "ask found no context"
            );
            return Ok(AskResponse {
                success: false,
                answer: NO_CONTEXT_MESSAGE.to_string(),
                sources: Vec::new(),
                context_count: 0,
            });
        }

        debug!("Retrieved {} context chunks", results.len());

        let user_turn = build_user_turn(question, &results);
        let answer = self.ollama.generate(GROUNDING_PROMPT, &user_turn)?;
        let sources = attribute_sources(&results);

        info!(
            backend = store.store.name(),
            context_count = results.len(),
            success = true,
            "ask complete"
        );

        Ok(AskResponse {
            success: true,
            answer,
            sources,
            context_count: results.len(),
        })
    }

    /// Report the active backend, stored record count, and whether the
    /// model service answers its health check.
    #[inline]
    pub fn status(&self) -> Result<StatusReport> {
        let store = self.active_store()?;
        Ok(StatusReport {
            backend: store.backend.as_str().to_string(),
            records: store.store.count()?,
            ollama_reachable: self.ollama.ping().is_ok(),
            fallback_reason: store.fallback_reason.clone(),
        })
    }
}

/// Assemble the user turn: the retrieved chunk texts followed by the
/// literal question.
fn build_user_turn(question: &str, results: &[ScoredRecord]) -> String {
    let context = results
        .iter()
        .map(|r| r.record.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    format!("Context:\n{}\n\nQuestion: {}", context, question)
}

/// Extract each retrieved chunk's source, dropping empty or missing
/// entries, deduplicating in first-seen order, and capping the list.
fn attribute_sources(results: &[ScoredRecord]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut sources = Vec::new();

    for result in results {
        let Some(source) = result.record.source() else {
            continue;
        };
        let source = source.trim();
        if source.is_empty() {
            continue;
        }
        if seen.insert(source.to_string()) {
            sources.push(source.to_string());
            if sources.len() == MAX_SOURCES {
                break;
            }
        }
    }

    sources
}
