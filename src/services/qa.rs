//! Question answering over one stored document.
//!
//! A request moves through `Received → Lookup → Chunk → Embed → Index →
//! Retrieve → Synthesize → Responded`. Any step can fail; [`QaError::failed_at`]
//! names the stage. Nothing is cached between requests.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{Instrument, debug, debug_span};

use super::chunker::TextChunker;
use super::document_store::DocumentStore;
use super::embedding::EmbeddingProvider;
use super::index::{ScoredChunk, VectorIndex};
use super::synthesizer::AnswerSynthesizer;
use crate::error::QaError;
use crate::models::{AskQuestionRequest, QueryResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QaStage {
    Received,
    Lookup,
    Chunk,
    Embed,
    Index,
    Retrieve,
    Synthesize,
    Responded,
}

impl fmt::Display for QaStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QaStage::Received => "received",
            QaStage::Lookup => "lookup",
            QaStage::Chunk => "chunk",
            QaStage::Embed => "embed",
            QaStage::Index => "index",
            QaStage::Retrieve => "retrieve",
            QaStage::Synthesize => "synthesize",
            QaStage::Responded => "responded",
        };
        f.write_str(name)
    }
}

/// The answer together with the chunks it was built from.
#[derive(Debug, Clone)]
pub struct QaAnswer {
    pub result: QueryResult,
    pub retrieved: Vec<ScoredChunk>,
}

#[derive(Clone)]
pub struct QaPipeline {
    documents: Arc<dyn DocumentStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    synthesizer: AnswerSynthesizer,
    chunker: TextChunker,
    top_k: usize,
}

impl QaPipeline {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        synthesizer: AnswerSynthesizer,
        chunker: TextChunker,
        top_k: usize,
    ) -> Self {
        Self {
            documents,
            embedder,
            synthesizer,
            chunker,
            top_k,
        }
    }

    pub async fn answer(&self, request: &AskQuestionRequest) -> Result<QaAnswer, QaError> {
        let span = debug_span!("ask_question", filename = %request.filename);
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &AskQuestionRequest) -> Result<QaAnswer, QaError> {
        debug!(stage = %QaStage::Received);
        if request.filename.trim().is_empty() {
            return Err(QaError::InvalidRequest("filename must not be blank".into()));
        }
        if request.question.trim().is_empty() {
            return Err(QaError::InvalidRequest("question must not be blank".into()));
        }

        debug!(stage = %QaStage::Lookup);
        let document = self
            .documents
            .find_by_filename(&request.filename)
            .await?
            .ok_or_else(|| QaError::DocumentNotFound(request.filename.clone()))?;

        debug!(stage = %QaStage::Chunk, characters = document.text.chars().count());
        let chunks = self.chunker.split(&document.text);
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();

        debug!(stage = %QaStage::Embed, chunks = chunks.len());
        let vectors = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed_documents(&texts).await?
        };

        debug!(stage = %QaStage::Index);
        let index = VectorIndex::build(chunks, vectors)?;

        debug!(stage = %QaStage::Retrieve, top_k = self.top_k);
        let retrieved = if index.is_empty() {
            Vec::new()
        } else {
            let query = self.embedder.embed_query(&request.question).await?;
            index.search(&query, self.top_k)?
        };

        debug!(stage = %QaStage::Synthesize, context = retrieved.len());
        let answer = self
            .synthesizer
            .synthesize(&request.question, &retrieved)
            .await?;

        debug!(stage = %QaStage::Responded, answer_chars = answer.chars().count());
        Ok(QaAnswer {
            result: QueryResult {
                question: request.question.clone(),
                answer,
            },
            retrieved,
        })
    }
}
