//! Cross-company semantic search and answering.

use std::collections::BTreeMap;

use annualcmp_core::{AppConfig, Chunk, Report};
use tokio::sync::RwLock;

use crate::answer::{AnswerGenerator, QueryResponse};
use crate::chunker::chunk_report;
use crate::embeddings::EmbeddingService;
use crate::error::RetrievalError;
use crate::vector_index::{SearchHit, VectorIndex};

/// Group key for hits whose `doc_id` names no company.
pub const UNKNOWN_GROUP: &str = "unknown";

/// Company token of a `{company}_{year}` document id: the text before the
/// first underscore, or the whole id when it has none.
///
/// Company names that themselves contain `_` are cut at the first one. An id
/// with nothing before its first underscore, or an empty id, is [`UNKNOWN_GROUP`].
#[must_use]
pub fn company_of(doc_id: &str) -> &str {
    match doc_id.split('_').next() {
        Some(company) if !company.is_empty() => company,
        _ => UNKNOWN_GROUP,
    }
}

/// One search index shared by every report in a session.
///
/// Searches take the index read lock; a rebuild embeds everything first and
/// only takes the write lock to swap the finished index in.
#[derive(Debug)]
pub struct SemanticSearchEngine {
    embedder: EmbeddingService,
    answers: AnswerGenerator,
    chunk_size: usize,
    index: RwLock<VectorIndex>,
}

impl SemanticSearchEngine {
    #[must_use]
    pub fn new(embedder: EmbeddingService, answers: AnswerGenerator, chunk_size: usize) -> Self {
        Self {
            embedder,
            answers,
            chunk_size,
            index: RwLock::new(VectorIndex::new()),
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig, use_mock_answers: bool) -> Self {
        Self::new(
            EmbeddingService::from_config(config),
            AnswerGenerator::from_config(config, use_mock_answers),
            config.chunk_size,
        )
    }

    /// Chunk every report and rebuild the index from the result.
    ///
    /// Returns the number of indexed chunks.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::EmptyIndex`] when the reports yield no chunks, or
    /// [`RetrievalError::DimensionMismatch`] when embeddings disagree in width.
    /// The previous index stays in place on error.
    pub async fn initialize_from_reports(&self, reports: &[Report]) -> Result<usize, RetrievalError> {
        let chunks: Vec<Chunk> = reports
            .iter()
            .flat_map(|r| chunk_report(r, self.chunk_size))
            .collect();
        tracing::info!(reports = reports.len(), chunks = chunks.len(), "initializing search index");

        let mut fresh = VectorIndex::new();
        let count = fresh.build(chunks, &self.embedder).await?;
        *self.index.write().await = fresh;
        Ok(count)
    }

    pub async fn is_ready(&self) -> bool {
        self.index.read().await.is_ready()
    }

    pub async fn indexed_chunks(&self) -> usize {
        self.index.read().await.len()
    }

    /// Run one search and group the hits by company.
    ///
    /// Within a company, hits keep their global rank order. Empty when the
    /// index has not been built, in which case the query is never embedded.
    pub async fn search_semantic(&self, query: &str, top_k: usize) -> BTreeMap<String, Vec<SearchHit>> {
        if !self.index.read().await.is_ready() {
            tracing::warn!(query, "search index not ready");
            return BTreeMap::new();
        }

        let vector = self.embedder.embed_query(query).await;
        let hits = self.index.read().await.search_by_vector(&vector, top_k);
        tracing::info!(query, hits = hits.len(), "semantic search");

        let mut grouped: BTreeMap<String, Vec<SearchHit>> = BTreeMap::new();
        for hit in hits {
            grouped
                .entry(company_of(&hit.doc_id).to_string())
                .or_default()
                .push(hit);
        }
        grouped
    }

    pub async fn generate_company_answer(
        &self,
        company: &str,
        query: &str,
        context: &[SearchHit],
    ) -> QueryResponse {
        self.answers.generate_company_answer(company, query, context).await
    }

    /// Search, then answer once per company that has hits, in company order.
    pub async fn answer_all(&self, query: &str, top_k: usize) -> Vec<QueryResponse> {
        let grouped = self.search_semantic(query, top_k).await;
        let mut responses = Vec::with_capacity(grouped.len());
        for (company, hits) in &grouped {
            responses.push(self.generate_company_answer(company, query, hits).await);
        }
        responses
    }
}

#[cfg(test)]
mod tests {
    use annualcmp_core::Section;

    use super::*;

    const FILLER: &str = "the group reported steady progress across its business lines this year";

    fn report(company: &str, pages: &[&str]) -> Report {
        let sections = pages
            .iter()
            .zip(1u32..)
            .map(|(text, page)| Section::text(page, format!("{text} {FILLER}")))
            .collect();
        Report::new(company, 2024, "", sections)
    }

    fn engine() -> SemanticSearchEngine {
        SemanticSearchEngine::new(EmbeddingService::mock(64), AnswerGenerator::mock(), 500)
    }

    #[test]
    fn company_token_is_text_before_first_underscore() {
        assert_eq!(company_of("Acme_2024"), "Acme");
        assert_eq!(company_of("Acme_Holdings_2024"), "Acme");
        assert_eq!(company_of("台積電_2024"), "台積電");
    }

    #[test]
    fn id_without_underscore_is_its_own_company() {
        assert_eq!(company_of("Acme2024"), "Acme2024");
    }

    #[test]
    fn ids_without_a_company_group_under_unknown() {
        assert_eq!(company_of(""), UNKNOWN_GROUP);
        assert_eq!(company_of("_2024"), UNKNOWN_GROUP);
    }

    #[tokio::test]
    async fn search_before_initialization_is_empty() {
        let engine = engine();
        assert!(!engine.is_ready().await);
        assert!(engine.search_semantic("revenue", 5).await.is_empty());
        assert!(engine.answer_all("revenue", 5).await.is_empty());
    }

    #[tokio::test]
    async fn initialization_indexes_all_reports() {
        let engine = engine();
        let reports = vec![report("Acme", &["one", "two"]), report("Beta", &["three"])];
        let count = engine.initialize_from_reports(&reports).await.expect("index");
        assert_eq!(count, 3);
        assert_eq!(engine.indexed_chunks().await, 3);
        assert!(engine.is_ready().await);
    }

    #[tokio::test]
    async fn results_are_grouped_by_company() {
        let engine = engine();
        let reports = vec![report("Acme", &["one", "two"]), report("Beta", &["three"])];
        engine.initialize_from_reports(&reports).await.expect("index");

        let grouped = engine.search_semantic("anything", 10).await;
        assert_eq!(grouped.keys().collect::<Vec<_>>(), vec!["Acme", "Beta"]);
        assert_eq!(grouped["Acme"].len(), 2);
        assert_eq!(grouped["Beta"].len(), 1);
        assert!(grouped["Acme"]
            .windows(2)
            .all(|w| w[0].similarity_score >= w[1].similarity_score));
    }

    #[tokio::test]
    async fn empty_rebuild_keeps_previous_index() {
        let engine = engine();
        engine
            .initialize_from_reports(&[report("Acme", &["one"])])
            .await
            .expect("index");

        let result = engine.initialize_from_reports(&[]).await;
        assert!(matches!(result, Err(RetrievalError::EmptyIndex)));
        assert_eq!(engine.indexed_chunks().await, 1);
    }

    #[tokio::test]
    async fn answer_all_answers_once_per_company() {
        let engine = engine();
        let reports = vec![report("Acme", &["one", "two"]), report("Beta", &["three"])];
        engine.initialize_from_reports(&reports).await.expect("index");

        let answers = engine.answer_all("revenue", 10).await;
        let companies: Vec<&str> = answers.iter().map(|a| a.company.as_str()).collect();
        assert_eq!(companies, vec!["Acme", "Beta"]);
        assert_eq!(answers[0].sources.len(), 2);
        assert_eq!(answers[1].sources, vec!["p.1"]);
    }
}
