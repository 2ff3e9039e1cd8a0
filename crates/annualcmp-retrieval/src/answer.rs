//! Per-company answers grounded in retrieved report excerpts.

use annualcmp_core::AppConfig;
use serde::Serialize;

use crate::gemini::GeminiClient;
use crate::vector_index::SearchHit;

/// Excerpts embedded in one prompt.
pub const MAX_CONTEXT_CHUNKS: usize = 3;
/// Characters kept from each excerpt.
pub const MAX_EXCERPT_CHARS: usize = 500;

const GEMINI_CONFIDENCE: f32 = 0.8;
const MOCK_CONFIDENCE: f32 = 0.6;

const UNAVAILABLE_ANSWER: &str =
    "Answer generation is unavailable; set GEMINI_API_KEY to enable it.";

/// One company's answer to a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub company: String,
    pub query: String,
    pub answer: String,
    /// Page references of the context excerpts, first-seen order, no repeats.
    pub sources: Vec<String>,
    pub confidence: f32,
}

#[derive(Debug, Clone)]
enum Backend {
    Gemini { client: GeminiClient, model: String },
    Mock,
    Unavailable,
}

/// Produces [`QueryResponse`]s. Never fails: every problem becomes a
/// placeholder answer with zero confidence.
#[derive(Debug, Clone)]
pub struct AnswerGenerator {
    backend: Backend,
}

impl AnswerGenerator {
    #[must_use]
    pub fn gemini(client: GeminiClient, model: &str) -> Self {
        Self {
            backend: Backend::Gemini {
                client,
                model: model.to_string(),
            },
        }
    }

    /// Deterministic simulated answers, for demos and tests without an API key.
    #[must_use]
    pub fn mock() -> Self {
        Self { backend: Backend::Mock }
    }

    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            backend: Backend::Unavailable,
        }
    }

    /// Gemini when an API key is configured; otherwise mock if `use_mock`,
    /// else unavailable.
    #[must_use]
    pub fn from_config(config: &AppConfig, use_mock: bool) -> Self {
        match GeminiClient::from_config(config) {
            Some(client) => Self::gemini(client, &config.generation_model),
            None if use_mock => Self::mock(),
            None => {
                tracing::warn!("GEMINI_API_KEY not set; answers are unavailable");
                Self::unavailable()
            }
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.backend, Backend::Unavailable)
    }

    pub async fn generate_company_answer(
        &self,
        company: &str,
        query: &str,
        context: &[SearchHit],
    ) -> QueryResponse {
        let respond = |answer: String, sources: Vec<String>, confidence: f32| QueryResponse {
            company: company.to_string(),
            query: query.to_string(),
            answer,
            sources,
            confidence,
        };

        match &self.backend {
            Backend::Unavailable => respond(UNAVAILABLE_ANSWER.to_string(), Vec::new(), 0.0),
            Backend::Mock => respond(
                format!(
                    "Based on the report excerpts provided, {company}'s position on \"{query}\" is as follows: \
                     [simulated answer; configure GEMINI_API_KEY for generated answers]"
                ),
                unique_sources(context),
                MOCK_CONFIDENCE,
            ),
            Backend::Gemini { client, model } => {
                let prompt = build_prompt(company, query, context);
                match client.generate_content(model, &prompt).await {
                    Ok(text) => respond(text, unique_sources(context), GEMINI_CONFIDENCE),
                    Err(e) => {
                        tracing::warn!(company, error = %e, "answer generation failed");
                        respond(format!("Failed to generate an answer: {e}"), Vec::new(), 0.0)
                    }
                }
            }
        }
    }
}

/// The analyst prompt for one company.
///
/// Holds at most [`MAX_CONTEXT_CHUNKS`] excerpts, each cut to
/// [`MAX_EXCERPT_CHARS`] characters.
#[must_use]
pub fn build_prompt(company: &str, query: &str, context: &[SearchHit]) -> String {
    let excerpts = context
        .iter()
        .take(MAX_CONTEXT_CHUNKS)
        .map(|hit| hit.text.chars().take(MAX_EXCERPT_CHARS).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a professional financial analyst. Answer the question about {company} \
         using the annual report excerpts below.\n\n\
         Question: {query}\n\n\
         Report excerpts:\n{excerpts}\n\n\
         Answer concisely and professionally. If the excerpts do not contain enough \
         information, say so explicitly."
    )
}

fn unique_sources(context: &[SearchHit]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for hit in context {
        if !sources.contains(&hit.page_ref) {
            sources.push(hit.page_ref.clone());
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use annualcmp_core::SectionType;

    use super::*;

    fn hit(page_ref: &str, text: &str) -> SearchHit {
        SearchHit {
            chunk_id: format!("Acme_2024_{page_ref}"),
            text: text.to_string(),
            page_ref: page_ref.to_string(),
            doc_id: "Acme_2024".to_string(),
            similarity_score: 0.5,
            section_type: SectionType::Text,
        }
    }

    #[test]
    fn prompt_uses_at_most_three_truncated_excerpts() {
        let long = "x".repeat(800);
        let context = vec![
            hit("p.1", &long),
            hit("p.2", "second"),
            hit("p.3", "third"),
            hit("p.4", "fourth"),
        ];
        let prompt = build_prompt("Acme", "How did revenue change?", &context);
        assert!(prompt.contains(&"x".repeat(500)));
        assert!(!prompt.contains(&"x".repeat(501)));
        assert!(prompt.contains("third"));
        assert!(!prompt.contains("fourth"));
        assert!(prompt.contains("Question: How did revenue change?"));
        assert!(prompt.contains("about Acme"));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let context = vec![hit("p.1", &"營".repeat(600))];
        let prompt = build_prompt("Acme", "q", &context);
        assert!(prompt.contains(&"營".repeat(500)));
        assert!(!prompt.contains(&"營".repeat(501)));
    }

    #[test]
    fn sources_are_deduplicated_in_first_seen_order() {
        let context = vec![hit("p.4", "a"), hit("p.2", "b"), hit("p.4", "c")];
        assert_eq!(unique_sources(&context), vec!["p.4", "p.2"]);
    }

    #[tokio::test]
    async fn unavailable_backend_returns_placeholder() {
        let response = AnswerGenerator::unavailable()
            .generate_company_answer("Acme", "q", &[hit("p.1", "a")])
            .await;
        assert_eq!(response.answer, UNAVAILABLE_ANSWER);
        assert!(response.sources.is_empty());
        assert!(response.confidence.abs() < f32::EPSILON);
        assert_eq!(response.company, "Acme");
    }

    #[tokio::test]
    async fn mock_backend_is_deterministic() {
        let generator = AnswerGenerator::mock();
        let context = [hit("p.7", "a"), hit("p.7", "b")];
        let first = generator.generate_company_answer("Acme", "debt", &context).await;
        let second = generator.generate_company_answer("Acme", "debt", &context).await;
        assert_eq!(first, second);
        assert!(first.answer.contains("simulated"));
        assert_eq!(first.sources, vec!["p.7"]);
        assert!((first.confidence - 0.6).abs() < f32::EPSILON);
    }
}
