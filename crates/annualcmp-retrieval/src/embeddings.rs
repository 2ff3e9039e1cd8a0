//! Text embeddings with a Gemini backend and a deterministic mock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use annualcmp_core::AppConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use crate::gemini::{GeminiClient, TaskType};
use crate::vector_index::l2_normalize;

#[derive(Debug, Clone)]
enum Backend {
    Gemini { client: GeminiClient, model: String },
    Mock,
}

/// Maps text to vectors of a fixed dimension.
///
/// Gemini failures never surface: the affected text gets its mock vector and
/// the call is logged, so a batch always returns one vector per input.
/// Mock vectors standing in for failed calls take the width Gemini actually
/// returned, so they always fit an index built from real embeddings.
#[derive(Debug, Clone)]
pub struct EmbeddingService {
    backend: Backend,
    dimension: usize,
    /// Width of the last successful Gemini embedding; 0 until one arrives.
    observed: Arc<AtomicUsize>,
}

impl EmbeddingService {
    /// A service that only produces mock vectors.
    #[must_use]
    pub fn mock(dimension: usize) -> Self {
        Self {
            backend: Backend::Mock,
            dimension: dimension.max(1),
            observed: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn gemini(client: GeminiClient, model: &str, dimension: usize) -> Self {
        Self {
            backend: Backend::Gemini {
                client,
                model: model.to_string(),
            },
            dimension: dimension.max(1),
            observed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Gemini when an API key is configured, otherwise mock.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        match GeminiClient::from_config(config) {
            Some(client) => Self::gemini(client, &config.embedding_model, config.embedding_dim),
            None => {
                tracing::warn!("GEMINI_API_KEY not set; embeddings use the deterministic mock");
                Self::mock(config.embedding_dim)
            }
        }
    }

    /// Whether the real embedding backend is configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self.backend, Backend::Gemini { .. })
    }

    /// Width of the vectors this service produces: what Gemini returned once
    /// a call has succeeded, the configured dimension before that.
    #[must_use]
    pub fn dimension(&self) -> usize {
        match self.observed.load(Ordering::Relaxed) {
            0 => self.dimension,
            width => width,
        }
    }

    /// One Gemini call; `None` for the mock backend or a failed call.
    async fn request(&self, text: &str, task_type: TaskType) -> Option<Vec<f32>> {
        let Backend::Gemini { client, model } = &self.backend else {
            return None;
        };
        match client.embed_content(model, text, task_type).await {
            Ok(vector) => {
                self.observed.store(vector.len(), Ordering::Relaxed);
                Some(vector)
            }
            Err(e) => {
                tracing::warn!(error = %e, ?task_type, "embedding request failed; using mock vector");
                None
            }
        }
    }

    pub async fn embed(&self, text: &str, task_type: TaskType) -> Vec<f32> {
        match self.request(text, task_type).await {
            Some(vector) => vector,
            None => mock_embedding(text, self.dimension()),
        }
    }

    pub async fn embed_query(&self, query: &str) -> Vec<f32> {
        self.embed(query, TaskType::RetrievalQuery).await
    }

    /// Embed documents one request at a time, preserving input order.
    ///
    /// Fallback vectors are sized once every request has been made, so a
    /// failure ahead of the first success still matches the Gemini width.
    pub async fn embed_batch(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.request(text, TaskType::RetrievalDocument).await);
        }

        let width = self.dimension();
        texts
            .iter()
            .zip(results)
            .map(|(text, vector)| vector.unwrap_or_else(|| mock_embedding(text, width)))
            .collect()
    }
}

/// Deterministic unit vector for `text`.
///
/// Seeded from the first eight bytes of the text's SHA-256 digest, so equal
/// texts give bit-identical vectors across runs and platforms.
#[must_use]
pub fn mock_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    let mut rng = StdRng::seed_from_u64(u64::from_be_bytes(seed));

    let mut vector: Vec<f32> = (0..dimension).map(|_| rng.random_range(-1.0..1.0)).collect();
    l2_normalize(&mut vector);
    vector
}
