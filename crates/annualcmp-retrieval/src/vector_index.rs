//! Exact inner-product search over normalised chunk embeddings.

use annualcmp_core::{Chunk, SectionType};
use serde::Serialize;

use crate::embeddings::EmbeddingService;
use crate::error::RetrievalError;

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub chunk_id: String,
    pub text: String,
    pub page_ref: String,
    pub doc_id: String,
    pub similarity_score: f32,
    pub section_type: SectionType,
}

impl SearchHit {
    fn from_chunk(chunk: &Chunk, score: f32) -> Self {
        Self {
            chunk_id: chunk.chunk_id.clone(),
            text: chunk.text.clone(),
            page_ref: chunk.page_ref.clone(),
            doc_id: chunk.doc_id.clone(),
            similarity_score: score,
            section_type: chunk.section_type,
        }
    }
}

/// Scale `vector` to unit L2 norm in place. Zero vectors are left as is.
pub(crate) fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Chunks and their unit vectors, row `i` of `vectors` belonging to `chunks[i]`.
///
/// Rebuilt wholesale; there is no incremental insert or delete.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    dimension: usize,
}

impl VectorIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Embed `chunks` and replace the index contents with them.
    ///
    /// Returns the number of indexed chunks.
    ///
    /// # Errors
    ///
    /// See [`VectorIndex::load`]. The previous contents survive any error.
    pub async fn build(
        &mut self,
        chunks: Vec<Chunk>,
        embedder: &EmbeddingService,
    ) -> Result<usize, RetrievalError> {
        if chunks.is_empty() {
            tracing::warn!("no chunks to index");
            return Err(RetrievalError::EmptyIndex);
        }

        tracing::info!(chunks = chunks.len(), "building vector index");
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = embedder.embed_batch(&texts).await;
        self.load(chunks.into_iter().zip(vectors).collect())
    }

    /// Replace the index contents with pre-computed vectors.
    ///
    /// Vectors are normalised on the way in. The dimension is fixed by the
    /// first entry.
    ///
    /// # Errors
    ///
    /// - [`RetrievalError::EmptyIndex`] if `entries` is empty.
    /// - [`RetrievalError::DimensionMismatch`] if any vector's width differs
    ///   from the first.
    pub fn load(&mut self, entries: Vec<(Chunk, Vec<f32>)>) -> Result<usize, RetrievalError> {
        let Some(dimension) = entries.first().map(|(_, v)| v.len()) else {
            return Err(RetrievalError::EmptyIndex);
        };
        if let Some((chunk, vector)) = entries.iter().find(|(_, v)| v.len() != dimension) {
            return Err(RetrievalError::DimensionMismatch {
                expected: dimension,
                got: vector.len(),
                chunk_id: chunk.chunk_id.clone(),
            });
        }

        let (chunks, mut vectors): (Vec<Chunk>, Vec<Vec<f32>>) = entries.into_iter().unzip();
        for vector in &mut vectors {
            l2_normalize(vector);
        }

        self.chunks = chunks;
        self.vectors = vectors;
        self.dimension = dimension;
        tracing::info!(chunks = self.chunks.len(), dimension, "vector index ready");
        Ok(self.chunks.len())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Whether a build has succeeded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.chunks.is_empty()
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed `query` and return its nearest chunks.
    pub async fn search(&self, query: &str, top_k: usize, embedder: &EmbeddingService) -> Vec<SearchHit> {
        if !self.is_ready() {
            tracing::warn!("search before the vector index was built");
            return Vec::new();
        }
        let vector = embedder.embed_query(query).await;
        self.search_by_vector(&vector, top_k)
    }

    /// The `top_k` chunks most similar to `query`, best first.
    ///
    /// At most `min(top_k, len)` hits come back. Equal scores keep insertion
    /// order. A query of the wrong width yields no hits.
    #[must_use]
    pub fn search_by_vector(&self, query: &[f32], top_k: usize) -> Vec<SearchHit> {
        if !self.is_ready() {
            tracing::warn!("search before the vector index was built");
            return Vec::new();
        }
        if query.len() != self.dimension {
            tracing::warn!(
                expected = self.dimension,
                got = query.len(),
                "query vector width does not match index"
            );
            return Vec::new();
        }

        let mut query = query.to_vec();
        l2_normalize(&mut query);

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, dot(&query, v)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k.min(self.chunks.len()));

        scored
            .into_iter()
            .filter_map(|(i, score)| self.chunks.get(i).map(|c| SearchHit::from_chunk(c, score)))
            .collect()
    }
}

#[cfg(test)]
#[path = "vector_index_test.rs"]
mod tests;
