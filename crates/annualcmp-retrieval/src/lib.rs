//! Semantic retrieval over parsed annual reports.
//!
//! Reports are cut into chunks, embedded through Gemini (or a deterministic
//! mock), indexed for exact inner-product search, and queried across
//! companies with one generated answer per company.

pub mod answer;
pub mod chunker;
pub mod embeddings;
pub mod error;
pub mod gemini;
pub mod orchestrator;
pub mod vector_index;

pub use answer::{AnswerGenerator, QueryResponse};
pub use chunker::chunk_report;
pub use embeddings::{mock_embedding, EmbeddingService};
pub use error::RetrievalError;
pub use gemini::{GeminiClient, TaskType};
pub use orchestrator::{company_of, SemanticSearchEngine};
pub use vector_index::{SearchHit, VectorIndex};
