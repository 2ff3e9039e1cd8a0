//! Annual-report extraction for `annualcmp`.
//!
//! Reads text-layer PDFs into ordered sections, picks out the three primary
//! financial statements, pulls canonical figures from them with keyword
//! heuristics and derives financial ratios from those figures.

pub mod classifier;
pub mod error;
pub mod figures;
pub mod ocr;
pub mod parser;
pub mod pipeline;
pub mod ratios;

mod layout;
mod tables;

pub use classifier::{classify, StatementKind, Statements};
pub use error::ParseError;
pub use ocr::{available_providers, OcrProvider, OcrResult, OcrService};
pub use parser::DocumentParser;
pub use pipeline::{process_pdf, process_report, ProcessedDocument};
pub use ratios::{metrics_in_category, RatioDefinition, RATIO_CATALOG};
