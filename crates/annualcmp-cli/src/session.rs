//! One comparison workflow: the documents processed so far and the search
//! index built over them.

use std::collections::BTreeMap;
use std::path::PathBuf;

use annualcmp_core::{AppConfig, CompanyMetrics, Figures, Report};
use annualcmp_extract::{process_pdf, DocumentParser, OcrService, ProcessedDocument};
use annualcmp_retrieval::{QueryResponse, RetrievalError, SearchHit, SemanticSearchEngine};
use futures::future::join_all;
use serde::Serialize;

/// One PDF to process.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DocumentInput {
    pub path: PathBuf,
    /// Empty to derive the company name from the report.
    pub company_hint: String,
    pub fiscal_year: i32,
}

/// A document without a text layer, reported through the OCR service.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct OcrNotice {
    pub path: String,
    pub provider: String,
    pub confidence: f32,
    pub message: String,
}

/// What extraction found in one document.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ExtractedDocument {
    pub report_id: String,
    pub sections: usize,
    pub tables: usize,
    pub figures: Figures,
    pub metrics: CompanyMetrics,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct IngestSummary {
    pub processed: usize,
    /// Paths whose processing task died.
    pub failed: Vec<String>,
    pub ocr_notices: Vec<OcrNotice>,
}

pub(crate) struct Session {
    engine: SemanticSearchEngine,
    ocr: OcrService,
    reports: Vec<Report>,
    extracted: Vec<ExtractedDocument>,
}

impl Session {
    pub(crate) fn new(engine: SemanticSearchEngine, ocr: OcrService) -> Self {
        Self {
            engine,
            ocr,
            reports: Vec::new(),
            extracted: Vec::new(),
        }
    }

    pub(crate) fn from_config(config: &AppConfig, mock_answers: bool) -> Self {
        Self::new(
            SemanticSearchEngine::from_config(config, mock_answers),
            OcrService::from_env(),
        )
    }

    /// Process documents in parallel on the blocking pool.
    ///
    /// Results are appended in input order. A document whose task fails is
    /// recorded in the summary and never affects its siblings.
    pub(crate) async fn ingest(&mut self, inputs: Vec<DocumentInput>) -> IngestSummary {
        let tasks = inputs.into_iter().map(|input| {
            let ocr = self.ocr.clone();
            let label = input.path.display().to_string();
            let handle = tokio::task::spawn_blocking(move || process_document(&input, &ocr));
            async move { (label, handle.await) }
        });
        let results = join_all(tasks).await;

        let mut summary = IngestSummary::default();
        for (label, result) in results {
            match result {
                Ok((document, notice)) => {
                    summary.processed += 1;
                    summary.ocr_notices.extend(notice);
                    self.add(document);
                }
                Err(e) => {
                    tracing::error!(path = %label, error = %e, "document processing task failed");
                    summary.failed.push(label);
                }
            }
        }

        tracing::info!(
            processed = summary.processed,
            failed = summary.failed.len(),
            needs_ocr = summary.ocr_notices.len(),
            "ingest complete"
        );
        summary
    }

    fn add(&mut self, document: ProcessedDocument) {
        let ProcessedDocument {
            report,
            figures,
            metrics,
        } = document;
        self.extracted.push(ExtractedDocument {
            report_id: report.report_id.clone(),
            sections: report.sections.len(),
            tables: report.tables().count(),
            figures,
            metrics,
        });
        self.reports.push(report);
    }

    pub(crate) fn extracted(&self) -> &[ExtractedDocument] {
        &self.extracted
    }

    /// Rebuild the search index over every report processed so far.
    ///
    /// # Errors
    ///
    /// Propagates [`RetrievalError`] from the index build; the previous index
    /// is kept.
    pub(crate) async fn build_index(&self) -> Result<usize, RetrievalError> {
        self.engine.initialize_from_reports(&self.reports).await
    }

    pub(crate) async fn search(&self, query: &str, top_k: usize) -> BTreeMap<String, Vec<SearchHit>> {
        self.engine.search_semantic(query, top_k).await
    }

    pub(crate) async fn ask(&self, query: &str, top_k: usize) -> Vec<QueryResponse> {
        self.engine.answer_all(query, top_k).await
    }
}

/// Extract one document, noting when it has no text layer.
fn process_document(input: &DocumentInput, ocr: &OcrService) -> (ProcessedDocument, Option<OcrNotice>) {
    let scanned = input.path.is_file() && !DocumentParser::new().detect_text_layer(&input.path);
    let notice = scanned.then(|| {
        let result = ocr.extract_page(1);
        tracing::warn!(
            path = %input.path.display(),
            provider = %result.provider,
            "no text layer; figures need OCR"
        );
        OcrNotice {
            path: input.path.display().to_string(),
            provider: result.provider,
            confidence: result.confidence,
            message: result.text,
        }
    });

    (process_pdf(&input.path, &input.company_hint, input.fiscal_year), notice)
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
