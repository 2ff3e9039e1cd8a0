//! Structural PDF reader: pages in, ordered sections out.

use std::path::Path;

use annualcmp_core::{Report, Section, SectionType, UNKNOWN_COMPANY};
use lopdf::{Document, ObjectId};

use crate::error::ParseError;
use crate::layout;
use crate::tables::{detect_tables, render_table};

/// Stripped text shorter than this does not produce a text section.
const MIN_TEXT_SECTION_CHARS: usize = 20;

/// A page with more stripped text than this counts as having a text layer.
const TEXT_LAYER_MIN_CHARS: usize = 50;

/// Pages inspected by [`DocumentParser::detect_text_layer`].
const TEXT_LAYER_PROBE_PAGES: usize = 3;

/// Leading sections, and lines within each, searched for a company name.
const COMPANY_SCAN_SECTIONS: usize = 5;
const COMPANY_SCAN_LINES: usize = 10;

/// Corporate-suffix markers that identify a company name line.
const COMPANY_MARKERS: &[&str] = &["股份有限公司", "Corporation", "Inc.", "Ltd", "公司"];

/// Currency markers, checked per text section in this order.
const CURRENCY_MARKERS: &[(&str, &str)] = &[
    ("新台幣", "TWD"),
    ("NT$", "TWD"),
    ("TWD", "TWD"),
    ("人民幣", "CNY"),
    ("RMB", "CNY"),
    ("CNY", "CNY"),
    ("港幣", "HKD"),
    ("HK$", "HKD"),
    ("HKD", "HKD"),
    ("US$", "USD"),
    ("USD", "USD"),
];

/// Reads text-layer PDFs into [`Report`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentParser;

impl DocumentParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse a PDF file, absorbing open failures.
    ///
    /// An unreadable file is logged and yields a report with no sections, so
    /// one bad upload never aborts a batch.
    #[must_use]
    pub fn parse(&self, path: &Path, company_hint: &str, fiscal_year: i32) -> Report {
        match self.try_parse(path, company_hint, fiscal_year) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "PDF parse failed; continuing with an empty report"
                );
                build_report(Vec::new(), company_hint, fiscal_year)
            }
        }
    }

    /// Parse a PDF file, surfacing a failure to open it.
    ///
    /// Individual pages whose text cannot be extracted are still skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Open`] if the file cannot be opened or is not a PDF.
    pub fn try_parse(
        &self,
        path: &Path,
        company_hint: &str,
        fiscal_year: i32,
    ) -> Result<Report, ParseError> {
        let doc = Document::load(path).map_err(|e| ParseError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(parse_document(&doc, company_hint, fiscal_year))
    }

    /// Parse a PDF held in memory, absorbing load failures like [`Self::parse`].
    #[must_use]
    pub fn parse_bytes(&self, bytes: &[u8], company_hint: &str, fiscal_year: i32) -> Report {
        match Document::load_mem(bytes).map_err(|e| ParseError::Load(e.to_string())) {
            Ok(doc) => parse_document(&doc, company_hint, fiscal_year),
            Err(e) => {
                tracing::warn!(error = %e, "PDF parse failed; continuing with an empty report");
                build_report(Vec::new(), company_hint, fiscal_year)
            }
        }
    }

    /// Whether the document carries a usable text layer.
    ///
    /// Inspects the first three pages; `false` means OCR would be needed.
    /// Unreadable files report `false`.
    #[must_use]
    pub fn detect_text_layer(&self, path: &Path) -> bool {
        match Document::load(path) {
            Ok(doc) => has_text_layer(&doc),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "text layer probe failed");
                false
            }
        }
    }
}

fn has_text_layer(doc: &Document) -> bool {
    doc.get_pages()
        .into_iter()
        .take(TEXT_LAYER_PROBE_PAGES)
        .filter_map(|(page, page_id)| page_text(doc, page, page_id).ok())
        .any(|text| text.trim().chars().count() > TEXT_LAYER_MIN_CHARS)
}

fn parse_document(doc: &Document, company_hint: &str, fiscal_year: i32) -> Report {
    let sections = sections_from_pages(&page_texts(doc));
    build_report(sections, company_hint, fiscal_year)
}

/// Extract each page's text, skipping pages that fail.
fn page_texts(doc: &Document) -> Vec<(u32, String)> {
    doc.get_pages()
        .into_iter()
        .filter_map(|(page, page_id)| match page_text(doc, page, page_id) {
            Ok(text) => Some((page, text)),
            Err(e) => {
                tracing::warn!(page, error = %e, "skipping page with unreadable text");
                None
            }
        })
        .collect()
}

/// Positional layout first; lopdf's stream-order text when the layout pass fails.
fn page_text(doc: &Document, page: u32, page_id: ObjectId) -> lopdf::Result<String> {
    layout::page_text(doc, page_id).or_else(|e| {
        tracing::debug!(page, error = %e, "layout pass failed; using stream-order text");
        doc.extract_text(&[page])
    })
}

/// Turn per-page text into ordered sections: one text section per page with
/// enough text, then one table section per detected table on that page.
pub(crate) fn sections_from_pages(pages: &[(u32, String)]) -> Vec<Section> {
    let mut sections = Vec::new();

    for (page, text) in pages {
        let stripped = text.trim();
        if stripped.chars().count() > MIN_TEXT_SECTION_CHARS {
            sections.push(Section::text(*page, stripped));
        }

        for (i, grid) in detect_tables(text).into_iter().enumerate() {
            let index = i + 1;
            let content = render_table(index, &grid);
            sections.push(Section::table(*page, index, content, grid));
        }
    }

    sections
}

fn build_report(sections: Vec<Section>, company_hint: &str, fiscal_year: i32) -> Report {
    let hint = company_hint.trim();
    let company = if hint.is_empty() {
        derive_company_name(&sections)
    } else {
        hint.to_string()
    };
    let currency = detect_currency(&sections);

    tracing::info!(
        company = %company,
        fiscal_year,
        sections = sections.len(),
        tables = sections.iter().filter(|s| s.is_table()).count(),
        "parsed report"
    );

    Report::new(&company, fiscal_year, &currency, sections)
}

/// Find the company name in the opening text of the document.
///
/// The first line (within the first ten lines of any of the first five
/// sections that are text) containing a corporate suffix wins.
#[must_use]
pub fn derive_company_name(sections: &[Section]) -> String {
    sections
        .iter()
        .take(COMPANY_SCAN_SECTIONS)
        .filter(|s| s.section_type == SectionType::Text)
        .flat_map(|s| s.content.lines().take(COMPANY_SCAN_LINES))
        .find(|line| COMPANY_MARKERS.iter().any(|marker| line.contains(marker)))
        .map_or_else(|| UNKNOWN_COMPANY.to_string(), |line| line.trim().to_string())
}

/// Reporting currency from the first marker found in the text sections.
///
/// Empty when no marker appears.
#[must_use]
pub fn detect_currency(sections: &[Section]) -> String {
    sections
        .iter()
        .filter(|s| s.section_type == SectionType::Text)
        .find_map(|s| {
            CURRENCY_MARKERS
                .iter()
                .find(|(marker, _)| s.content.contains(marker))
                .map(|(_, code)| (*code).to_string())
        })
        .unwrap_or_default()
}
