//! Single-document extraction: parse, classify, extract, compute.

use std::path::Path;

use annualcmp_core::{CompanyMetrics, Figures, Report};

use crate::parser::DocumentParser;
use crate::{classifier, figures, ratios};

/// Everything extracted from one annual report.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub report: Report,
    pub figures: Figures,
    pub metrics: CompanyMetrics,
}

/// Run the extraction stages over an already-parsed report.
#[must_use]
pub fn process_report(report: Report) -> ProcessedDocument {
    let statements = classifier::classify(&report.sections);
    let figures = figures::extract(&statements);
    let metrics = ratios::compute(&figures).for_report(&report);

    tracing::info!(
        report_id = %report.report_id,
        statements = statements.found(),
        figures = figures.len(),
        metrics = metrics.metrics.len(),
        "processed report"
    );

    ProcessedDocument {
        report,
        figures,
        metrics,
    }
}

/// Parse a PDF and run every extraction stage over it.
///
/// Never fails: an unreadable file yields an empty report with no figures.
#[must_use]
pub fn process_pdf(path: &Path, company_hint: &str, fiscal_year: i32) -> ProcessedDocument {
    let report = DocumentParser::new().parse(path, company_hint, fiscal_year);
    process_report(report)
}

#[cfg(test)]
mod tests {
    use annualcmp_core::{FigureKey, Section};

    use super::*;

    #[test]
    fn report_flows_through_every_stage() {
        let sections = vec![
            Section::text(1, "Acme Holdings Inc.\nAnnual report 2024"),
            Section::table(
                3,
                1,
                "Table 1:\nIncome statement | 2024\nRevenue | 1,000,000\nNet income | 100,000",
                Vec::new(),
            ),
        ];
        let report = Report::new("Acme", 2024, "USD", sections);

        let processed = process_report(report);
        assert_eq!(processed.figures.get(FigureKey::Revenue), Some(1_000_000.0));
        assert_eq!(processed.figures.get(FigureKey::NetIncome), Some(100_000.0));
        assert_eq!(processed.metrics.company, "Acme");
        assert_eq!(processed.metrics.fiscal_year, 2024);
        assert_eq!(processed.metrics.currency, "USD");
        assert_eq!(processed.metrics.get("net_margin").map(|m| m.value), Some(10.0));
        assert_eq!(processed.metrics.get("net_margin").map(|m| m.period.as_str()), Some("FY"));
    }

    #[test]
    fn missing_file_yields_empty_result() {
        let processed = process_pdf(Path::new("/nonexistent/report.pdf"), "Acme", 2024);
        assert!(processed.report.sections.is_empty());
        assert!(processed.figures.is_empty());
        assert!(processed.metrics.metrics.is_empty());
        assert_eq!(processed.metrics.company, "Acme");
    }
}
