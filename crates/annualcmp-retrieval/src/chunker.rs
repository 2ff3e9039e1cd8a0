//! Slices a report's sections into retrieval-sized chunks.

use annualcmp_core::{Chunk, Report, Section, SectionType};

/// Text windows at or below this many stripped characters are dropped.
const MIN_CHUNK_CHARS: usize = 50;

/// Split a report into chunks for indexing.
///
/// Text sections become non-overlapping windows of `chunk_size` whitespace
/// tokens; table sections become exactly one chunk each. Figure sections are
/// skipped. Identifiers share one counter, so they are unique per report.
#[must_use]
pub fn chunk_report(report: &Report, chunk_size: usize) -> Vec<Chunk> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut counter = 0usize;

    for section in &report.sections {
        match section.section_type {
            SectionType::Text => {
                let words: Vec<&str> = section.content.split_whitespace().collect();
                for window in words.chunks(chunk_size) {
                    let text = window.join(" ");
                    if text.trim().chars().count() <= MIN_CHUNK_CHARS {
                        continue;
                    }
                    chunks.push(make_chunk(report, section, "chunk", counter, text));
                    counter += 1;
                }
            }
            SectionType::Table => {
                chunks.push(make_chunk(report, section, "table", counter, section.content.clone()));
                counter += 1;
            }
            SectionType::Figure => {}
        }
    }

    tracing::debug!(report_id = %report.report_id, chunks = chunks.len(), "chunked report");
    chunks
}

fn make_chunk(report: &Report, section: &Section, kind: &str, n: usize, text: String) -> Chunk {
    Chunk {
        doc_id: report.report_id.clone(),
        chunk_id: format!("{}_{kind}_{n}", report.report_id),
        text,
        page_ref: section.page_ref.clone(),
        section_type: section.section_type,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("word{i:03}")).collect::<Vec<_>>().join(" ")
    }

    fn report(sections: Vec<Section>) -> Report {
        Report::new("Acme", 2024, "", sections)
    }

    #[test]
    fn long_text_is_windowed_by_token_count() {
        let r = report(vec![Section::text(1, words(25))]);
        let chunks = chunk_report(&r, 10);
        // Windows of 10, 10 and 5 words; the last one is 39 chars and dropped.
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text.split(' ').count(), 10);
        assert_eq!(chunks[0].chunk_id, "Acme_2024_chunk_0");
        assert_eq!(chunks[1].chunk_id, "Acme_2024_chunk_1");
    }

    #[test]
    fn whitespace_is_collapsed_to_single_spaces() {
        let r = report(vec![Section::text(2, "alpha\n\nbeta\tgamma   delta epsilon zeta eta theta iota kappa")]);
        let chunks = chunk_report(&r, 500);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "alpha beta gamma delta epsilon zeta eta theta iota kappa");
        assert_eq!(chunks[0].page_ref, "p.2");
        assert_eq!(chunks[0].doc_id, "Acme_2024");
    }

    #[test]
    fn short_text_is_dropped_but_short_table_is_kept() {
        let r = report(vec![
            Section::text(1, "Too short to index"),
            Section::table(1, 1, "Table 1:\nA | 1", Vec::new()),
        ]);
        let chunks = chunk_report(&r, 500);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_id, "Acme_2024_table_0");
        assert_eq!(chunks[0].section_type, SectionType::Table);
        assert_eq!(chunks[0].page_ref, "p.1 table 1");
    }

    #[test]
    fn counter_is_shared_across_kinds() {
        let r = report(vec![
            Section::text(1, words(10)),
            Section::table(1, 1, "Table 1:\nA | 1", Vec::new()),
            Section::text(2, words(10)),
        ]);
        let ids: Vec<String> = chunk_report(&r, 500).into_iter().map(|c| c.chunk_id).collect();
        assert_eq!(
            ids,
            vec!["Acme_2024_chunk_0", "Acme_2024_table_1", "Acme_2024_chunk_2"]
        );
    }

    #[test]
    fn chunk_ids_are_unique() {
        let sections = (1..=6)
            .flat_map(|p| {
                [
                    Section::text(p, words(40)),
                    Section::table(p, 1, format!("Table 1:\nRow | {p}"), Vec::new()),
                ]
            })
            .collect();
        let chunks = chunk_report(&report(sections), 7);
        let ids: HashSet<&str> = chunks.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids.len(), chunks.len());
    }

    #[test]
    fn zero_chunk_size_is_treated_as_one() {
        let r = report(vec![Section::text(1, "a".repeat(60))]);
        assert_eq!(chunk_report(&r, 0).len(), 1);
    }

    #[test]
    fn empty_report_has_no_chunks() {
        assert!(chunk_report(&report(Vec::new()), 500).is_empty());
    }
}
