//! Keyword and number heuristics that pull canonical figures out of statements.
//!
//! For every figure key, aliases are tried in priority order. The first alias
//! that appears on a line carrying at least one plausible amount decides the
//! value: the largest amount on that line. Values at or below
//! [`MIN_AMOUNT`] are discarded as page numbers, note references or
//! percentages. A key that never hits is simply absent from the result.
//!
//! Lines holding both current-year and prior-year columns resolve to the
//! larger of the two, whichever year that is.

use std::sync::LazyLock;

use annualcmp_core::{FigureKey, Figures};
use regex::Regex;

use crate::classifier::{StatementKind, Statements};

/// Amounts at or below this are not treated as statement figures.
pub const MIN_AMOUNT: f64 = 1000.0;

/// Thousands-separated digits or plain digits, each with an optional decimal part.
static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?").expect("valid amount regex")
});

/// Figure keys read from each statement.
const STATEMENT_FIGURES: &[(StatementKind, &[FigureKey])] = &[
    (
        StatementKind::Income,
        &[
            FigureKey::Revenue,
            FigureKey::GrossProfit,
            FigureKey::OperatingIncome,
            FigureKey::NetIncome,
        ],
    ),
    (
        StatementKind::Balance,
        &[
            FigureKey::TotalAssets,
            FigureKey::TotalLiabilities,
            FigureKey::ShareholdersEquity,
        ],
    ),
    (StatementKind::CashFlow, &[FigureKey::OperatingCashFlow]),
];

/// Aliases per key, in priority order. Chinese first, then English; English
/// aliases are lower-case because lines are lower-cased before matching.
#[must_use]
pub fn aliases(key: FigureKey) -> &'static [&'static str] {
    match key {
        FigureKey::Revenue => &[
            "營業收入",
            "營收",
            "銷售收入",
            "總收入",
            "收入",
            "total revenue",
            "net sales",
            "revenue",
            "sales",
        ],
        FigureKey::GrossProfit => &["毛利", "銷售毛利", "gross profit"],
        FigureKey::OperatingIncome => &[
            "營業利益",
            "營業利潤",
            "經營利潤",
            "operating income",
            "operating profit",
        ],
        FigureKey::NetIncome => &[
            "本期淨利",
            "淨利潤",
            "淨收益",
            "稅後淨利",
            "稅後盈餘",
            "net income",
            "net profit",
            "net earnings",
            "profit for the year",
        ],
        FigureKey::TotalAssets => &["總資產", "資產總額", "資產總計", "total assets"],
        FigureKey::TotalLiabilities => &["總負債", "負債總額", "負債總計", "total liabilities"],
        FigureKey::ShareholdersEquity => &[
            "股東權益",
            "所有者權益",
            "淨資產",
            "權益總額",
            "total equity",
            "shareholders' equity",
            "shareholders equity",
            "stockholders' equity",
            "stockholders equity",
        ],
        FigureKey::OperatingCashFlow => &[
            "營業活動現金流量",
            "經營活動現金流量",
            "營業活動之淨現金流入",
            "net cash from operating activities",
            "net cash provided by operating activities",
            "net cash generated from operating activities",
            "operating cash flow",
        ],
    }
}

/// All amounts on a line that pass the [`MIN_AMOUNT`] filter.
pub(crate) fn amounts_on_line(line: &str) -> Vec<f64> {
    AMOUNT
        .find_iter(line)
        .filter_map(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        .filter(|value| *value > MIN_AMOUNT)
        .collect()
}

/// Find one figure in statement text.
///
/// Returns the largest surviving amount on the first line that contains the
/// highest-priority alias with any surviving amount.
#[must_use]
pub fn extract_from_text(text: &str, key: FigureKey) -> Option<f64> {
    let lines: Vec<String> = text.lines().map(str::to_lowercase).collect();

    aliases(key).iter().find_map(|alias| {
        lines
            .iter()
            .filter(|line| line.contains(alias))
            .find_map(|line| amounts_on_line(line).into_iter().reduce(f64::max))
    })
}

/// Extract every canonical figure available from the classified statements.
#[must_use]
pub fn extract(statements: &Statements<'_>) -> Figures {
    let mut figures = Figures::new();

    for (kind, keys) in STATEMENT_FIGURES {
        let Some(section) = statements.get(*kind) else {
            continue;
        };
        for key in *keys {
            match extract_from_text(&section.content, *key) {
                Some(value) => {
                    tracing::debug!(key = key.as_str(), value, page_ref = %section.page_ref, "figure found");
                    figures.insert(*key, value);
                }
                None => {
                    tracing::debug!(key = key.as_str(), statement = kind.as_str(), "figure not found");
                }
            }
        }
    }

    figures
}

#[cfg(test)]
mod tests {
    use annualcmp_core::Section;

    use super::*;

    #[test]
    fn note_index_is_not_mistaken_for_revenue() {
        assert_eq!(
            extract_from_text("營業收入 1,234,567 (Note 5: 3)", FigureKey::Revenue),
            Some(1_234_567.0)
        );
    }

    #[test]
    fn largest_amount_on_line_wins() {
        assert_eq!(
            extract_from_text("Net income | 8,000 | 9,500", FigureKey::NetIncome),
            Some(9_500.0)
        );
    }

    #[test]
    fn small_values_only_means_not_found() {
        assert_eq!(extract_from_text("營業收入 12.5% 300", FigureKey::Revenue), None);
    }

    #[test]
    fn value_of_exactly_one_thousand_is_discarded() {
        assert_eq!(extract_from_text("Total assets 1,000", FigureKey::TotalAssets), None);
    }

    #[test]
    fn decimals_are_kept() {
        assert_eq!(
            extract_from_text("Total assets 12,345.67", FigureKey::TotalAssets),
            Some(12_345.67)
        );
    }

    #[test]
    fn alias_priority_beats_line_order() {
        // "收入" appears first in the text but "營業收入" has higher priority.
        let text = "其他收入 5,000\n營業收入 80,000";
        assert_eq!(extract_from_text(text, FigureKey::Revenue), Some(80_000.0));
    }

    #[test]
    fn hit_without_amount_falls_through_to_next_line() {
        let text = "營業收入 (附註六)\n營業收入 2,500,000";
        assert_eq!(extract_from_text(text, FigureKey::Revenue), Some(2_500_000.0));
    }

    #[test]
    fn english_aliases_match_case_insensitively() {
        let text = "TOTAL LIABILITIES | 40,000 | 35,000";
        assert_eq!(extract_from_text(text, FigureKey::TotalLiabilities), Some(40_000.0));
    }

    #[test]
    fn missing_alias_is_absent() {
        assert_eq!(extract_from_text("Revenue 5,000", FigureKey::OperatingCashFlow), None);
    }

    #[test]
    fn amounts_reject_bare_separators() {
        assert_eq!(amounts_on_line("a, b, c"), Vec::<f64>::new());
        assert_eq!(amounts_on_line("1,234,567 and 2024"), vec![1_234_567.0, 2024.0]);
    }

    #[test]
    fn extract_reads_each_statement_for_its_keys() {
        let income = Section::table(
            3,
            1,
            "Table 1:\nIncome statement | 2024\n營業收入 | 5,000,000\n本期淨利 | 600,000",
            Vec::new(),
        );
        let balance = Section::table(
            4,
            1,
            "Table 1:\nBalance sheet | 2024\n資產總額 | 9,000,000\n負債總額 | 3,000,000\n股東權益 | 6,000,000",
            Vec::new(),
        );
        let cashflow = Section::table(
            5,
            1,
            "Table 1:\nCash flow statement | 2024\n營業活動現金流量 | 700,000",
            Vec::new(),
        );
        let statements = Statements {
            income: Some(&income),
            balance: Some(&balance),
            cashflow: Some(&cashflow),
        };

        let figures = extract(&statements);
        assert_eq!(figures.get(FigureKey::Revenue), Some(5_000_000.0));
        assert_eq!(figures.get(FigureKey::NetIncome), Some(600_000.0));
        assert_eq!(figures.get(FigureKey::TotalAssets), Some(9_000_000.0));
        assert_eq!(figures.get(FigureKey::TotalLiabilities), Some(3_000_000.0));
        assert_eq!(figures.get(FigureKey::ShareholdersEquity), Some(6_000_000.0));
        assert_eq!(figures.get(FigureKey::OperatingCashFlow), Some(700_000.0));
        assert_eq!(figures.get(FigureKey::GrossProfit), None);
    }

    #[test]
    fn missing_statements_yield_no_figures() {
        assert!(extract(&Statements::default()).is_empty());
    }
}
