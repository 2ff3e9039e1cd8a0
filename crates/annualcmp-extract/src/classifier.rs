//! Labels table sections as income, balance or cash-flow statements.

use annualcmp_core::Section;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Income,
    Balance,
    CashFlow,
}

impl StatementKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Income => "income",
            StatementKind::Balance => "balance",
            StatementKind::CashFlow => "cashflow",
        }
    }
}

/// Keyword sets per statement, in evaluation order.
///
/// Matched against the lower-cased table content. A table is assigned to the
/// first kind whose keywords it contains.
const STATEMENT_KEYWORDS: &[(StatementKind, &[&str])] = &[
    (StatementKind::Income, &["損益", "利潤", "收益", "income", "profit"]),
    (StatementKind::Balance, &["資產負債", "財務狀況", "balance", "position"]),
    (StatementKind::CashFlow, &["現金流", "cash flow", "cash flows"]),
];

/// The statement tables found in one report. Each slot holds the last table
/// assigned to it in document order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Statements<'a> {
    pub income: Option<&'a Section>,
    pub balance: Option<&'a Section>,
    pub cashflow: Option<&'a Section>,
}

impl<'a> Statements<'a> {
    #[must_use]
    pub fn get(&self, kind: StatementKind) -> Option<&'a Section> {
        match kind {
            StatementKind::Income => self.income,
            StatementKind::Balance => self.balance,
            StatementKind::CashFlow => self.cashflow,
        }
    }

    fn slot(&mut self, kind: StatementKind) -> &mut Option<&'a Section> {
        match kind {
            StatementKind::Income => &mut self.income,
            StatementKind::Balance => &mut self.balance,
            StatementKind::CashFlow => &mut self.cashflow,
        }
    }

    #[must_use]
    pub fn found(&self) -> usize {
        [self.income, self.balance, self.cashflow]
            .iter()
            .filter(|s| s.is_some())
            .count()
    }
}

/// Classify a single table's content, or `None` if no keyword set matches.
#[must_use]
pub fn classify_table(content: &str) -> Option<StatementKind> {
    let lower = content.to_lowercase();
    STATEMENT_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(kind, _)| *kind)
}

/// Pick the income, balance and cash-flow tables out of a report's sections.
///
/// Non-table sections are ignored. A later table of the same kind replaces an
/// earlier one.
#[must_use]
pub fn classify(sections: &[Section]) -> Statements<'_> {
    let mut statements = Statements::default();

    for section in sections.iter().filter(|s| s.is_table()) {
        if let Some(kind) = classify_table(&section.content) {
            tracing::debug!(page_ref = %section.page_ref, kind = kind.as_str(), "classified table");
            *statements.slot(kind) = Some(section);
        }
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(page: u32, content: &str) -> Section {
        Section::table(page, 1, content, Vec::new())
    }

    #[test]
    fn classifies_each_statement_kind() {
        assert_eq!(classify_table("Consolidated Income Statement"), Some(StatementKind::Income));
        assert_eq!(classify_table("資產負債表"), Some(StatementKind::Balance));
        assert_eq!(
            classify_table("Statement of Cash Flows"),
            Some(StatementKind::CashFlow)
        );
        assert_eq!(classify_table("Board attendance"), None);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify_table("BALANCE SHEET"), Some(StatementKind::Balance));
    }

    #[test]
    fn table_matching_income_and_cashflow_goes_to_income() {
        // Income keywords are evaluated first, so they win the tie.
        let sections = vec![table(1, "損益及現金流 合併表")];
        let statements = classify(&sections);
        assert_eq!(classify_table("損益及現金流 合併表"), Some(StatementKind::Income));
        assert!(statements.income.is_some());
        assert!(statements.cashflow.is_none());
    }

    #[test]
    fn last_matching_table_wins() {
        let sections = vec![table(3, "Income statement A"), table(7, "Income statement B")];
        let statements = classify(&sections);
        assert_eq!(statements.income.map(|s| s.page_from), Some(7));
    }

    #[test]
    fn text_sections_are_ignored() {
        let sections = vec![Section::text(1, "Income statement discussion in prose")];
        let statements = classify(&sections);
        assert_eq!(statements.found(), 0);
    }

    #[test]
    fn all_three_statements_found() {
        let sections = vec![
            table(5, "Statement of profit or loss"),
            table(6, "Statement of financial position"),
            table(7, "Statement of cash flows"),
        ];
        let statements = classify(&sections);
        assert_eq!(statements.found(), 3);
        assert_eq!(statements.get(StatementKind::Balance).map(|s| s.page_from), Some(6));
    }
}
