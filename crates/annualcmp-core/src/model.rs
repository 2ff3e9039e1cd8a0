//! Report, statement and retrieval data model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Company name used when neither the caller nor the document supplies one.
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// `page_ref` carried by every derived (non-extracted) metric.
pub const COMPUTED_PAGE_REF: &str = "computed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Text,
    Table,
    Figure,
}

impl SectionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SectionType::Text => "text",
            SectionType::Table => "table",
            SectionType::Figure => "figure",
        }
    }
}

impl std::fmt::Display for SectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contiguous parsed unit of one document page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(rename = "type")]
    pub section_type: SectionType,
    pub page_from: u32,
    pub page_to: u32,
    pub content: String,
    pub page_ref: String,
    /// Structured grid for table sections, header row first.
    pub raw_table: Option<Vec<Vec<String>>>,
}

impl Section {
    /// A text section spanning exactly one page.
    #[must_use]
    pub fn text(page: u32, content: impl Into<String>) -> Self {
        Self {
            section_type: SectionType::Text,
            page_from: page,
            page_to: page,
            content: content.into(),
            page_ref: page_ref(page),
            raw_table: None,
        }
    }

    /// A table section; `table_index` is 1-based within the page.
    #[must_use]
    pub fn table(
        page: u32,
        table_index: usize,
        content: impl Into<String>,
        grid: Vec<Vec<String>>,
    ) -> Self {
        Self {
            section_type: SectionType::Table,
            page_from: page,
            page_to: page,
            content: content.into(),
            page_ref: format!("{} table {table_index}", page_ref(page)),
            raw_table: Some(grid),
        }
    }

    #[must_use]
    pub fn is_table(&self) -> bool {
        self.section_type == SectionType::Table
    }
}

fn page_ref(page: u32) -> String {
    format!("p.{page}")
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Period {
    #[default]
    FY,
    Q1,
    Q2,
    Q3,
    Q4,
    TTM,
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Period::FY => "FY",
            Period::Q1 => "Q1",
            Period::Q2 => "Q2",
            Period::Q3 => "Q3",
            Period::Q4 => "Q4",
            Period::TTM => "TTM",
        };
        f.write_str(label)
    }
}

/// One parsed annual report. Immutable once produced by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub report_id: String,
    pub company: String,
    pub fiscal_year: i32,
    pub period: Period,
    pub currency: String,
    pub sections: Vec<Section>,
}

impl Report {
    /// Build a full-year report; `report_id` is `{company}_{fiscal_year}`.
    #[must_use]
    pub fn new(company: &str, fiscal_year: i32, currency: &str, sections: Vec<Section>) -> Self {
        Self {
            report_id: format!("{company}_{fiscal_year}"),
            company: company.to_string(),
            fiscal_year,
            period: Period::FY,
            currency: currency.to_string(),
            sections,
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.is_table())
    }
}

/// Canonical financial statement line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FigureKey {
    Revenue,
    GrossProfit,
    OperatingIncome,
    NetIncome,
    TotalAssets,
    TotalLiabilities,
    ShareholdersEquity,
    OperatingCashFlow,
}

impl FigureKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FigureKey::Revenue => "revenue",
            FigureKey::GrossProfit => "gross_profit",
            FigureKey::OperatingIncome => "operating_income",
            FigureKey::NetIncome => "net_income",
            FigureKey::TotalAssets => "total_assets",
            FigureKey::TotalLiabilities => "total_liabilities",
            FigureKey::ShareholdersEquity => "shareholders_equity",
            FigureKey::OperatingCashFlow => "operating_cash_flow",
        }
    }
}

impl std::fmt::Display for FigureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracted figures. A missing key means "not found", never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Figures(BTreeMap<FigureKey, f64>);

impl Figures {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: FigureKey) -> Option<f64> {
        self.0.get(&key).copied()
    }

    pub fn insert(&mut self, key: FigureKey, value: f64) {
        self.0.insert(key, value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(FigureKey, f64)> for Figures {
    fn from_iter<I: IntoIterator<Item = (FigureKey, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A derived, named financial ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub period: String,
    /// Literal page citation, or [`COMPUTED_PAGE_REF`] for derived values.
    pub page_ref: String,
    pub calculation_method: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioCategory {
    Profitability,
    Growth,
    Efficiency,
    Leverage,
    CashQuality,
}

impl RatioCategory {
    pub const ALL: [RatioCategory; 5] = [
        RatioCategory::Profitability,
        RatioCategory::Growth,
        RatioCategory::Efficiency,
        RatioCategory::Leverage,
        RatioCategory::CashQuality,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RatioCategory::Profitability => "profitability",
            RatioCategory::Growth => "growth",
            RatioCategory::Efficiency => "efficiency",
            RatioCategory::Leverage => "leverage",
            RatioCategory::CashQuality => "cash_quality",
        }
    }
}

impl std::fmt::Display for RatioCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RatioCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RatioCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown ratio category: {s}"))
    }
}

/// Ratios computed for one company and period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyMetrics {
    pub company: String,
    pub fiscal_year: i32,
    pub period: Period,
    pub currency: String,
    pub metrics: BTreeMap<String, Metric>,
}

impl CompanyMetrics {
    /// Fill the identity fields from the report the figures came from.
    #[must_use]
    pub fn for_report(mut self, report: &Report) -> Self {
        self.company.clone_from(&report.company);
        self.fiscal_year = report.fiscal_year;
        self.period = report.period;
        self.currency.clone_from(&report.currency);
        let period = report.period.to_string();
        for metric in self.metrics.values_mut() {
            metric.period.clone_from(&period);
        }
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Metric> {
        self.metrics.get(key)
    }
}

/// A retrieval-sized slice of report text with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub doc_id: String,
    pub chunk_id: String,
    pub text: String,
    pub page_ref: String,
    pub section_type: SectionType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_id_joins_company_and_year() {
        let report = Report::new("Acme", 2024, "", Vec::new());
        assert_eq!(report.report_id, "Acme_2024");
        assert_eq!(report.period, Period::FY);
    }

    #[test]
    fn table_section_page_ref_names_table_index() {
        let section = Section::table(3, 2, "Table 2:", vec![]);
        assert_eq!(section.page_ref, "p.3 table 2");
        assert!(section.is_table());
    }

    #[test]
    fn figures_serialize_with_canonical_keys() {
        let mut figures = Figures::new();
        figures.insert(FigureKey::NetIncome, 100.0);
        figures.insert(FigureKey::Revenue, 1000.0);
        let json = serde_json::to_value(&figures).unwrap();
        assert_eq!(json, serde_json::json!({"revenue": 1000.0, "net_income": 100.0}));
    }

    #[test]
    fn missing_figure_is_none_not_zero() {
        let figures = Figures::new();
        assert_eq!(figures.get(FigureKey::TotalAssets), None);
    }

    #[test]
    fn company_metrics_take_identity_from_report() {
        let mut report = Report::new("Acme", 2023, "TWD", Vec::new());
        report.period = Period::Q2;
        let mut metrics = CompanyMetrics::default();
        metrics.metrics.insert(
            "roe".to_string(),
            Metric {
                name: "Return on Equity".to_string(),
                value: 10.0,
                unit: "%".to_string(),
                period: "FY".to_string(),
                page_ref: COMPUTED_PAGE_REF.to_string(),
                calculation_method: String::new(),
            },
        );
        let metrics = metrics.for_report(&report);
        assert_eq!(metrics.get("roe").map(|m| m.period.as_str()), Some("Q2"));
        assert_eq!(metrics.company, "Acme");
        assert_eq!(metrics.fiscal_year, 2023);
        assert_eq!(metrics.period, Period::Q2);
        assert_eq!(metrics.currency, "TWD");
    }

    #[test]
    fn ratio_category_round_trips_through_str() {
        for category in RatioCategory::ALL {
            assert_eq!(category.as_str().parse::<RatioCategory>(), Ok(category));
        }
        assert!("liquidity".parse::<RatioCategory>().is_err());
    }

    #[test]
    fn section_type_serializes_lowercase() {
        let json = serde_json::to_value(SectionType::Table).unwrap();
        assert_eq!(json, serde_json::json!("table"));
    }
}
