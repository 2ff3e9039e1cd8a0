//! Ratio catalog and computation.
//!
//! The catalog lists every ratio the five categories define. Only entries with
//! a `compute` function are produced; the rest are placeholders. Most need
//! figures the extractor does not read, such as prior-year revenue, inventory
//! or interest expense. Gross and operating margin are the exception: their
//! inputs are extracted and shown in the extract output, but the computed set
//! stays at the six ratios reports are compared on.

use std::collections::BTreeMap;

use annualcmp_core::{
    CompanyMetrics, FigureKey, Figures, Metric, Period, RatioCategory, COMPUTED_PAGE_REF,
};

type ComputeFn = fn(&Figures) -> Option<f64>;

/// One catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct RatioDefinition {
    pub key: &'static str,
    pub label: &'static str,
    pub category: RatioCategory,
    pub unit: &'static str,
    pub formula: &'static str,
    /// `None` marks a defined-but-not-computed ratio.
    pub compute: Option<ComputeFn>,
}

impl RatioDefinition {
    #[must_use]
    pub fn is_computed(&self) -> bool {
        self.compute.is_some()
    }
}

const PERCENT: &str = "%";
const TIMES: &str = "×";

pub const RATIO_CATALOG: &[RatioDefinition] = &[
    RatioDefinition {
        key: "gross_margin",
        label: "Gross Margin",
        category: RatioCategory::Profitability,
        unit: PERCENT,
        formula: "gross_profit / revenue × 100",
        compute: None,
    },
    RatioDefinition {
        key: "operating_margin",
        label: "Operating Margin",
        category: RatioCategory::Profitability,
        unit: PERCENT,
        formula: "operating_income / revenue × 100",
        compute: None,
    },
    RatioDefinition {
        key: "net_margin",
        label: "Net Margin",
        category: RatioCategory::Profitability,
        unit: PERCENT,
        formula: "net_income / revenue × 100",
        compute: Some(net_margin),
    },
    RatioDefinition {
        key: "roe",
        label: "Return on Equity (ROE)",
        category: RatioCategory::Profitability,
        unit: PERCENT,
        formula: "net_income / shareholders_equity × 100",
        compute: Some(roe),
    },
    RatioDefinition {
        key: "roa",
        label: "Return on Assets (ROA)",
        category: RatioCategory::Profitability,
        unit: PERCENT,
        formula: "net_income / total_assets × 100",
        compute: Some(roa),
    },
    RatioDefinition {
        key: "ebitda_margin",
        label: "EBITDA Margin",
        category: RatioCategory::Profitability,
        unit: PERCENT,
        formula: "ebitda / revenue × 100",
        compute: None,
    },
    RatioDefinition {
        key: "revenue_yoy",
        label: "Revenue Growth (YoY)",
        category: RatioCategory::Growth,
        unit: PERCENT,
        formula: "(revenue - prior_revenue) / prior_revenue × 100",
        compute: None,
    },
    RatioDefinition {
        key: "net_income_yoy",
        label: "Net Income Growth (YoY)",
        category: RatioCategory::Growth,
        unit: PERCENT,
        formula: "(net_income - prior_net_income) / prior_net_income × 100",
        compute: None,
    },
    RatioDefinition {
        key: "revenue_cagr_3y",
        label: "Revenue 3-Year CAGR",
        category: RatioCategory::Growth,
        unit: PERCENT,
        formula: "((revenue / revenue_3y_ago)^(1/3) - 1) × 100",
        compute: None,
    },
    RatioDefinition {
        key: "asset_turnover",
        label: "Asset Turnover",
        category: RatioCategory::Efficiency,
        unit: TIMES,
        formula: "revenue / total_assets",
        compute: Some(asset_turnover),
    },
    RatioDefinition {
        key: "inventory_days",
        label: "Days Inventory Outstanding (DIO)",
        category: RatioCategory::Efficiency,
        unit: "days",
        formula: "inventory / cost_of_sales × 365",
        compute: None,
    },
    RatioDefinition {
        key: "receivable_days",
        label: "Days Sales Outstanding (DSO)",
        category: RatioCategory::Efficiency,
        unit: "days",
        formula: "accounts_receivable / revenue × 365",
        compute: None,
    },
    RatioDefinition {
        key: "debt_ratio",
        label: "Debt Ratio",
        category: RatioCategory::Leverage,
        unit: PERCENT,
        formula: "total_liabilities / total_assets × 100",
        compute: Some(debt_ratio),
    },
    RatioDefinition {
        key: "debt_to_ebitda",
        label: "Net Debt / EBITDA",
        category: RatioCategory::Leverage,
        unit: TIMES,
        formula: "net_debt / ebitda",
        compute: None,
    },
    RatioDefinition {
        key: "interest_coverage",
        label: "Interest Coverage",
        category: RatioCategory::Leverage,
        unit: TIMES,
        formula: "operating_income / interest_expense",
        compute: None,
    },
    RatioDefinition {
        key: "ocf_to_ni",
        label: "Operating Cash Flow / Net Income",
        category: RatioCategory::CashQuality,
        unit: TIMES,
        formula: "operating_cash_flow / net_income",
        compute: Some(ocf_to_ni),
    },
    RatioDefinition {
        key: "fcf_margin",
        label: "Free Cash Flow Margin",
        category: RatioCategory::CashQuality,
        unit: PERCENT,
        formula: "(operating_cash_flow - capex) / revenue × 100",
        compute: None,
    },
];

fn both(figures: &Figures, a: FigureKey, b: FigureKey) -> Option<(f64, f64)> {
    Some((figures.get(a)?, figures.get(b)?))
}

fn net_margin(figures: &Figures) -> Option<f64> {
    let (revenue, net_income) = both(figures, FigureKey::Revenue, FigureKey::NetIncome)?;
    (revenue > 0.0 && net_income > 0.0).then(|| net_income / revenue * 100.0)
}

fn roe(figures: &Figures) -> Option<f64> {
    let (equity, net_income) = both(figures, FigureKey::ShareholdersEquity, FigureKey::NetIncome)?;
    (equity > 0.0 && net_income.abs() > 0.0).then(|| net_income / equity * 100.0)
}

fn roa(figures: &Figures) -> Option<f64> {
    let (assets, net_income) = both(figures, FigureKey::TotalAssets, FigureKey::NetIncome)?;
    (assets > 0.0 && net_income.abs() > 0.0).then(|| net_income / assets * 100.0)
}

fn asset_turnover(figures: &Figures) -> Option<f64> {
    let (assets, revenue) = both(figures, FigureKey::TotalAssets, FigureKey::Revenue)?;
    (assets > 0.0 && revenue > 0.0).then(|| revenue / assets)
}

fn debt_ratio(figures: &Figures) -> Option<f64> {
    let (assets, liabilities) = both(figures, FigureKey::TotalAssets, FigureKey::TotalLiabilities)?;
    (assets > 0.0 && liabilities > 0.0).then(|| liabilities / assets * 100.0)
}

fn ocf_to_ni(figures: &Figures) -> Option<f64> {
    let (net_income, ocf) = both(figures, FigureKey::NetIncome, FigureKey::OperatingCashFlow)?;
    (net_income > 0.0 && ocf > 0.0).then(|| ocf / net_income)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Look up a catalog entry by key.
#[must_use]
pub fn definition(key: &str) -> Option<&'static RatioDefinition> {
    RATIO_CATALOG.iter().find(|d| d.key == key)
}

/// Compute every ratio whose inputs are present and pass its guard.
///
/// Identity fields of the result are left empty; fill them with
/// [`CompanyMetrics::for_report`].
#[must_use]
pub fn compute(figures: &Figures) -> CompanyMetrics {
    let period = Period::FY.to_string();
    let mut metrics = BTreeMap::new();

    for def in RATIO_CATALOG {
        let Some(value) = def.compute.and_then(|f| f(figures)) else {
            continue;
        };
        metrics.insert(
            def.key.to_string(),
            Metric {
                name: def.label.to_string(),
                value: round2(value),
                unit: def.unit.to_string(),
                period: period.clone(),
                page_ref: COMPUTED_PAGE_REF.to_string(),
                calculation_method: def.formula.to_string(),
            },
        );
    }

    tracing::debug!(figures = figures.len(), metrics = metrics.len(), "computed ratios");

    CompanyMetrics {
        metrics,
        ..CompanyMetrics::default()
    }
}

/// Computed metrics of one category, in catalog order.
#[must_use]
pub fn metrics_in_category(
    company: &CompanyMetrics,
    category: RatioCategory,
) -> Vec<(&'static RatioDefinition, &Metric)> {
    RATIO_CATALOG
        .iter()
        .filter(|d| d.category == category)
        .filter_map(|d| company.get(d.key).map(|m| (d, m)))
        .collect()
}
