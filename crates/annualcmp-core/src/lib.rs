//! Shared data model and configuration for the annual-report comparison pipeline.
//!
//! Every other crate in the workspace speaks in these types: parsed
//! [`Report`]s and their [`Section`]s, extracted [`Figures`], derived
//! [`Metric`]s and the retrieval [`Chunk`]s cut from a report.

pub mod app_config;
pub mod config;
pub mod model;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use model::{
    Chunk, CompanyMetrics, FigureKey, Figures, Metric, Period, RatioCategory, Report, Section,
    SectionType, COMPUTED_PAGE_REF, UNKNOWN_COMPANY,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
