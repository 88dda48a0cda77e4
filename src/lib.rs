//! Detects grading inconsistency across the graders of one assignment and
//! ranks submissions by how likely they are to need a regrade.

pub mod config;
pub mod criteria;
pub mod db;
pub mod error;
pub mod ingest;
pub mod models;
pub mod outliers;
pub mod report;
pub mod risk;
pub mod severity;
pub mod stats;

pub use config::AnalysisConfig;
pub use error::{AnalysisError, AnalysisResult};
pub use models::{AnomalyReport, GradeRecord};
pub use report::analyze;
