use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    /// A grade is missing an identity or score field that cannot be safely ignored.
    #[error("grade #{index} is invalid: {reason}")]
    InvalidRecord { index: usize, reason: String },
    #[error("at least {required} grades are required for analysis, found {found}")]
    TooFewGrades { required: usize, found: usize },
    #[error("invalid analysis configuration: {0}")]
    InvalidConfig(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
