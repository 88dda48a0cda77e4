use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-criterion points for one submission, in the order the grader recorded them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RubricBreakdown {
    pub criteria: Vec<(String, f64)>,
}

impl RubricBreakdown {
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.criteria.iter().map(|(name, points)| (name.as_str(), *points))
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct GradeRecord {
    pub submission_id: Uuid,
    pub student_identifier: String,
    pub score: f64,
    pub grader_id: Uuid,
    pub grader_email: String,
    pub rubric_breakdown: Option<RubricBreakdown>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraderSeverity {
    TooHarsh,
    TooLenient,
}

impl GraderSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            GraderSeverity::TooHarsh => "too_harsh",
            GraderSeverity::TooLenient => "too_lenient",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TASeverityAnomaly {
    pub grader_id: Uuid,
    pub grader_email: String,
    pub average_score: f64,
    pub grade_count: usize,
    /// Signed distance from the cohort mean, in cohort standard deviations.
    pub deviation: f64,
    pub severity: GraderSeverity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierAnomaly {
    pub submission_id: Uuid,
    pub student_identifier: String,
    pub score: f64,
    pub z_score: f64,
    pub grader_id: Uuid,
    pub grader_email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionAnomaly {
    pub criterion_name: String,
    pub average_score: f64,
    pub standard_deviation: f64,
    pub inconsistent_submission_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegradeRisk {
    pub submission_id: Uuid,
    pub student_identifier: String,
    pub score: f64,
    pub risk_score: u32,
    pub risk_factors: Vec<String>,
    pub grader_id: Uuid,
    pub grader_email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub assignment_id: Uuid,
    pub total_grades: usize,
    pub average_score: f64,
    pub standard_deviation: f64,
    pub ta_severity: Vec<TASeverityAnomaly>,
    pub outliers: Vec<OutlierAnomaly>,
    pub criterion_issues: Vec<CriterionAnomaly>,
    pub regrade_risks: Vec<RegradeRisk>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Reviewed,
    Resolved,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewed => "reviewed",
            ReportStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ReportStatus::Pending),
            "reviewed" => Ok(ReportStatus::Reviewed),
            "resolved" => Ok(ReportStatus::Resolved),
            other => Err(format!(
                "unknown report status '{other}' (expected pending, reviewed or resolved)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Reviewed".parse::<ReportStatus>(), Ok(ReportStatus::Reviewed));
        assert_eq!(" resolved ".parse::<ReportStatus>(), Ok(ReportStatus::Resolved));
        assert!("archived".parse::<ReportStatus>().is_err());
    }

    #[test]
    fn severity_serializes_in_snake_case() {
        let json = serde_json::to_string(&GraderSeverity::TooHarsh).unwrap();
        assert_eq!(json, "\"too_harsh\"");
        assert_eq!(GraderSeverity::TooLenient.as_str(), "too_lenient");
    }
}
