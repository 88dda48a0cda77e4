use std::fmt::Write;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::AnalysisConfig;
use crate::criteria::{self, CriterionThresholds};
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{AnomalyReport, GradeRecord};
use crate::{outliers, risk, severity, stats};

/// The result depends only on `grades` and `config`, apart from `generated_at`.
pub fn analyze(
    assignment_id: Uuid,
    grades: &[GradeRecord],
    config: &AnalysisConfig,
) -> AnalysisResult<AnomalyReport> {
    analyze_at(assignment_id, grades, config, Utc::now())
}

pub fn analyze_at(
    assignment_id: Uuid,
    grades: &[GradeRecord],
    config: &AnalysisConfig,
    generated_at: DateTime<Utc>,
) -> AnalysisResult<AnomalyReport> {
    config.validate()?;
    validate_grades(grades)?;

    let scores: Vec<f64> = grades.iter().map(|grade| grade.score).collect();
    let (average_score, standard_deviation) = stats::mean_and_std_dev(&scores);

    let ta_severity = severity::detect_grader_severity(
        grades,
        average_score,
        standard_deviation,
        config.severity_threshold,
    );
    let outliers = outliers::detect_outliers(
        grades,
        average_score,
        standard_deviation,
        config.outlier_threshold,
    );
    let criterion_issues = criteria::detect_criterion_issues(
        grades,
        &CriterionThresholds {
            min_samples: config.criterion_min_samples,
            cv_threshold: config.criterion_cv_threshold,
            z_threshold: config.criterion_z_threshold,
        },
    );
    let regrade_risks = risk::score_regrade_risk(grades, &ta_severity, &outliers, config);

    tracing::info!(
        %assignment_id,
        total_grades = grades.len(),
        graders_flagged = ta_severity.len(),
        outliers = outliers.len(),
        criteria_flagged = criterion_issues.len(),
        at_risk = regrade_risks.len(),
        "anomaly analysis complete"
    );

    Ok(AnomalyReport {
        assignment_id,
        total_grades: grades.len(),
        average_score,
        standard_deviation,
        ta_severity,
        outliers,
        criterion_issues,
        regrade_risks,
        generated_at,
    })
}

/// Rejects the whole batch if any grade has a corrupt identity or score.
pub fn validate_grades(grades: &[GradeRecord]) -> AnalysisResult<()> {
    for (index, grade) in grades.iter().enumerate() {
        let reason = if !grade.score.is_finite() {
            Some("score is not a finite number")
        } else if grade.student_identifier.trim().is_empty() {
            Some("student identifier is blank")
        } else if grade.submission_id.is_nil() {
            Some("submission id is nil")
        } else if grade.grader_id.is_nil() {
            Some("grader id is nil")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(AnalysisError::InvalidRecord {
                index,
                reason: reason.to_string(),
            });
        }
    }
    Ok(())
}

pub fn ensure_min_sample(grades: &[GradeRecord], required: usize) -> AnalysisResult<()> {
    if grades.len() < required {
        return Err(AnalysisError::TooFewGrades {
            required,
            found: grades.len(),
        });
    }
    Ok(())
}

pub fn render_markdown(report: &AnomalyReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Grading Anomaly Report");
    let _ = writeln!(
        output,
        "Assignment {} (generated {})",
        report.assignment_id,
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Grades analysed: {}", report.total_grades);
    let _ = writeln!(output, "- Average score: {:.2}", report.average_score);
    let _ = writeln!(output, "- Standard deviation: {:.2}", report.standard_deviation);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Grader Severity");
    if report.ta_severity.is_empty() {
        let _ = writeln!(output, "None detected.");
    } else {
        for anomaly in &report.ta_severity {
            let _ = writeln!(
                output,
                "- {} is {} (avg {:.1} across {} grades, {:+.2} sd)",
                anomaly.grader_email,
                anomaly.severity.as_str().replace('_', " "),
                anomaly.average_score,
                anomaly.grade_count,
                anomaly.deviation
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Outlier Grades");
    if report.outliers.is_empty() {
        let _ = writeln!(output, "None detected.");
    } else {
        for outlier in &report.outliers {
            let _ = writeln!(
                output,
                "- {} scored {:.1} (z {:+.2}, graded by {})",
                outlier.student_identifier, outlier.score, outlier.z_score, outlier.grader_email
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Inconsistent Criteria");
    if report.criterion_issues.is_empty() {
        let _ = writeln!(output, "None detected.");
    } else {
        for issue in &report.criterion_issues {
            let _ = writeln!(
                output,
                "- {}: avg {:.2}, sd {:.2}, {} inconsistent submissions",
                issue.criterion_name,
                issue.average_score,
                issue.standard_deviation,
                issue.inconsistent_submission_ids.len()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Regrade Risk");
    if report.regrade_risks.is_empty() {
        let _ = writeln!(output, "None detected.");
    } else {
        for risk in report.regrade_risks.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} ({:.1}, {}) risk {} [{}]",
                risk.student_identifier,
                risk.score,
                risk.grader_email,
                risk.risk_score,
                risk.risk_factors.join(", ")
            );
        }
    }

    output
}
