use std::collections::HashMap;

use uuid::Uuid;

use crate::config::{AnalysisConfig, RiskRule};
use crate::models::{GradeRecord, GraderSeverity, OutlierAnomaly, RegradeRisk, TASeverityAnomaly};

/// Scores every grade against the regrade heuristics and returns the ones with
/// non-zero risk, highest first. Equal scores keep their input order.
pub fn score_regrade_risk(
    grades: &[GradeRecord],
    severities: &[TASeverityAnomaly],
    outliers: &[OutlierAnomaly],
    config: &AnalysisConfig,
) -> Vec<RegradeRisk> {
    let grader_severity: HashMap<Uuid, GraderSeverity> = severities
        .iter()
        .map(|anomaly| (anomaly.grader_id, anomaly.severity))
        .collect();
    let outlier_z: HashMap<Uuid, f64> = outliers
        .iter()
        .map(|outlier| (outlier.submission_id, outlier.z_score))
        .collect();

    let mut risks: Vec<RegradeRisk> = grades
        .iter()
        .filter_map(|grade| {
            let (risk_score, risk_factors) = assess_grade(
                grade,
                grader_severity.get(&grade.grader_id).copied(),
                outlier_z.get(&grade.submission_id).copied(),
                config,
            );
            (risk_score > 0).then(|| RegradeRisk {
                submission_id: grade.submission_id,
                student_identifier: grade.student_identifier.clone(),
                score: grade.score,
                risk_score,
                risk_factors,
                grader_id: grade.grader_id,
                grader_email: grade.grader_email.clone(),
            })
        })
        .collect();

    // `sort_by` is stable, which keeps equal-risk grades in scan order.
    risks.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    tracing::debug!(at_risk = risks.len(), "regrade risk pass complete");
    risks
}

fn assess_grade(
    grade: &GradeRecord,
    severity: Option<GraderSeverity>,
    outlier_z: Option<f64>,
    config: &AnalysisConfig,
) -> (u32, Vec<String>) {
    let weights = &config.weights;
    let mut total = 0u32;
    let mut factors = Vec::new();

    if let Some(z_score) = outlier_z {
        total = total.saturating_add(weights.weight(RiskRule::Outlier));
        factors.push(if z_score < 0.0 {
            "unusually_low_score".to_string()
        } else {
            "unusually_high_score".to_string()
        });
    }

    match severity {
        Some(GraderSeverity::TooHarsh) => {
            total = total.saturating_add(weights.weight(RiskRule::HarshGrader));
            factors.push("harsh_grader".to_string());
        }
        Some(GraderSeverity::TooLenient) => {
            total = total.saturating_add(weights.weight(RiskRule::LenientGrader));
            factors.push("lenient_grader".to_string());
        }
        None => {}
    }

    if let Some(boundary) =
        nearest_boundary(grade.score, &config.boundaries, config.boundary_window)
    {
        total = total.saturating_add(weights.weight(RiskRule::NearBoundary));
        factors.push(format!("near_boundary_{boundary}"));
    }

    if grade.score < config.very_low_score {
        total = total.saturating_add(weights.weight(RiskRule::VeryLowScore));
        factors.push("very_low_score".to_string());
    }

    (total.min(weights.cap), factors)
}

pub fn nearest_boundary(score: f64, boundaries: &[f64], window: f64) -> Option<f64> {
    boundaries
        .iter()
        .copied()
        .find(|boundary| (score - boundary).abs() <= window)
}
