use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{GradeRecord, GraderSeverity, TASeverityAnomaly};
use crate::stats;

struct GraderScores<'a> {
    grader_id: Uuid,
    grader_email: &'a str,
    scores: Vec<f64>,
}

/// Flags graders whose mean sits more than `threshold` cohort deviations away
/// from the cohort mean. Graders are reported in first-seen order.
pub fn detect_grader_severity(
    grades: &[GradeRecord],
    cohort_mean: f64,
    cohort_std_dev: f64,
    threshold: f64,
) -> Vec<TASeverityAnomaly> {
    let mut positions: HashMap<Uuid, usize> = HashMap::new();
    let mut graders: Vec<GraderScores> = Vec::new();

    for grade in grades {
        let slot = *positions.entry(grade.grader_id).or_insert_with(|| {
            graders.push(GraderScores {
                grader_id: grade.grader_id,
                grader_email: &grade.grader_email,
                scores: Vec::new(),
            });
            graders.len() - 1
        });
        graders[slot].scores.push(grade.score);
    }

    let anomalies: Vec<TASeverityAnomaly> = graders
        .into_iter()
        .filter_map(|grader| {
            let (average_score, _) = stats::mean_and_std_dev(&grader.scores);
            let deviation = stats::safe_ratio(average_score - cohort_mean, cohort_std_dev, 0.0);
            if deviation.abs() <= threshold {
                return None;
            }

            let severity = if deviation > 0.0 {
                GraderSeverity::TooLenient
            } else {
                GraderSeverity::TooHarsh
            };

            Some(TASeverityAnomaly {
                grader_id: grader.grader_id,
                grader_email: grader.grader_email.to_string(),
                average_score,
                grade_count: grader.scores.len(),
                deviation,
                severity,
            })
        })
        .collect();

    tracing::debug!(flagged = anomalies.len(), "grader severity pass complete");
    anomalies
}
