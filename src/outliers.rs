use crate::models::{GradeRecord, OutlierAnomaly};
use crate::stats;

pub fn detect_outliers(
    grades: &[GradeRecord],
    cohort_mean: f64,
    cohort_std_dev: f64,
    threshold: f64,
) -> Vec<OutlierAnomaly> {
    if cohort_std_dev == 0.0 {
        return Vec::new();
    }

    let outliers: Vec<OutlierAnomaly> = grades
        .iter()
        .filter_map(|grade| {
            let z_score = stats::z_score(grade.score, cohort_mean, cohort_std_dev);
            (z_score.abs() > threshold).then(|| OutlierAnomaly {
                submission_id: grade.submission_id,
                student_identifier: grade.student_identifier.clone(),
                score: grade.score,
                z_score,
                grader_id: grade.grader_id,
                grader_email: grade.grader_email.clone(),
            })
        })
        .collect();

    tracing::debug!(flagged = outliers.len(), "outlier pass complete");
    outliers
}
