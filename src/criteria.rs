use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{CriterionAnomaly, GradeRecord, RubricBreakdown};
use crate::stats;

/// Decodes a stored rubric breakdown (a JSON object of criterion -> points).
///
/// Anything that is not an object of finite numbers is treated as "no
/// breakdown", as is an empty object. Criterion order follows the payload.
pub fn parse_breakdown(raw: &str) -> Option<RubricBreakdown> {
    let value: serde_json::Value = serde_json::from_str(raw.trim()).ok()?;
    let object = value.as_object()?;

    let mut criteria = Vec::with_capacity(object.len());
    for (name, points) in object {
        let points = points.as_f64().filter(|p| p.is_finite())?;
        criteria.push((name.clone(), points));
    }

    if criteria.is_empty() {
        None
    } else {
        Some(RubricBreakdown { criteria })
    }
}

pub struct CriterionThresholds {
    pub min_samples: usize,
    pub cv_threshold: f64,
    pub z_threshold: f64,
}

struct CriterionScores<'a> {
    name: &'a str,
    entries: Vec<(f64, Uuid)>,
}

/// Flags rubric criteria whose coefficient of variation across the batch is
/// above `cv_threshold`. Criteria appear in first-seen order.
pub fn detect_criterion_issues(
    grades: &[GradeRecord],
    thresholds: &CriterionThresholds,
) -> Vec<CriterionAnomaly> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut criteria: Vec<CriterionScores> = Vec::new();

    for grade in grades {
        let Some(breakdown) = grade.rubric_breakdown.as_ref() else {
            continue;
        };
        for (name, points) in breakdown.iter() {
            let slot = *positions.entry(name).or_insert_with(|| {
                criteria.push(CriterionScores {
                    name,
                    entries: Vec::new(),
                });
                criteria.len() - 1
            });
            criteria[slot].entries.push((points, grade.submission_id));
        }
    }

    let issues: Vec<CriterionAnomaly> = criteria
        .into_iter()
        .filter(|criterion| criterion.entries.len() >= thresholds.min_samples)
        .filter_map(|criterion| {
            let points: Vec<f64> = criterion.entries.iter().map(|(p, _)| *p).collect();
            let (mean, std_dev) = stats::mean_and_std_dev(&points);
            // A zero or non-finite ratio (mean of zero) never qualifies.
            let cv = stats::safe_ratio(std_dev, mean, 0.0);
            if cv <= thresholds.cv_threshold {
                return None;
            }

            let inconsistent_submission_ids = criterion
                .entries
                .iter()
                .filter(|(p, _)| stats::z_score(*p, mean, std_dev).abs() > thresholds.z_threshold)
                .map(|(_, submission_id)| *submission_id)
                .collect();

            Some(CriterionAnomaly {
                criterion_name: criterion.name.to_string(),
                average_score: mean,
                standard_deviation: std_dev,
                inconsistent_submission_ids,
            })
        })
        .collect();

    tracing::debug!(flagged = issues.len(), "criterion consistency pass complete");
    issues
}
