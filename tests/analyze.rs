use chrono::{TimeZone, Utc};
use grading_anomaly::models::{GraderSeverity, RubricBreakdown};
use grading_anomaly::report::analyze_at;
use grading_anomaly::{analyze, AnalysisConfig, GradeRecord};
use uuid::Uuid;

fn grade(student: &str, score: f64, grader_id: Uuid, breakdown: &[(&str, f64)]) -> GradeRecord {
    GradeRecord {
        submission_id: Uuid::new_v4(),
        student_identifier: student.to_string(),
        score,
        grader_id,
        grader_email: format!("{}@example.com", &grader_id.to_string()[..8]),
        rubric_breakdown: if breakdown.is_empty() {
            None
        } else {
            Some(RubricBreakdown {
                criteria: breakdown
                    .iter()
                    .map(|(name, points)| (name.to_string(), *points))
                    .collect(),
            })
        },
    }
}

/// Twenty grades from three graders: one steady, one far below the cohort,
/// one with a single very high mark. Correctness is scored inconsistently.
fn mixed_cohort() -> (Vec<GradeRecord>, Uuid, Uuid) {
    let steady = Uuid::new_v4();
    let harsh = Uuid::new_v4();
    let lenient = Uuid::new_v4();
    let mut grades = Vec::new();
    let steady_scores = [74.0, 76.0, 75.0, 73.0, 77.0, 75.0, 74.0, 76.0];
    for (index, score) in steady_scores.iter().chain(steady_scores.iter()).enumerate() {
        grades.push(grade(
            &format!("steady-{index}"),
            *score,
            steady,
            &[("Correctness", 40.0), ("Style", score - 40.0)],
        ));
    }
    grades.push(grade("harsh-0", 30.0, harsh, &[("Correctness", 5.0), ("Style", 25.0)]));
    grades.push(grade("harsh-1", 32.0, harsh, &[("Correctness", 6.0), ("Style", 26.0)]));
    grades.push(grade("harsh-2", 31.0, harsh, &[]));
    grades.push(grade("lenient-0", 100.0, lenient, &[("Correctness", 60.0), ("Style", 40.0)]));
    (grades, harsh, lenient)
}

#[test]
fn mixed_cohort_surfaces_every_kind_of_anomaly() {
    let (grades, harsh, lenient) = mixed_cohort();
    let report = analyze(Uuid::new_v4(), &grades, &AnalysisConfig::default()).unwrap();

    assert_eq!(report.total_grades, 20);

    let harsh_row = report
        .ta_severity
        .iter()
        .find(|row| row.grader_id == harsh)
        .unwrap();
    assert_eq!(harsh_row.severity, GraderSeverity::TooHarsh);
    assert!(harsh_row.deviation < -1.5);
    assert_eq!(harsh_row.grade_count, 3);
    let lenient_row = report
        .ta_severity
        .iter()
        .find(|row| row.grader_id == lenient)
        .unwrap();
    assert_eq!(lenient_row.severity, GraderSeverity::TooLenient);
    assert!(lenient_row.deviation > 1.5);

    let outliers: Vec<&str> = report
        .outliers
        .iter()
        .map(|o| o.student_identifier.as_str())
        .collect();
    assert_eq!(outliers, vec!["harsh-0", "harsh-1", "harsh-2"]);
    assert!(report.outliers.iter().all(|o| o.z_score < -2.0));

    let correctness = report
        .criterion_issues
        .iter()
        .find(|issue| issue.criterion_name == "Correctness")
        .unwrap();
    let expected: Vec<Uuid> = [16, 17, 19].iter().map(|&i| grades[i].submission_id).collect();
    assert_eq!(correctness.inconsistent_submission_ids, expected);
    assert!(report
        .criterion_issues
        .iter()
        .all(|issue| issue.criterion_name != "Style"));

    let top = &report.regrade_risks[0];
    assert_eq!(top.student_identifier, "harsh-0");
    assert_eq!(top.risk_score, 75);
    assert_eq!(
        top.risk_factors,
        vec!["unusually_low_score", "harsh_grader", "very_low_score"]
    );
    let last = report.regrade_risks.last().unwrap();
    assert_eq!(last.student_identifier, "lenient-0");
    assert_eq!(last.risk_factors, vec!["lenient_grader"]);
    assert!(report
        .regrade_risks
        .windows(2)
        .all(|pair| pair[0].risk_score >= pair[1].risk_score));
    assert!(report.regrade_risks.iter().all(|r| r.risk_score > 0 && r.risk_score <= 100));
}

#[test]
fn repeated_analysis_is_identical() {
    let (grades, _, _) = mixed_cohort();
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let assignment = Uuid::new_v4();
    let config = AnalysisConfig::default();

    let first = analyze_at(assignment, &grades, &config, at).unwrap();
    let second = analyze_at(assignment, &grades, &config, at).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn harsh_low_outlier_near_boundary_is_capped_at_100() {
    let (mut grades, harsh, _) = mixed_cohort();
    grades[16].score = 29.0;
    let config = AnalysisConfig {
        boundaries: vec![30.0, 60.0, 70.0, 80.0, 90.0],
        ..AnalysisConfig::default()
    };
    let report = analyze(Uuid::new_v4(), &grades, &config).unwrap();

    let row = report
        .regrade_risks
        .iter()
        .find(|r| r.student_identifier == "harsh-0")
        .unwrap();
    assert_eq!(row.grader_id, harsh);
    assert_eq!(row.risk_score, 100);
    assert_eq!(
        row.risk_factors,
        vec![
            "unusually_low_score",
            "harsh_grader",
            "near_boundary_30",
            "very_low_score"
        ]
    );
}

#[test]
fn report_round_trips_through_json() {
    let (grades, _, _) = mixed_cohort();
    let report = analyze(Uuid::new_v4(), &grades, &AnalysisConfig::default()).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert!(json["ta_severity"].is_array());
    assert!(json["criterion_issues"].is_array());
    assert_eq!(json["ta_severity"][0]["severity"], "too_harsh");

    let decoded: grading_anomaly::AnomalyReport = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, report);
}
