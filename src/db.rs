use anyhow::Context;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{criteria, ingest};
use crate::models::{AnomalyReport, GradeRecord, ReportStatus};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Loads every grade recorded for an assignment, oldest first.
pub async fn fetch_grades(pool: &PgPool, assignment_id: Uuid) -> anyhow::Result<Vec<GradeRecord>> {
    let records = sqlx::query(
        r#"
        SELECT submission_id, student_identifier, score, grader_id, grader_email, rubric_breakdown
        FROM grading_anomaly.grades
        WHERE assignment_id = $1
        ORDER BY graded_at, submission_id
        "#,
    )
    .bind(assignment_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to load grades for assignment {assignment_id}"))?;

    let mut grades = Vec::with_capacity(records.len());
    for row in records {
        let submission_id: Uuid = row.try_get("submission_id")?;
        let raw_breakdown: Option<String> = row.try_get("rubric_breakdown")?;
        let rubric_breakdown = raw_breakdown.as_deref().and_then(|raw| {
            let parsed = criteria::parse_breakdown(raw);
            if parsed.is_none() {
                tracing::debug!(%submission_id, "ignoring malformed rubric breakdown");
            }
            parsed
        });

        grades.push(GradeRecord {
            submission_id,
            student_identifier: row.try_get("student_identifier")?,
            score: row.try_get("score")?,
            grader_id: row.try_get("grader_id")?,
            grader_email: row.try_get("grader_email")?,
            rubric_breakdown,
        });
    }

    Ok(grades)
}

pub async fn import_grades(
    pool: &PgPool,
    assignment_id: Uuid,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    let rows = ingest::read_rows(csv_path)?;
    let mut inserted = 0usize;

    for row in rows {
        let result = sqlx::query(
            r#"
            INSERT INTO grading_anomaly.grades
            (submission_id, assignment_id, student_identifier, score, grader_id, grader_email, rubric_breakdown)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (assignment_id, submission_id) DO UPDATE
            SET score = EXCLUDED.score,
                grader_id = EXCLUDED.grader_id,
                grader_email = EXCLUDED.grader_email,
                rubric_breakdown = EXCLUDED.rubric_breakdown
            "#,
        )
        .bind(row.submission_id)
        .bind(assignment_id)
        .bind(&row.student_identifier)
        .bind(row.score)
        .bind(row.grader_id)
        .bind(&row.grader_email)
        .bind(row.rubric_breakdown.filter(|raw| !raw.trim().is_empty()))
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

/// New reports always start as pending.
pub async fn save_report(pool: &PgPool, report: &AnomalyReport) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO grading_anomaly.reports (id, assignment_id, status, report, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(report.assignment_id)
    .bind(ReportStatus::Pending.as_str())
    .bind(Json(report))
    .bind(report.generated_at)
    .execute(pool)
    .await
    .context("failed to store anomaly report")?;

    tracing::info!(report_id = %id, assignment_id = %report.assignment_id, "stored anomaly report");
    Ok(id)
}

pub async fn latest_report(
    pool: &PgPool,
    assignment_id: Uuid,
) -> anyhow::Result<Option<(ReportStatus, AnomalyReport)>> {
    let row = sqlx::query(
        r#"
        SELECT status, report
        FROM grading_anomaly.reports
        WHERE assignment_id = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(assignment_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let status: String = row.try_get("status")?;
    let status = status
        .parse::<ReportStatus>()
        .map_err(anyhow::Error::msg)?;
    let Json(report): Json<AnomalyReport> = row
        .try_get("report")
        .context("stored report could not be decoded")?;
    Ok(Some((status, report)))
}

/// Moves the latest report for an assignment to `status`. Returns false when
/// no report exists yet.
pub async fn set_status(
    pool: &PgPool,
    assignment_id: Uuid,
    status: ReportStatus,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE grading_anomaly.reports
        SET status = $2
        WHERE id = (
            SELECT id FROM grading_anomaly.reports
            WHERE assignment_id = $1
            ORDER BY created_at DESC
            LIMIT 1
        )
        "#,
    )
    .bind(assignment_id)
    .bind(status.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
