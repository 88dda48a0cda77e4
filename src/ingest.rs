use std::path::Path;

use anyhow::Context;
use uuid::Uuid;

use crate::criteria;
use crate::models::GradeRecord;

#[derive(Debug, serde::Deserialize)]
pub struct GradeRow {
    pub submission_id: Uuid,
    pub student_identifier: String,
    pub score: f64,
    pub grader_id: Uuid,
    pub grader_email: String,
    #[serde(default)]
    pub rubric_breakdown: Option<String>,
}

impl GradeRow {
    pub fn into_record(self) -> GradeRecord {
        let rubric_breakdown = self
            .rubric_breakdown
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .and_then(|raw| {
                let parsed = criteria::parse_breakdown(raw);
                if parsed.is_none() {
                    tracing::debug!(
                        submission_id = %self.submission_id,
                        "ignoring malformed rubric breakdown"
                    );
                }
                parsed
            });

        GradeRecord {
            submission_id: self.submission_id,
            student_identifier: self.student_identifier,
            score: self.score,
            grader_id: self.grader_id,
            grader_email: self.grader_email,
            rubric_breakdown,
        }
    }
}

/// Reads raw rows from a grade CSV, preserving row order.
///
/// Expected header: `submission_id,student_identifier,score,grader_id,grader_email,rubric_breakdown`
/// where `rubric_breakdown` is an optional JSON object.
pub fn read_rows(csv_path: &Path) -> anyhow::Result<Vec<GradeRow>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut rows = Vec::new();

    for (index, result) in reader.deserialize::<GradeRow>().enumerate() {
        // Line 1 is the header.
        let row = result.with_context(|| format!("invalid grade on line {}", index + 2))?;
        rows.push(row);
    }

    Ok(rows)
}

pub fn read_grades_csv(csv_path: &Path) -> anyhow::Result<Vec<GradeRecord>> {
    let grades: Vec<GradeRecord> = read_rows(csv_path)?
        .into_iter()
        .map(GradeRow::into_record)
        .collect();

    tracing::debug!(count = grades.len(), path = %csv_path.display(), "loaded grades from csv");
    Ok(grades)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "submission_id,student_identifier,score,grader_id,grader_email,rubric_breakdown";

    fn write_csv(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        write!(file, "{body}").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_rows_with_and_without_breakdown() {
        let file = write_csv(concat!(
            "6f1c2a8e-5d7b-4c1e-9a3f-0b2d4e6f8a10,avery,88.5,1b9d6bcd-bbfd-4b2d-9b5d-ab8dfbbd4bed,ta1@example.com,\"{\"\"Logic\"\": 60, \"\"Style\"\": 28.5}\"\n",
            "7a2d3b9f-6e8c-4d2f-8b4a-1c3e5f7a9b21,jules,71,1b9d6bcd-bbfd-4b2d-9b5d-ab8dfbbd4bed,ta1@example.com,\n",
            "8b3e4cab-7f9d-4e3a-9c5b-2d4f6a8b0c32,kiara,64,2c8e7cde-ccfe-4c3e-8c6e-bc9efccee5fc,ta2@example.com,not-json\n",
        ));

        let grades = read_grades_csv(file.path()).unwrap();

        assert_eq!(grades.len(), 3);
        assert_eq!(grades[0].student_identifier, "avery");
        assert_eq!(grades[0].score, 88.5);
        let breakdown = grades[0].rubric_breakdown.as_ref().unwrap();
        assert_eq!(
            breakdown.criteria,
            vec![("Logic".to_string(), 60.0), ("Style".to_string(), 28.5)]
        );
        assert!(grades[1].rubric_breakdown.is_none());
        assert!(grades[2].rubric_breakdown.is_none());
        assert_eq!(grades[2].grader_email, "ta2@example.com");
    }

    #[test]
    fn bad_score_names_the_line() {
        let file = write_csv(
            "6f1c2a8e-5d7b-4c1e-9a3f-0b2d4e6f8a10,avery,eighty,1b9d6bcd-bbfd-4b2d-9b5d-ab8dfbbd4bed,ta1@example.com,\n",
        );

        let err = read_grades_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
