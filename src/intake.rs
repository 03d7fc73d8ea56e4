use std::io::Read;
use std::path::Path;

use anyhow::Context;
use uuid::Uuid;

use crate::models::{StudentRow, StudentSnapshot};

#[derive(serde::Deserialize)]
struct CsvRow {
    student_id: Option<Uuid>,
    name: String,
    quiz_1_score: f64,
    quiz_2_score: f64,
    platform_engagement_days: f64,
    concepts_mastered: f64,
    #[serde(alias = "avg_time_per_question")]
    avg_time_per_question_seconds: f64,
}

pub fn read_snapshots(csv_path: &Path) -> anyhow::Result<Vec<StudentRow>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    read_snapshots_from(file)
}

pub fn read_snapshots_from<R: Read>(source: R) -> anyhow::Result<Vec<StudentRow>> {
    let mut reader = csv::Reader::from_reader(source);
    let mut students = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid student row {}", index + 1))?;
        let snapshot = StudentSnapshot {
            quiz_1_score: row.quiz_1_score,
            quiz_2_score: row.quiz_2_score,
            platform_engagement_days: row.platform_engagement_days,
            concepts_mastered: row.concepts_mastered,
            avg_time_per_question_seconds: row.avg_time_per_question_seconds,
        };

        let out_of_range = snapshot.out_of_range_fields();
        if !out_of_range.is_empty() {
            tracing::warn!(student = %row.name, fields = ?out_of_range, "values outside form ranges");
        }

        students.push(StudentRow {
            student_id: row.student_id.unwrap_or_else(Uuid::new_v4),
            name: row.name,
            snapshot,
        });
    }

    tracing::debug!(count = students.len(), "read student snapshots");
    Ok(students)
}
