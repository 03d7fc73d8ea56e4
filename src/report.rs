use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Write;

use chrono::NaiveDate;

use crate::classifier::ClassifierGateway;
use crate::models::{KindSummary, RecommendationKind, ScoredStudent, StudentRow};
use crate::recommend;

/// Scores every row and orders the batch by descending struggle probability.
/// Rows without a score (model unavailable) sort last.
pub fn score_batch(gateway: &dyn ClassifierGateway, rows: &[StudentRow]) -> Vec<ScoredStudent> {
    let mut scored: Vec<ScoredStudent> = rows
        .iter()
        .map(|row| ScoredStudent {
            student_id: row.student_id,
            name: row.name.clone(),
            snapshot: row.snapshot,
            recommendation: recommend::personalize(gateway, &row.snapshot),
        })
        .collect();

    scored.sort_by(|a, b| {
        match (
            a.recommendation.struggle_probability(),
            b.recommendation.struggle_probability(),
        ) {
            (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    scored
}

pub fn summarize_by_kind(scored: &[ScoredStudent]) -> Vec<KindSummary> {
    let mut map: HashMap<RecommendationKind, (usize, f64, usize)> = HashMap::new();

    for student in scored {
        let entry = map
            .entry(student.recommendation.kind)
            .or_insert((0, 0.0, 0));
        entry.0 += 1;
        if let Some(p) = student.recommendation.struggle_probability() {
            entry.1 += p;
            entry.2 += 1;
        }
    }

    let mut summaries: Vec<KindSummary> = map
        .into_iter()
        .map(|(kind, (count, total, scored_count))| KindSummary {
            kind,
            count,
            avg_struggle: if scored_count == 0 {
                None
            } else {
                Some(total / scored_count as f64)
            },
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then(a.kind.cmp(&b.kind)));
    summaries
}

pub fn build_report(label: Option<&str>, generated_on: NaiveDate, scored: &[ScoredStudent]) -> String {
    let summaries = summarize_by_kind(scored);

    let mut output = String::new();
    let cohort_label = label.unwrap_or("all students");

    let _ = writeln!(output, "# Learning Path Report");
    let _ = writeln!(
        output,
        "Generated for {} on {} ({} students)",
        cohort_label,
        generated_on,
        scored.len()
    );

    if scored
        .iter()
        .any(|s| s.recommendation.kind == RecommendationKind::ModelUnavailable)
    {
        let _ = writeln!(output);
        let _ = writeln!(output, "> {}", recommend::MODEL_NOT_LOADED);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommendation Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No students in this batch.");
    } else {
        for summary in summaries.iter() {
            match summary.avg_struggle {
                Some(avg) => {
                    let _ = writeln!(
                        output,
                        "- {}: {} students (avg struggle {:.0}%)",
                        summary.kind.label(),
                        summary.count,
                        avg * 100.0
                    );
                }
                None => {
                    let _ = writeln!(
                        output,
                        "- {}: {} students",
                        summary.kind.label(),
                        summary.count
                    );
                }
            }
        }
    }

    let at_risk: Vec<&ScoredStudent> = scored
        .iter()
        .filter(|s| s.recommendation.kind.is_at_risk())
        .collect();
    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Risk Students");

    if at_risk.is_empty() {
        let _ = writeln!(output, "No students at risk of struggling.");
    } else {
        for student in at_risk.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} (trend {:+.0}) struggle {:.0}%: {}",
                student.name,
                student.snapshot.trend(),
                student.recommendation.struggle_probability().unwrap_or_default() * 100.0,
                student.recommendation.kind.action().unwrap_or_default()
            );
        }
    }

    let ready: Vec<&ScoredStudent> = scored
        .iter()
        .filter(|s| {
            matches!(
                s.recommendation.kind,
                RecommendationKind::FastTrack | RecommendationKind::SteadyProgress
            )
        })
        .collect();
    let _ = writeln!(output);
    let _ = writeln!(output, "## Ready to Advance");

    if ready.is_empty() {
        let _ = writeln!(output, "No students ready to advance.");
    } else {
        for student in ready.iter() {
            let _ = writeln!(
                output,
                "- {} ({}): {}",
                student.name,
                student.recommendation.kind.label(),
                student.recommendation.kind.action().unwrap_or_default()
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassifierError;
    use crate::models::{PredictionResult, StudentSnapshot};
    use uuid::Uuid;

    /// Struggle probability taken from concepts mastered: 100 - concepts.
    struct ConceptGateway;

    impl ClassifierGateway for ConceptGateway {
        fn predict_struggle_probability(
            &self,
            snapshot: &StudentSnapshot,
        ) -> Result<PredictionResult, ClassifierError> {
            let p_struggle = (100.0 - snapshot.concepts_mastered) / 100.0;
            Ok(PredictionResult {
                p_struggle,
                p_succeed: 1.0 - p_struggle,
            })
        }
    }

    struct OfflineGateway;

    impl ClassifierGateway for OfflineGateway {
        fn predict_struggle_probability(
            &self,
            _snapshot: &StudentSnapshot,
        ) -> Result<PredictionResult, ClassifierError> {
            Err(ClassifierError::Unavailable)
        }
    }

    fn row(name: &str, quiz_1: f64, quiz_2: f64, concepts: f64) -> StudentRow {
        StudentRow {
            student_id: Uuid::new_v4(),
            name: name.to_string(),
            snapshot: StudentSnapshot {
                quiz_1_score: quiz_1,
                quiz_2_score: quiz_2,
                platform_engagement_days: 10.0,
                concepts_mastered: concepts,
                avg_time_per_question_seconds: 60.0,
            },
        }
    }

    fn cohort() -> Vec<StudentRow> {
        vec![
            row("Avery Lee", 70.0, 72.0, 80.0),
            row("Jules Moreno", 70.0, 50.0, 20.0),
            row("Kiara Patel", 60.0, 85.0, 90.0),
            row("Sam Ortiz", 70.0, 72.0, 40.0),
        ]
    }

    #[test]
    fn batch_is_ordered_by_struggle_probability() {
        let scored = score_batch(&ConceptGateway, &cohort());
        let names: Vec<&str> = scored.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Jules Moreno", "Sam Ortiz", "Avery Lee", "Kiara Patel"]);
        assert_eq!(
            scored[0].recommendation.kind,
            RecommendationKind::DecliningScores
        );
        assert_eq!(scored[1].recommendation.kind, RecommendationKind::ConceptualGap);
        assert_eq!(scored[3].recommendation.kind, RecommendationKind::FastTrack);
    }

    #[test]
    fn summaries_count_each_kind() {
        let scored = score_batch(&ConceptGateway, &cohort());
        let summaries = summarize_by_kind(&scored);
        assert_eq!(summaries.len(), 4);
        let steady = summaries
            .iter()
            .find(|s| s.kind == RecommendationKind::SteadyProgress)
            .unwrap();
        assert_eq!(steady.count, 1);
        assert!((steady.avg_struggle.unwrap() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn report_lists_sections() {
        let scored = score_batch(&ConceptGateway, &cohort());
        let date = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let report = build_report(Some("Spring 2026"), date, &scored);

        assert!(report.starts_with("# Learning Path Report\n"));
        assert!(report.contains("Generated for Spring 2026 on 2026-02-02 (4 students)"));
        assert!(report.contains("## Recommendation Mix"));
        assert!(report.contains("- Jules Moreno (trend -20) struggle 80%: Review previous material"));
        assert!(report.contains("## Ready to Advance"));
        assert!(report.contains("- Kiara Patel (fast track): Fast-track next module."));
        assert!(!report.contains(recommend::MODEL_NOT_LOADED));
    }

    #[test]
    fn offline_report_warns_and_lists_no_risk() {
        let scored = score_batch(&OfflineGateway, &cohort());
        assert!(scored
            .iter()
            .all(|s| s.recommendation.confidence.is_empty()));

        let date = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let report = build_report(None, date, &scored);
        assert!(report.contains("> Model not loaded. Check the console."));
        assert!(report.contains("- model unavailable: 4 students\n"));
        assert!(report.contains("No students at risk of struggling."));
        assert!(report.contains("No students ready to advance."));
    }

    #[test]
    fn empty_batch_report() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let report = build_report(None, date, &[]);
        assert!(report.contains("Generated for all students"));
        assert!(report.contains("No students in this batch."));
    }
}
