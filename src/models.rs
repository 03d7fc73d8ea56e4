use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

/// Feature names in the order the classifier was trained on.
pub const FEATURE_COLUMNS: [&str; 5] = [
    "quiz_1_score",
    "quiz_2_score",
    "platform_engagement_days",
    "concepts_mastered",
    "avg_time_per_question_seconds",
];

pub const STRUGGLE_LABEL: &str = "Struggle";
pub const SUCCEED_LABEL: &str = "Succeed";

pub const MODEL_NOT_LOADED: &str = "Model not loaded. Check the console.";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudentSnapshot {
    pub quiz_1_score: f64,
    pub quiz_2_score: f64,
    pub platform_engagement_days: f64,
    pub concepts_mastered: f64,
    pub avg_time_per_question_seconds: f64,
}

impl Default for StudentSnapshot {
    fn default() -> Self {
        Self {
            quiz_1_score: 70.0,
            quiz_2_score: 80.0,
            platform_engagement_days: 15.0,
            concepts_mastered: 55.0,
            avg_time_per_question_seconds: 45.0,
        }
    }
}

impl StudentSnapshot {
    pub fn trend(&self) -> f64 {
        self.quiz_2_score - self.quiz_1_score
    }

    pub fn feature_vector(&self) -> [f64; 5] {
        [
            self.quiz_1_score,
            self.quiz_2_score,
            self.platform_engagement_days,
            self.concepts_mastered,
            self.avg_time_per_question_seconds,
        ]
    }

    /// Names of fields outside the ranges the input form allows.
    pub fn out_of_range_fields(&self) -> Vec<&'static str> {
        const RANGES: [(f64, f64); 5] = [
            (0.0, 100.0),
            (0.0, 100.0),
            (1.0, 30.0),
            (0.0, 100.0),
            (10.0, 180.0),
        ];

        self.feature_vector()
            .iter()
            .zip(RANGES.iter())
            .zip(FEATURE_COLUMNS.iter())
            .filter(|((value, (min, max)), _)| !(*min..=*max).contains(*value))
            .map(|(_, name)| *name)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionResult {
    pub p_struggle: f64,
    pub p_succeed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    DecliningScores,
    ConceptualGap,
    GuessingPattern,
    GeneralDifficulty,
    FastTrack,
    SteadyProgress,
    ModelUnavailable,
}

impl RecommendationKind {
    pub fn is_at_risk(self) -> bool {
        matches!(
            self,
            Self::DecliningScores
                | Self::ConceptualGap
                | Self::GuessingPattern
                | Self::GeneralDifficulty
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::DecliningScores => "declining scores",
            Self::ConceptualGap => "conceptual gap",
            Self::GuessingPattern => "guessing pattern",
            Self::GeneralDifficulty => "general difficulty",
            Self::FastTrack => "fast track",
            Self::SteadyProgress => "steady progress",
            Self::ModelUnavailable => "model unavailable",
        }
    }

    /// Trend line and action; `None` only for `ModelUnavailable`.
    fn guidance(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::DecliningScores => Some((
                "Declining scores.",
                "Review previous material before moving forward.",
            )),
            Self::ConceptualGap => Some((
                "Core concepts not mastered.",
                "Focus on conceptual understanding with targeted exercises.",
            )),
            Self::GuessingPattern => Some((
                "Quick guessing observed.",
                "Slow down and prioritize accuracy.",
            )),
            Self::GeneralDifficulty => Some((
                "General difficulty detected.",
                "Suggested 15-min review of last topics.",
            )),
            Self::FastTrack => Some(("Improving scores!", "Fast-track next module.")),
            Self::SteadyProgress => Some(("Consistent understanding.", "Proceed to next module.")),
            Self::ModelUnavailable => None,
        }
    }

    pub fn action(self) -> Option<&'static str> {
        self.guidance().map(|(_, action)| action)
    }

    pub fn message(self) -> String {
        let Some((trend, action)) = self.guidance() else {
            return MODEL_NOT_LOADED.to_string();
        };

        let headline = if self.is_at_risk() {
            "⚠️ **High Risk of Struggling**"
        } else {
            "✅ **Ready to Advance!**"
        };
        format!("{headline}\n\n**Trend:** {trend}\n**Action:** {action}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub message: String,
    /// Keyed by outcome label; empty when no model is loaded.
    pub confidence: BTreeMap<String, f64>,
}

impl Recommendation {
    pub fn struggle_probability(&self) -> Option<f64> {
        self.confidence.get(STRUGGLE_LABEL).copied()
    }
}

#[derive(Debug, Clone)]
pub struct StudentRow {
    pub student_id: Uuid,
    pub name: String,
    pub snapshot: StudentSnapshot,
}

#[derive(Debug, Clone)]
pub struct ScoredStudent {
    pub student_id: Uuid,
    pub name: String,
    pub snapshot: StudentSnapshot,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone)]
pub struct KindSummary {
    pub kind: RecommendationKind,
    pub count: usize,
    pub avg_struggle: Option<f64>,
}
