use std::collections::BTreeMap;

use crate::classifier::ClassifierGateway;
pub use crate::models::MODEL_NOT_LOADED;
use crate::models::{
    Recommendation, RecommendationKind, StudentSnapshot, STRUGGLE_LABEL, SUCCEED_LABEL,
};

pub const RISK_THRESHOLD: f64 = 0.5;
pub const DECLINING_TREND: f64 = -10.0;
pub const IMPROVING_TREND: f64 = 10.0;
pub const CONCEPT_MASTERY_FLOOR: f64 = 50.0;
pub const GUESSING_SECONDS: f64 = 30.0;

/// Picks the recommendation branch. Conditions are checked in order and the
/// first match wins.
pub fn classify(snapshot: &StudentSnapshot, struggle_probability: f64) -> RecommendationKind {
    let trend = snapshot.trend();

    if struggle_probability > RISK_THRESHOLD {
        if trend < DECLINING_TREND {
            RecommendationKind::DecliningScores
        } else if snapshot.concepts_mastered < CONCEPT_MASTERY_FLOOR {
            RecommendationKind::ConceptualGap
        } else if snapshot.avg_time_per_question_seconds < GUESSING_SECONDS {
            RecommendationKind::GuessingPattern
        } else {
            RecommendationKind::GeneralDifficulty
        }
    } else if trend > IMPROVING_TREND {
        RecommendationKind::FastTrack
    } else {
        RecommendationKind::SteadyProgress
    }
}

pub fn recommend(snapshot: &StudentSnapshot, struggle_probability: f64) -> Recommendation {
    let kind = classify(snapshot, struggle_probability);

    let mut confidence = BTreeMap::new();
    confidence.insert(STRUGGLE_LABEL.to_string(), struggle_probability);
    confidence.insert(SUCCEED_LABEL.to_string(), 1.0 - struggle_probability);

    Recommendation {
        kind,
        message: kind.message(),
        confidence,
    }
}

pub fn model_unavailable() -> Recommendation {
    let kind = RecommendationKind::ModelUnavailable;
    Recommendation {
        kind,
        message: kind.message(),
        confidence: BTreeMap::new(),
    }
}

/// Scores the snapshot and maps it to a recommendation, falling back to the
/// fixed "model not loaded" message when the gateway cannot score.
pub fn personalize(gateway: &dyn ClassifierGateway, snapshot: &StudentSnapshot) -> Recommendation {
    match gateway.predict_struggle_probability(snapshot) {
        Ok(prediction) => recommend(snapshot, prediction.p_struggle),
        Err(err) => {
            tracing::warn!(error = %err, "falling back to model-unavailable recommendation");
            model_unavailable()
        }
    }
}
