//! Weighted-sum scoring
//!
//! The score is the sum of the weights of every question answered `true`.
//! Answers are never negative-weighted, so no answer can lower the score.
//! Ids absent from the question table are ignored.

use crate::config::{RiskThresholds, ScoringConfig};
use crate::types::{Answers, AssessmentResult, ContributingFactor, RiskLevel};

/// Pure scorer over a [`ScoringConfig`]
pub struct Scorer;

impl Scorer {
    /// Sum the weights of every question answered `true`
    pub fn score(config: &ScoringConfig, answers: &Answers) -> u32 {
        config
            .questions
            .iter()
            .filter(|q| answers.get(&q.id).copied().unwrap_or(false))
            .fold(0u32, |acc, q| acc.saturating_add(q.weight))
    }

    pub fn classify(thresholds: &RiskThresholds, score: u32) -> RiskLevel {
        thresholds.classify(score)
    }

    /// Score the answers and attach the tier's guidance
    pub fn evaluate(config: &ScoringConfig, answers: &Answers) -> AssessmentResult {
        let score = Self::score(config, answers);
        let risk_level = Self::classify(&config.thresholds, score);
        let guidance = config.tiers.get(risk_level);

        AssessmentResult {
            score,
            risk_level,
            interpretation: guidance.interpretation.clone(),
            recommendations: guidance.recommendations.clone(),
        }
    }

    /// Questions that added to the score, in table order
    pub fn contributing_factors(
        config: &ScoringConfig,
        answers: &Answers,
    ) -> Vec<ContributingFactor> {
        config
            .questions
            .iter()
            .filter(|q| answers.get(&q.id).copied().unwrap_or(false))
            .map(|q| ContributingFactor {
                question_id: q.id.clone(),
                text: q.text.clone(),
                weight: q.weight,
            })
            .collect()
    }
}
