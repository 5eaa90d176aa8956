//! Scoring configuration
//!
//! The question weights and the tier thresholds are calibrated against each
//! other, so they live in one versioned object. Changing the table without
//! bumping `version` silently reclassifies every future assessment.

use crate::error::AssessmentError;
use crate::types::RiskLevel;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Version string of the built-in Danger Assessment table
pub const DEFAULT_CONFIG_VERSION: &str = "danger-assessment.v1";

/// Largest weight a single question may carry
pub const MAX_QUESTION_WEIGHT: u32 = 100;

/// A questionnaire entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentQuestion {
    pub id: String,
    pub text: String,
    /// Points added when answered `true`
    pub weight: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

/// Lower bounds (inclusive) of the three upper tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub increased: u32,
    pub severe: u32,
    pub extreme: u32,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            increased: 8,
            severe: 14,
            extreme: 18,
        }
    }
}

impl RiskThresholds {
    /// Map a score onto its tier using half-open intervals
    pub fn classify(&self, score: u32) -> RiskLevel {
        if score < self.increased {
            RiskLevel::Variable
        } else if score < self.severe {
            RiskLevel::Increased
        } else if score < self.extreme {
            RiskLevel::Severe
        } else {
            RiskLevel::Extreme
        }
    }
}

/// Presentation text attached to a tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierGuidance {
    pub interpretation: String,
    pub recommendations: Vec<String>,
}

impl TierGuidance {
    fn new(interpretation: &str, recommendations: &[&str]) -> Self {
        Self {
            interpretation: interpretation.to_string(),
            recommendations: recommendations.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// Guidance for every tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable {
    pub variable: TierGuidance,
    pub increased: TierGuidance,
    pub severe: TierGuidance,
    pub extreme: TierGuidance,
}

impl TierTable {
    pub fn get(&self, level: RiskLevel) -> &TierGuidance {
        match level {
            RiskLevel::Variable => &self.variable,
            RiskLevel::Increased => &self.increased,
            RiskLevel::Severe => &self.severe,
            RiskLevel::Extreme => &self.extreme,
        }
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            variable: TierGuidance::new(
                "Your current risk level is variable. While some risk factors are present, they may not indicate immediate danger.",
                &[
                    "Consider creating a safety plan",
                    "Save emergency contact numbers",
                    "Stay connected with trusted friends or family",
                    "Document any concerning incidents",
                ],
            ),
            increased: TierGuidance::new(
                "Your assessment indicates an increased risk level. This suggests the presence of several concerning factors.",
                &[
                    "Create or review your safety plan",
                    "Share your situation with trusted people",
                    "Save emergency contacts in your phone",
                    "Consider reaching out to support services",
                    "Keep important documents in a safe place",
                ],
            ),
            severe: TierGuidance::new(
                "Your assessment indicates a severe risk level. Multiple serious risk factors are present.",
                &[
                    "Prioritize your safety plan",
                    "Connect with domestic violence support services",
                    "Consider legal protection options",
                    "Ensure you have a safe place to go if needed",
                    "Keep emergency numbers readily available",
                    "Share your safety plan with trusted people",
                ],
            ),
            extreme: TierGuidance::new(
                "Your assessment indicates an extreme risk level. Immediate safety planning is strongly recommended.",
                &[
                    "Contact domestic violence support services immediately",
                    "Consider seeking legal protection",
                    "Review and implement your safety plan",
                    "Connect with trusted support people",
                    "Keep emergency numbers accessible",
                    "Consider temporary alternative accommodation",
                    "Document all incidents",
                ],
            ),
        }
    }
}

/// Versioned pairing of the question table with its thresholds and guidance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub version: String,
    pub questions: Vec<AssessmentQuestion>,
    pub thresholds: RiskThresholds,
    pub tiers: TierTable,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_CONFIG_VERSION.to_string(),
            questions: default_questions(),
            thresholds: RiskThresholds::default(),
            tiers: TierTable::default(),
        }
    }
}

impl ScoringConfig {
    /// Highest reachable score: every question answered `true`
    ///
    /// Saturates at `u32::MAX`; [`ScoringConfig::validate`] rejects tables where that matters.
    pub fn max_score(&self) -> u32 {
        self.total_weight().unwrap_or(u32::MAX)
    }

    /// Sum of all weights, or `None` if it does not fit in `u32`
    fn total_weight(&self) -> Option<u32> {
        self.questions
            .iter()
            .try_fold(0u32, |acc, q| acc.checked_add(q.weight))
    }

    pub fn question(&self, id: &str) -> Option<&AssessmentQuestion> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Check the table is internally consistent
    pub fn validate(&self) -> Result<(), AssessmentError> {
        if self.questions.is_empty() {
            return Err(AssessmentError::InvalidConfig(
                "question table is empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for question in &self.questions {
            if !seen.insert(question.id.as_str()) {
                return Err(AssessmentError::InvalidConfig(format!(
                    "duplicate question id '{}'",
                    question.id
                )));
            }
            if question.weight == 0 {
                return Err(AssessmentError::InvalidConfig(format!(
                    "question '{}' has zero weight",
                    question.id
                )));
            }
            if question.weight > MAX_QUESTION_WEIGHT {
                return Err(AssessmentError::InvalidConfig(format!(
                    "question '{}' weight {} exceeds {}",
                    question.id, question.weight, MAX_QUESTION_WEIGHT
                )));
            }
        }

        let t = &self.thresholds;
        if t.increased == 0 || t.increased >= t.severe || t.severe >= t.extreme {
            return Err(AssessmentError::InvalidConfig(format!(
                "thresholds must satisfy 0 < increased < severe < extreme, got {}/{}/{}",
                t.increased, t.severe, t.extreme
            )));
        }

        let max = self.total_weight().ok_or_else(|| {
            AssessmentError::InvalidConfig("total question weight overflows".to_string())
        })?;
        if t.extreme > max {
            return Err(AssessmentError::InvalidConfig(format!(
                "extreme threshold {} exceeds max score {}",
                t.extreme, max
            )));
        }

        for level in RiskLevel::ALL {
            if self.tiers.get(level).recommendations.is_empty() {
                return Err(AssessmentError::InvalidConfig(format!(
                    "tier '{level}' has no recommendations"
                )));
            }
        }

        Ok(())
    }

    /// Load and validate a config from JSON
    pub fn from_json(json: &str) -> Result<Self, AssessmentError> {
        let config: ScoringConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn question(id: &str, text: &str, weight: u32, help_text: &str) -> AssessmentQuestion {
    AssessmentQuestion {
        id: id.to_string(),
        text: text.to_string(),
        weight,
        help_text: Some(help_text.to_string()),
    }
}

/// The Danger Assessment questionnaire
pub fn default_questions() -> Vec<AssessmentQuestion> {
    vec![
        question(
            "1",
            "Has the physical violence increased in frequency over the past year?",
            1,
            "Consider how often incidents occur compared to previous years",
        ),
        question(
            "2",
            "Has the physical violence increased in severity over the past year?",
            1,
            "Think about whether incidents have become more intense or dangerous",
        ),
        question(
            "3",
            "Does your partner own a gun?",
            2,
            "Consider any firearms they have access to",
        ),
        question(
            "4",
            "Have you left them after living together during the past year?",
            1,
            "Include any separations, even temporary ones",
        ),
        question(
            "5",
            "Is your partner unemployed?",
            1,
            "Consider their current employment status",
        ),
        question(
            "6",
            "Has your partner ever used a weapon against you or threatened you with a weapon?",
            3,
            "Include any type of weapon or object used as a weapon",
        ),
        question(
            "7",
            "Has your partner ever threatened to kill you?",
            3,
            "Include both direct and indirect threats",
        ),
        question(
            "8",
            "Has your partner ever tried to choke/strangle you?",
            3,
            "Include any attempts to restrict breathing",
        ),
        question(
            "9",
            "Does your partner use drugs?",
            1,
            "Consider illegal drugs or misuse of prescription medications",
        ),
        question(
            "10",
            "Does your partner have an alcohol problem?",
            1,
            "Consider if alcohol affects their behavior or daily life",
        ),
        question(
            "11",
            "Does your partner control most or all of your daily activities?",
            2,
            "Think about decisions regarding friends, family, money, or going places",
        ),
        question(
            "12",
            "Is your partner violently and constantly jealous of you?",
            2,
            "Consider possessive behaviors and accusations",
        ),
        question(
            "13",
            "Has your partner ever beaten you while you were pregnant?",
            3,
            "Include any physical violence during pregnancy",
        ),
        question(
            "14",
            "Has your partner ever threatened or tried to commit suicide?",
            2,
            "Include both threats and attempts",
        ),
        question(
            "15",
            "Does your partner threaten to harm your children?",
            2,
            "Include any threats of physical or emotional harm",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ScoringConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.questions.len(), 15);
        assert_eq!(config.version, DEFAULT_CONFIG_VERSION);
    }

    #[test]
    fn test_max_score_tracks_weight_table() {
        let config = ScoringConfig::default();
        let summed: u32 = default_questions().iter().map(|q| q.weight).sum();
        assert_eq!(config.max_score(), summed);
        assert_eq!(config.max_score(), 28);
        // The top tier must be reachable from the same table
        assert!(config.thresholds.extreme <= config.max_score());
        assert_eq!(
            config.thresholds.classify(config.max_score()),
            RiskLevel::Extreme
        );
    }

    #[test]
    fn test_threshold_boundaries() {
        let t = RiskThresholds::default();
        assert_eq!(t.classify(0), RiskLevel::Variable);
        assert_eq!(t.classify(7), RiskLevel::Variable);
        assert_eq!(t.classify(8), RiskLevel::Increased);
        assert_eq!(t.classify(13), RiskLevel::Increased);
        assert_eq!(t.classify(14), RiskLevel::Severe);
        assert_eq!(t.classify(17), RiskLevel::Severe);
        assert_eq!(t.classify(18), RiskLevel::Extreme);
        assert_eq!(t.classify(28), RiskLevel::Extreme);
    }

    #[test]
    fn test_every_tier_has_guidance() {
        let tiers = TierTable::default();
        for level in RiskLevel::ALL {
            let guidance = tiers.get(level);
            assert!(!guidance.interpretation.is_empty());
            assert!(!guidance.recommendations.is_empty());
        }
        assert_eq!(tiers.extreme.recommendations.len(), 7);
    }

    #[test]
    fn test_validate_rejects_unreachable_threshold() {
        let mut config = ScoringConfig::default();
        config.thresholds.extreme = config.max_score() + 1;
        assert!(matches!(
            config.validate(),
            Err(AssessmentError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_oversized_weight_rejected_without_panic() {
        let mut config = ScoringConfig::default();
        config.questions[0].weight = u32::MAX;
        let json = serde_json::to_string(&config).unwrap();

        let err = ScoringConfig::from_json(&json).unwrap_err();
        assert!(matches!(err, AssessmentError::InvalidConfig(_)));
        assert_eq!(config.max_score(), u32::MAX);
    }

    #[test]
    fn test_weight_cap_is_inclusive() {
        let mut config = ScoringConfig::default();
        config.questions[0].weight = MAX_QUESTION_WEIGHT;
        assert!(config.validate().is_ok());

        config.questions[0].weight = MAX_QUESTION_WEIGHT + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unordered_thresholds() {
        let mut config = ScoringConfig::default();
        config.thresholds = RiskThresholds {
            increased: 14,
            severe: 8,
            extreme: 18,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let mut config = ScoringConfig::default();
        config.questions[1].id = "1".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate question id"));
    }

    #[test]
    fn test_json_roundtrip_revalidates() {
        let config = ScoringConfig::default();
        let json = config.to_json().unwrap();
        let loaded = ScoringConfig::from_json(&json).unwrap();
        assert_eq!(loaded, config);

        let mut broken = config.clone();
        broken.questions.clear();
        let json = serde_json::to_string(&broken).unwrap();
        assert!(ScoringConfig::from_json(&json).is_err());
    }
}
