//! Core types for the danger assessment engine
//!
//! This module defines the records held by the engine (incidents, history
//! entries) and the derived result handed back to callers. Everything returned
//! across the public API is an owned copy.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Answer map keyed by question id. `true` means the risk-indicating answer was given.
pub type Answers = BTreeMap<String, bool>;

/// Lowest severity on the incident scale
pub const SEVERITY_MIN: i32 = 1;

/// Highest severity on the incident scale
pub const SEVERITY_MAX: i32 = 5;

/// Ordered risk tier derived from an assessment score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Variable,
    Increased,
    Severe,
    Extreme,
}

impl RiskLevel {
    /// All tiers in ascending order
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Variable,
        RiskLevel::Increased,
        RiskLevel::Severe,
        RiskLevel::Extreme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Variable => "variable",
            RiskLevel::Increased => "increased",
            RiskLevel::Severe => "severe",
            RiskLevel::Extreme => "extreme",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single logged incident
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Opaque identifier assigned at creation
    pub id: String,
    /// Calendar date the incident occurred (may be backdated)
    pub date: NaiveDate,
    /// Severity on the nominal 1-5 scale. Not validated.
    pub severity: i32,
    /// Free-text description
    pub description: String,
}

impl IncidentRecord {
    /// Whether the severity sits on the nominal 1-5 scale
    pub fn severity_in_range(&self) -> bool {
        (SEVERITY_MIN..=SEVERITY_MAX).contains(&self.severity)
    }
}

/// Partial update for an incident. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl IncidentUpdate {
    /// Merge the present fields into `incident`
    pub fn apply_to(&self, incident: &mut IncidentRecord) {
        if let Some(date) = self.date {
            incident.date = date;
        }
        if let Some(severity) = self.severity {
            incident.severity = severity;
        }
        if let Some(description) = &self.description {
            incident.description = description.clone();
        }
    }
}

/// Derived assessment outcome, computed on demand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub score: u32,
    pub risk_level: RiskLevel,
    pub interpretation: String,
    pub recommendations: Vec<String>,
}

/// Completed assessment retained in history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub id: String,
    /// When the assessment was saved
    pub date: DateTime<Utc>,
    pub score: u32,
    pub risk_level: RiskLevel,
    /// Copy of the incident log at save time
    pub incidents: Vec<IncidentRecord>,
    /// Version of the scoring table that produced `score`
    pub config_version: String,
}

/// A question answered `true`, with the weight it added to the score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributingFactor {
    pub question_id: String,
    pub text: String,
    pub weight: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incident(severity: i32) -> IncidentRecord {
        IncidentRecord {
            id: "a".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            severity,
            description: "first".to_string(),
        }
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Variable < RiskLevel::Increased);
        assert!(RiskLevel::Increased < RiskLevel::Severe);
        assert!(RiskLevel::Severe < RiskLevel::Extreme);
    }

    #[test]
    fn test_risk_level_serializes_lowercase() {
        let json = serde_json::to_string(&RiskLevel::Extreme).unwrap();
        assert_eq!(json, "\"extreme\"");
        assert_eq!(RiskLevel::Severe.to_string(), "severe");
    }

    #[test]
    fn test_partial_update_keeps_id_and_absent_fields() {
        let mut record = incident(2);
        let update = IncidentUpdate {
            severity: Some(4),
            ..Default::default()
        };
        update.apply_to(&mut record);

        assert_eq!(record.id, "a");
        assert_eq!(record.severity, 4);
        assert_eq!(record.description, "first");
    }

    #[test]
    fn test_update_deserializes_from_sparse_json() {
        let update: IncidentUpdate =
            serde_json::from_str(r#"{"description": "edited"}"#).unwrap();
        assert_eq!(update.description.as_deref(), Some("edited"));
        assert!(update.date.is_none());
        assert!(update.severity.is_none());
    }

    #[test]
    fn test_severity_range_check() {
        assert!(incident(1).severity_in_range());
        assert!(incident(5).severity_in_range());
        assert!(!incident(0).severity_in_range());
        assert!(!incident(9).severity_in_range());
    }
}
