//! Assessment report encoding
//!
//! This module packages a result with the context needed to explain it: the
//! questions that scored, the incident log and display colors. Reports carry
//! producer metadata so a host can tell which engine build produced them.

use crate::engine::DangerAssessmentEngine;
use crate::error::AssessmentError;
use crate::palette::{risk_level_color, severity_color};
use crate::types::{AssessmentResult, ContributingFactor, IncidentRecord};
use crate::{PRODUCER_NAME, SAFEGUARD_VERSION};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Incident entry with its display color
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportIncident {
    #[serde(flatten)]
    pub incident: IncidentRecord,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub config_version: String,
    pub max_score: u32,
    pub result: AssessmentResult,
    pub risk_color: String,
    pub contributing_factors: Vec<ContributingFactor>,
    pub incidents: Vec<ReportIncident>,
}

/// Report encoder
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Build a report for `result` using the engine's table, answers and incidents
    pub fn encode(
        &self,
        engine: &DangerAssessmentEngine,
        result: &AssessmentResult,
    ) -> AssessmentReport {
        let incidents = engine
            .get_incidents()
            .into_iter()
            .map(|incident| ReportIncident {
                color: severity_color(incident.severity).to_string(),
                incident,
            })
            .collect();

        AssessmentReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: SAFEGUARD_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            config_version: engine.config().version.clone(),
            max_score: engine.max_score(),
            result: result.clone(),
            risk_color: risk_level_color(result.risk_level).to_string(),
            contributing_factors: engine.contributing_factors(),
            incidents,
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        engine: &DangerAssessmentEngine,
        result: &AssessmentResult,
    ) -> Result<String, AssessmentError> {
        let report = self.encode(engine, result);
        serde_json::to_string(&report).map_err(|e| AssessmentError::EncodingError(e.to_string()))
    }
}
