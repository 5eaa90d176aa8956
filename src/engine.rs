//! Assessment engine
//!
//! This module provides the public API for Safeguard Assess. One engine holds
//! the state of one user session: the answer map, the incident log and the
//! assessment history.
//!
//! Computing a result and recording it are separate steps
//! ([`DangerAssessmentEngine::compute_result`] and
//! [`DangerAssessmentEngine::save_assessment`]).
//! [`DangerAssessmentEngine::get_assessment_result`] does both, which is what
//! the questionnaire screen calls on completion.

use crate::config::{AssessmentQuestion, ScoringConfig};
use crate::error::AssessmentError;
use crate::persistence::{KeyValueStore, STATE_KEY};
use crate::scoring::Scorer;
use crate::store::{AssessmentHistory, IncidentStore};
use crate::types::{
    Answers, AssessmentRecord, AssessmentResult, ContributingFactor, IncidentRecord,
    IncidentUpdate,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Score an answer map with the default table (stateless, one-shot).
///
/// # Arguments
/// * `answers_json` - JSON object mapping question ids to booleans
///
/// # Returns
/// `AssessmentResult` as a JSON string
///
/// # Example
/// ```ignore
/// let result_json = assess_answers(r#"{"3": true, "6": true}"#)?;
/// ```
pub fn assess_answers(answers_json: &str) -> Result<String, AssessmentError> {
    let answers: Answers = serde_json::from_str(answers_json)
        .map_err(|e| AssessmentError::ParseError(format!("answer map: {e}")))?;
    let result = Scorer::evaluate(&ScoringConfig::default(), &answers);
    Ok(serde_json::to_string(&result)?)
}

/// Persisted working state and history
#[derive(Debug, Default, Serialize, Deserialize)]
struct EngineState {
    #[serde(default)]
    answers: Answers,
    #[serde(default)]
    incidents: IncidentStore,
    #[serde(default)]
    history: AssessmentHistory,
}

/// Stateful danger assessment for one user session
#[derive(Debug, Clone)]
pub struct DangerAssessmentEngine {
    config: ScoringConfig,
    answers: Answers,
    incidents: IncidentStore,
    history: AssessmentHistory,
}

impl Default for DangerAssessmentEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DangerAssessmentEngine {
    /// Create an engine with the built-in Danger Assessment table
    pub fn new() -> Self {
        Self {
            config: ScoringConfig::default(),
            answers: Answers::new(),
            incidents: IncidentStore::new(),
            history: AssessmentHistory::new(),
        }
    }

    /// Create an engine with a custom table. The table is validated first.
    pub fn with_config(config: ScoringConfig) -> Result<Self, AssessmentError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// The questionnaire, in display order
    pub fn questions(&self) -> &[AssessmentQuestion] {
        &self.config.questions
    }

    pub fn max_score(&self) -> u32 {
        self.config.max_score()
    }

    /// Record an answer. Unknown question ids are kept but never scored.
    pub fn set_answer(&mut self, question_id: &str, answer: bool) {
        if self.config.question(question_id).is_none() {
            tracing::debug!(question_id, "answer for unknown question stored, it will not score");
        }
        self.answers.insert(question_id.to_string(), answer);
    }

    /// Copy of the current answer map
    pub fn answers(&self) -> Answers {
        self.answers.clone()
    }

    pub fn add_incident(
        &mut self,
        date: NaiveDate,
        severity: i32,
        description: &str,
    ) -> IncidentRecord {
        let record = self.incidents.add(date, severity, description);
        tracing::debug!(id = %record.id, %date, severity, "incident added");
        record
    }

    /// Merge fields into an incident. Unknown ids are ignored.
    pub fn update_incident(&mut self, id: &str, update: IncidentUpdate) {
        if self.incidents.update(id, &update) {
            tracing::debug!(id, "incident updated");
        }
    }

    /// Remove an incident. Unknown ids are ignored.
    pub fn delete_incident(&mut self, id: &str) {
        if self.incidents.delete(id) {
            tracing::debug!(id, "incident deleted");
        }
    }

    /// Incidents, most recent first
    pub fn get_incidents(&self) -> Vec<IncidentRecord> {
        self.incidents.list()
    }

    /// Score the current answers without touching history
    pub fn compute_result(&self) -> AssessmentResult {
        Scorer::evaluate(&self.config, &self.answers)
    }

    /// Questions answered `true`, with the weight each added
    pub fn contributing_factors(&self) -> Vec<ContributingFactor> {
        Scorer::contributing_factors(&self.config, &self.answers)
    }

    /// Append `result` to history, stamped now
    pub fn save_assessment(&mut self, result: &AssessmentResult) -> AssessmentRecord {
        self.save_assessment_at(result, Utc::now())
    }

    /// Append `result` to history with an explicit save time
    pub fn save_assessment_at(
        &mut self,
        result: &AssessmentResult,
        at: DateTime<Utc>,
    ) -> AssessmentRecord {
        let record = AssessmentRecord {
            id: Uuid::new_v4().to_string(),
            date: at,
            score: result.score,
            risk_level: result.risk_level,
            incidents: self.incidents.snapshot(),
            config_version: self.config.version.clone(),
        };

        tracing::info!(
            id = %record.id,
            score = record.score,
            risk_level = %record.risk_level,
            incidents = record.incidents.len(),
            "assessment saved"
        );

        self.history.append(record.clone());
        record
    }

    /// Compute the result for the current answers and record it in history
    pub fn get_assessment_result(&mut self) -> AssessmentResult {
        let result = self.compute_result();
        self.save_assessment(&result);
        result
    }

    /// History, most recent first
    pub fn get_assessment_history(&self) -> Vec<AssessmentRecord> {
        self.history.list()
    }

    /// History entries saved within `[start, end]`
    pub fn get_assessments_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<AssessmentRecord> {
        self.history.in_range(start, end)
    }

    /// Drop the working answers and incidents. History is kept.
    pub fn clear_assessment(&mut self) {
        self.answers.clear();
        self.incidents.clear();
        tracing::debug!(history = self.history.len(), "working assessment cleared");
    }

    /// Serialize answers, incidents and history to JSON
    pub fn save_state(&self) -> Result<String, AssessmentError> {
        let state = EngineState {
            answers: self.answers.clone(),
            incidents: self.incidents.clone(),
            history: self.history.clone(),
        };
        serde_json::to_string(&state).map_err(|e| AssessmentError::EncodingError(e.to_string()))
    }

    /// Replace answers and incidents with a saved state and merge its history.
    ///
    /// History already held by this engine is never dropped: loaded records
    /// are placed ahead of it and ids already present are skipped.
    pub fn load_state(&mut self, json: &str) -> Result<(), AssessmentError> {
        let state: EngineState =
            serde_json::from_str(json).map_err(|e| AssessmentError::ParseError(e.to_string()))?;

        let drifted = state
            .history
            .records()
            .iter()
            .filter(|r| r.config_version != self.config.version)
            .count();
        if drifted > 0 {
            tracing::warn!(
                drifted,
                active = %self.config.version,
                "history contains scores from a different scoring table"
            );
        }

        self.answers = state.answers;
        self.incidents = state.incidents;
        let merged = self.history.merge_loaded(state.history);

        tracing::info!(
            incidents = self.incidents.len(),
            history = self.history.len(),
            merged,
            "assessment state loaded"
        );
        Ok(())
    }

    /// Write the state blob to the host store
    pub fn persist(&self, store: &mut dyn KeyValueStore) -> Result<(), AssessmentError> {
        let json = self.save_state()?;
        store.set_item(STATE_KEY, &json)
    }

    /// Load the state blob from the host store. Returns `false` if none was stored.
    pub fn restore(&mut self, store: &dyn KeyValueStore) -> Result<bool, AssessmentError> {
        match store.get_item(STATE_KEY)? {
            Some(json) => {
                self.load_state(&json)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::types::RiskLevel;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_assessment_is_variable() {
        let mut engine = DangerAssessmentEngine::new();
        let result = engine.get_assessment_result();

        assert_eq!(result.score, 0);
        assert_eq!(result.risk_level, RiskLevel::Variable);
        assert!(!result.recommendations.is_empty());
        assert_eq!(
            result.recommendations,
            engine.config().tiers.variable.recommendations
        );
    }

    #[test]
    fn test_reanswering_overwrites() {
        let mut engine = DangerAssessmentEngine::new();
        engine.set_answer("6", true);
        engine.set_answer("6", false);
        assert_eq!(engine.compute_result().score, 0);
        assert_eq!(engine.answers().len(), 1);
    }

    #[test]
    fn test_unknown_answer_stored_but_not_scored() {
        let mut engine = DangerAssessmentEngine::new();
        engine.set_answer("not-a-question", true);
        assert_eq!(engine.compute_result().score, 0);
        assert_eq!(engine.answers().get("not-a-question"), Some(&true));
    }

    #[test]
    fn test_result_is_deterministic() {
        let mut engine = DangerAssessmentEngine::new();
        engine.set_answer("3", true);
        engine.set_answer("7", true);

        let first = engine.get_assessment_result();
        let second = engine.get_assessment_result();
        assert_eq!(first.score, second.score);
        assert_eq!(first.risk_level, second.risk_level);
    }

    #[test]
    fn test_compute_result_does_not_touch_history() {
        let mut engine = DangerAssessmentEngine::new();
        engine.set_answer("8", true);
        engine.compute_result();
        assert!(engine.get_assessment_history().is_empty());
    }

    #[test]
    fn test_history_snapshots_incidents_at_call_time() {
        let mut engine = DangerAssessmentEngine::new();

        let first = engine.add_incident(day(2024, 1, 1), 2, "first");
        engine.get_assessment_result();

        engine.add_incident(day(2024, 2, 1), 3, "second");
        engine.set_answer("7", true);
        engine.get_assessment_result();

        engine.update_incident(
            &first.id,
            IncidentUpdate {
                description: Some("edited later".to_string()),
                ..Default::default()
            },
        );
        engine.delete_incident(&first.id);
        engine.get_assessment_result();

        let mut history = engine.get_assessment_history();
        assert_eq!(history.len(), 3);

        // restore append order for inspection
        history.reverse();
        assert_eq!(history[0].incidents.len(), 1);
        assert_eq!(history[0].incidents[0].description, "first");
        assert_eq!(history[0].score, 0);
        assert_eq!(history[1].incidents.len(), 2);
        assert_eq!(history[1].score, 3);
        assert_eq!(history[2].incidents.len(), 1);
        assert_eq!(history[2].incidents[0].description, "second");
    }

    #[test]
    fn test_incidents_ordered_most_recent_first() {
        let mut engine = DangerAssessmentEngine::new();
        engine.add_incident(day(2024, 1, 1), 1, "a");
        engine.add_incident(day(2024, 3, 1), 1, "b");
        engine.add_incident(day(2024, 2, 1), 1, "c");

        let dates: Vec<NaiveDate> = engine.get_incidents().iter().map(|i| i.date).collect();
        assert_eq!(dates, vec![day(2024, 3, 1), day(2024, 2, 1), day(2024, 1, 1)]);
    }

    #[test]
    fn test_clear_keeps_history() {
        let mut engine = DangerAssessmentEngine::new();
        engine.set_answer("6", true);
        engine.set_answer("7", true);
        engine.set_answer("8", true);
        engine.add_incident(day(2024, 4, 1), 4, "incident");
        engine.get_assessment_result();
        engine.get_assessment_result();

        engine.clear_assessment();

        assert!(engine.get_incidents().is_empty());
        assert!(engine.answers().is_empty());
        let history = engine.get_assessment_history();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|r| r.score == 9));

        let fresh = engine.get_assessment_result();
        assert_eq!(fresh.score, 0);
        assert_eq!(engine.get_assessment_history().len(), 3);
    }

    #[test]
    fn test_missing_incident_ops_leave_store_unchanged() {
        let mut engine = DangerAssessmentEngine::new();
        engine.add_incident(day(2024, 1, 1), 2, "kept");
        let before = engine.get_incidents();

        engine.delete_incident("nope");
        engine.update_incident(
            "nope",
            IncidentUpdate {
                severity: Some(5),
                ..Default::default()
            },
        );

        assert_eq!(engine.get_incidents(), before);
    }

    #[test]
    fn test_date_range_filter() {
        let mut engine = DangerAssessmentEngine::new();
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let result = engine.compute_result();
        for offset in 0..4 {
            engine.save_assessment_at(&result, base + Duration::days(offset));
        }

        let hits =
            engine.get_assessments_by_date_range(base + Duration::days(1), base + Duration::days(2));
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].date, base + Duration::days(1));
        assert_eq!(hits[1].date, base + Duration::days(2));
    }

    #[test]
    fn test_history_records_config_version() {
        let mut engine = DangerAssessmentEngine::new();
        engine.get_assessment_result();
        let record = &engine.get_assessment_history()[0];
        assert_eq!(record.config_version, crate::config::DEFAULT_CONFIG_VERSION);
    }

    #[test]
    fn test_with_config_rejects_invalid_table() {
        let mut config = ScoringConfig::default();
        config.thresholds.severe = config.thresholds.increased;
        assert!(DangerAssessmentEngine::with_config(config).is_err());
    }

    #[test]
    fn test_state_roundtrip() {
        let mut engine = DangerAssessmentEngine::new();
        engine.set_answer("3", true);
        engine.add_incident(day(2024, 1, 15), 3, "logged");
        engine.get_assessment_result();

        let saved = engine.save_state().unwrap();

        let mut restored = DangerAssessmentEngine::new();
        restored.load_state(&saved).unwrap();

        assert_eq!(restored.answers(), engine.answers());
        assert_eq!(restored.get_incidents(), engine.get_incidents());
        assert_eq!(
            restored.get_assessment_history(),
            engine.get_assessment_history()
        );
    }

    #[test]
    fn test_load_state_never_drops_existing_history() {
        let mut engine = DangerAssessmentEngine::new();
        engine.get_assessment_result();
        engine.get_assessment_result();

        engine.load_state("{}").unwrap();
        assert_eq!(engine.get_assessment_history().len(), 2);
    }

    #[test]
    fn test_load_state_merges_history_without_duplicates() {
        let mut earlier = DangerAssessmentEngine::new();
        earlier.set_answer("7", true);
        earlier.get_assessment_result();
        let saved = earlier.save_state().unwrap();

        let mut engine = DangerAssessmentEngine::new();
        engine.get_assessment_result();
        engine.load_state(&saved).unwrap();
        assert_eq!(engine.get_assessment_history().len(), 2);

        // loading the same blob again adds nothing
        engine.load_state(&saved).unwrap();
        assert_eq!(engine.get_assessment_history().len(), 2);
        assert_eq!(engine.answers().get("7"), Some(&true));
    }

    #[test]
    fn test_load_state_rejects_garbage() {
        let mut engine = DangerAssessmentEngine::new();
        assert!(matches!(
            engine.load_state("not json"),
            Err(AssessmentError::ParseError(_))
        ));
    }

    #[test]
    fn test_persist_and_restore_through_store() {
        let mut store = MemoryStore::new();
        let mut fresh = DangerAssessmentEngine::new();
        assert!(!fresh.restore(&store).unwrap());

        let mut engine = DangerAssessmentEngine::new();
        engine.add_incident(day(2024, 2, 2), 2, "stored");
        engine.persist(&mut store).unwrap();

        assert!(fresh.restore(&store).unwrap());
        assert_eq!(fresh.get_incidents().len(), 1);
        assert_eq!(fresh.get_incidents()[0].description, "stored");
    }

    #[test]
    fn test_assess_answers_stateless() {
        let json = assess_answers(r#"{"6": true, "7": true, "8": true}"#).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["score"], 9);
        assert_eq!(value["risk_level"], "increased");

        assert!(assess_answers("[1, 2]").is_err());
    }
}
