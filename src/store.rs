//! Incident log and assessment history
//!
//! Both stores hand out owned copies; nothing returned from here aliases the
//! stored records. Missing ids on update/delete are silent no-ops.

use crate::types::{AssessmentRecord, IncidentRecord, IncidentUpdate};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Working set of logged incidents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncidentStore {
    /// Incidents in insertion order
    incidents: Vec<IncidentRecord>,
}

impl IncidentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an incident with a fresh id and return a copy of it
    pub fn add(&mut self, date: NaiveDate, severity: i32, description: &str) -> IncidentRecord {
        let record = IncidentRecord {
            id: Uuid::new_v4().to_string(),
            date,
            severity,
            description: description.to_string(),
        };

        if !record.severity_in_range() {
            tracing::warn!(
                id = %record.id,
                severity,
                "incident severity outside the 1-5 scale, storing as given"
            );
        }

        self.incidents.push(record.clone());
        record
    }

    /// Merge `update` into the incident with `id`. Returns whether a record matched.
    pub fn update(&mut self, id: &str, update: &IncidentUpdate) -> bool {
        match self.incidents.iter_mut().find(|i| i.id == id) {
            Some(incident) => {
                update.apply_to(incident);
                true
            }
            None => {
                tracing::debug!(id, "update for unknown incident ignored");
                false
            }
        }
    }

    /// Remove the incident with `id`. Returns whether a record was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.incidents.len();
        self.incidents.retain(|i| i.id != id);
        before != self.incidents.len()
    }

    pub fn get(&self, id: &str) -> Option<IncidentRecord> {
        self.incidents.iter().find(|i| i.id == id).cloned()
    }

    /// Incidents ordered most recent first. Same-day incidents keep insertion order.
    pub fn list(&self) -> Vec<IncidentRecord> {
        let mut incidents = self.incidents.clone();
        incidents.sort_by(|a, b| b.date.cmp(&a.date));
        incidents
    }

    /// Copy of the log in insertion order
    pub fn snapshot(&self) -> Vec<IncidentRecord> {
        self.incidents.clone()
    }

    pub fn clear(&mut self) {
        self.incidents.clear();
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }
}

/// Append-only log of completed assessments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentHistory {
    /// Records in append order
    records: Vec<AssessmentRecord>,
}

impl AssessmentHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: AssessmentRecord) {
        self.records.push(record);
    }

    /// Records ordered most recent first. Equal timestamps list the later append first.
    pub fn list(&self) -> Vec<AssessmentRecord> {
        let mut records: Vec<AssessmentRecord> = self.records.iter().rev().cloned().collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        records
    }

    /// Records saved within `[start, end]`, in append order
    pub fn in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<AssessmentRecord> {
        self.records
            .iter()
            .filter(|r| r.date >= start && r.date <= end)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn records(&self) -> &[AssessmentRecord] {
        &self.records
    }

    /// Fold `loaded` records in ahead of the existing ones, skipping ids already held.
    /// Returns how many records were added.
    pub fn merge_loaded(&mut self, loaded: AssessmentHistory) -> usize {
        let mut merged: Vec<AssessmentRecord> = loaded
            .records
            .into_iter()
            .filter(|r| !self.records.iter().any(|held| held.id == r.id))
            .collect();
        let added = merged.len();
        merged.append(&mut self.records);
        self.records = merged;
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RiskLevel;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record_at(id: &str, at: DateTime<Utc>) -> AssessmentRecord {
        AssessmentRecord {
            id: id.to_string(),
            date: at,
            score: 0,
            risk_level: RiskLevel::Variable,
            incidents: vec![],
            config_version: "test".to_string(),
        }
    }

    #[test]
    fn test_add_assigns_unique_ids() {
        let mut store = IncidentStore::new();
        let a = store.add(day(2024, 1, 1), 2, "a");
        let b = store.add(day(2024, 1, 1), 2, "b");
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_list_sorted_descending_by_date() {
        let mut store = IncidentStore::new();
        store.add(day(2024, 1, 1), 1, "january");
        store.add(day(2024, 3, 1), 3, "march");
        store.add(day(2024, 2, 1), 2, "february");

        let dates: Vec<NaiveDate> = store.list().iter().map(|i| i.date).collect();
        assert_eq!(dates, vec![day(2024, 3, 1), day(2024, 2, 1), day(2024, 1, 1)]);
    }

    #[test]
    fn test_same_day_keeps_insertion_order() {
        let mut store = IncidentStore::new();
        store.add(day(2024, 5, 5), 1, "first");
        store.add(day(2024, 5, 5), 1, "second");

        let descriptions: Vec<String> =
            store.list().into_iter().map(|i| i.description).collect();
        assert_eq!(descriptions, vec!["first", "second"]);
    }

    #[test]
    fn test_update_merges_fields() {
        let mut store = IncidentStore::new();
        let created = store.add(day(2024, 1, 1), 2, "original");

        let matched = store.update(
            &created.id,
            &IncidentUpdate {
                date: Some(day(2023, 12, 24)),
                description: Some("edited".to_string()),
                ..Default::default()
            },
        );
        assert!(matched);

        let stored = store.get(&created.id).unwrap();
        assert_eq!(stored.date, day(2023, 12, 24));
        assert_eq!(stored.severity, 2);
        assert_eq!(stored.description, "edited");
    }

    #[test]
    fn test_missing_id_is_noop() {
        let mut store = IncidentStore::new();
        store.add(day(2024, 1, 1), 2, "kept");
        let before = store.snapshot();

        assert!(!store.update(
            "missing",
            &IncidentUpdate {
                severity: Some(5),
                ..Default::default()
            }
        ));
        assert!(!store.delete("missing"));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_out_of_range_severity_stored_as_given() {
        let mut store = IncidentStore::new();
        let created = store.add(day(2024, 1, 1), 11, "off the scale");
        assert_eq!(store.get(&created.id).unwrap().severity, 11);
    }

    #[test]
    fn test_returned_copies_do_not_alias() {
        let mut store = IncidentStore::new();
        store.add(day(2024, 1, 1), 2, "original");

        let mut listed = store.list();
        listed[0].description = "tampered".to_string();
        assert_eq!(store.list()[0].description, "original");
    }

    #[test]
    fn test_history_descending_with_ties_most_recent_first() {
        let mut history = AssessmentHistory::new();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        history.append(record_at("a", t1));
        history.append(record_at("b", t2));
        history.append(record_at("c", t2));

        let ids: Vec<String> = history.list().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_merge_loaded_keeps_existing_and_skips_known_ids() {
        let mut history = AssessmentHistory::new();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        history.append(record_at("current", t2));

        let mut loaded = AssessmentHistory::new();
        loaded.append(record_at("older", t1));
        loaded.append(record_at("current", t2));

        assert_eq!(history.merge_loaded(loaded), 1);
        let ids: Vec<String> = history.records().iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec!["older", "current"]);

        assert_eq!(history.merge_loaded(AssessmentHistory::new()), 0);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_history_range_is_inclusive() {
        let mut history = AssessmentHistory::new();
        let jan = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let feb = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let mar = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        history.append(record_at("jan", jan));
        history.append(record_at("feb", feb));
        history.append(record_at("mar", mar));

        let ids: Vec<String> = history
            .in_range(jan, feb)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["jan", "feb"]);

        assert!(history.in_range(mar, jan).is_empty());
    }
}
