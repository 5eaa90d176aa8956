//! Key-value persistence seam
//!
//! The host app owns a secure key-value store (keychain, keystore). The engine
//! only sees it through [`KeyValueStore`] and writes a single JSON blob.

use crate::error::AssessmentError;
use std::collections::HashMap;

/// Key under which the engine state blob is stored
pub const STATE_KEY: &str = "danger_assessment_state";

/// String blob storage addressed by key
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, AssessmentError>;

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), AssessmentError>;

    fn delete_item(&mut self, key: &str) -> Result<(), AssessmentError>;
}

/// In-process store, for tests and hosts without a secure store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, AssessmentError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), AssessmentError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete_item(&mut self, key: &str) -> Result<(), AssessmentError> {
        self.items.remove(key);
        Ok(())
    }
}
