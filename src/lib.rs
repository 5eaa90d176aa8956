//! Safeguard Assess - On-device danger assessment engine
//!
//! Scores a fixed, weighted yes/no questionnaire into one of four risk tiers,
//! keeps a dated incident log, and records every completed assessment in an
//! append-only history. The scoring is a plain weighted sum so that anyone can
//! see why a given tier was reached.
//!
//! ## Modules
//!
//! - **Engine**: per-session state and the assessment operations
//! - **Config / Scoring**: the versioned question table and the pure scorer
//! - **Report**: explainable result payloads for the host UI

pub mod config;
pub mod engine;
pub mod error;
pub mod palette;
pub mod persistence;
pub mod report;
pub mod resources;
pub mod scoring;
pub mod store;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{AssessmentQuestion, RiskThresholds, ScoringConfig};
pub use engine::{assess_answers, DangerAssessmentEngine};
pub use error::AssessmentError;
pub use persistence::{KeyValueStore, MemoryStore};
pub use report::{AssessmentReport, ReportEncoder};
pub use types::{
    AssessmentRecord, AssessmentResult, IncidentRecord, IncidentUpdate, RiskLevel,
};

/// Library version embedded in reports
pub const SAFEGUARD_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "safeguard-assess";
