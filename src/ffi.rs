//! FFI bindings for Safeguard Assess
//!
//! This module provides C-compatible functions for calling the engine from the
//! mobile host. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using `assess_free_string`.
//!
//! A handle is not synchronized. Hosts calling from several threads must
//! serialize access to it.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::config::{default_questions, ScoringConfig};
use crate::engine::DangerAssessmentEngine;
use crate::error::AssessmentError;
use crate::report::ReportEncoder;
use crate::types::IncidentUpdate;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Serialize `value` and hand it out as a C string, or record the error
fn json_to_cstr<T: Serialize + ?Sized>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, AssessmentError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| AssessmentError::DateParseError(format!("{s}: {e}")))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, AssessmentError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AssessmentError::DateParseError(format!("{s}: {e}")))
}

/// Borrow the engine behind a handle, recording an error for NULL
unsafe fn engine_mut<'a>(
    handle: *mut AssessEngineHandle,
) -> Option<&'a mut DangerAssessmentEngine> {
    if handle.is_null() {
        set_last_error("Null engine pointer");
        return None;
    }
    Some(&mut (*handle).engine)
}

/// Read a required string argument, recording an error when it is invalid
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {name} string pointer"));
    }
    value
}

// ============================================================================
// Engine lifecycle
// ============================================================================

/// Opaque handle to a DangerAssessmentEngine
pub struct AssessEngineHandle {
    engine: DangerAssessmentEngine,
}

/// Create an engine with the built-in question table.
///
/// # Safety
/// - Returns a pointer to a newly allocated engine.
/// - Must be freed with `assess_engine_free`.
#[no_mangle]
pub unsafe extern "C" fn assess_engine_new() -> *mut AssessEngineHandle {
    clear_last_error();
    let handle = Box::new(AssessEngineHandle {
        engine: DangerAssessmentEngine::new(),
    });
    Box::into_raw(handle)
}

/// Create an engine with a custom scoring config (JSON).
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string.
/// - Must be freed with `assess_engine_free`.
/// - Returns NULL on error; call `assess_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn assess_engine_new_with_config(
    config_json: *const c_char,
) -> *mut AssessEngineHandle {
    clear_last_error();

    let Some(json) = required_arg(config_json, "config") else {
        return ptr::null_mut();
    };

    match ScoringConfig::from_json(&json).and_then(DangerAssessmentEngine::with_config) {
        Ok(engine) => Box::into_raw(Box::new(AssessEngineHandle { engine })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free an engine.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `assess_engine_new*`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn assess_engine_free(handle: *mut AssessEngineHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

// ============================================================================
// Answers and incidents
// ============================================================================

/// Record an answer.
///
/// # Safety
/// - `handle` must be a valid engine pointer.
/// - `question_id` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on invalid arguments.
#[no_mangle]
pub unsafe extern "C" fn assess_engine_set_answer(
    handle: *mut AssessEngineHandle,
    question_id: *const c_char,
    answer: bool,
) -> i32 {
    clear_last_error();

    let Some(engine) = engine_mut(handle) else {
        return -1;
    };
    let Some(id) = required_arg(question_id, "question_id") else {
        return -1;
    };

    engine.set_answer(&id, answer);
    0
}

/// Log an incident and return it as JSON.
///
/// # Safety
/// - `handle` must be a valid engine pointer.
/// - `date` (`YYYY-MM-DD`) and `description` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `assess_free_string`.
/// - Returns NULL on error; call `assess_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn assess_engine_add_incident(
    handle: *mut AssessEngineHandle,
    date: *const c_char,
    severity: i32,
    description: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(engine) = engine_mut(handle) else {
        return ptr::null_mut();
    };
    let Some(date_str) = required_arg(date, "date") else {
        return ptr::null_mut();
    };
    let Some(description) = required_arg(description, "description") else {
        return ptr::null_mut();
    };

    match parse_date(&date_str) {
        Ok(date) => json_to_cstr(&engine.add_incident(date, severity, &description)),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Apply a partial update (`{"date"?, "severity"?, "description"?}`) to an incident.
///
/// # Safety
/// - `handle` must be a valid engine pointer.
/// - `id` and `patch_json` must be valid null-terminated C strings.
/// - Returns 0 on success (including unknown ids), -1 on error.
#[no_mangle]
pub unsafe extern "C" fn assess_engine_update_incident(
    handle: *mut AssessEngineHandle,
    id: *const c_char,
    patch_json: *const c_char,
) -> i32 {
    clear_last_error();

    let Some(engine) = engine_mut(handle) else {
        return -1;
    };
    let Some(id) = required_arg(id, "id") else {
        return -1;
    };
    let Some(patch) = required_arg(patch_json, "patch") else {
        return -1;
    };

    match serde_json::from_str::<IncidentUpdate>(&patch) {
        Ok(update) => {
            engine.update_incident(&id, update);
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Delete an incident.
///
/// # Safety
/// - `handle` must be a valid engine pointer.
/// - `id` must be a valid null-terminated C string.
/// - Returns 0 on success (including unknown ids), -1 on invalid arguments.
#[no_mangle]
pub unsafe extern "C" fn assess_engine_delete_incident(
    handle: *mut AssessEngineHandle,
    id: *const c_char,
) -> i32 {
    clear_last_error();

    let Some(engine) = engine_mut(handle) else {
        return -1;
    };
    let Some(id) = required_arg(id, "id") else {
        return -1;
    };

    engine.delete_incident(&id);
    0
}

/// Incidents as a JSON array, most recent first.
///
/// # Safety
/// - `handle` must be a valid engine pointer.
/// - Returns a newly allocated string that must be freed with `assess_free_string`.
#[no_mangle]
pub unsafe extern "C" fn assess_engine_incidents(handle: *mut AssessEngineHandle) -> *mut c_char {
    clear_last_error();

    match engine_mut(handle) {
        Some(engine) => json_to_cstr(&engine.get_incidents()),
        None => ptr::null_mut(),
    }
}

// ============================================================================
// Results and history
// ============================================================================

/// Compute the assessment result, record it in history, and return it as JSON.
///
/// # Safety
/// - `handle` must be a valid engine pointer.
/// - Returns a newly allocated string that must be freed with `assess_free_string`.
#[no_mangle]
pub unsafe extern "C" fn assess_engine_result(handle: *mut AssessEngineHandle) -> *mut c_char {
    clear_last_error();

    match engine_mut(handle) {
        Some(engine) => json_to_cstr(&engine.get_assessment_result()),
        None => ptr::null_mut(),
    }
}

/// Compute and record the result, returning a full report as JSON.
///
/// # Safety
/// - `handle` must be a valid engine pointer.
/// - Returns a newly allocated string that must be freed with `assess_free_string`.
#[no_mangle]
pub unsafe extern "C" fn assess_engine_report(handle: *mut AssessEngineHandle) -> *mut c_char {
    clear_last_error();

    let Some(engine) = engine_mut(handle) else {
        return ptr::null_mut();
    };

    let result = engine.get_assessment_result();
    match ReportEncoder::new().encode_to_json(engine, &result) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Assessment history as a JSON array, most recent first.
///
/// # Safety
/// - `handle` must be a valid engine pointer.
/// - Returns a newly allocated string that must be freed with `assess_free_string`.
#[no_mangle]
pub unsafe extern "C" fn assess_engine_history(handle: *mut AssessEngineHandle) -> *mut c_char {
    clear_last_error();

    match engine_mut(handle) {
        Some(engine) => json_to_cstr(&engine.get_assessment_history()),
        None => ptr::null_mut(),
    }
}

/// History entries saved within `[start, end]` (RFC 3339 timestamps).
///
/// # Safety
/// - `handle` must be a valid engine pointer.
/// - `start` and `end` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `assess_free_string`.
/// - Returns NULL on error; call `assess_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn assess_engine_history_range(
    handle: *mut AssessEngineHandle,
    start: *const c_char,
    end: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(engine) = engine_mut(handle) else {
        return ptr::null_mut();
    };
    let Some(start) = required_arg(start, "start") else {
        return ptr::null_mut();
    };
    let Some(end) = required_arg(end, "end") else {
        return ptr::null_mut();
    };

    match parse_timestamp(&start).and_then(|s| Ok((s, parse_timestamp(&end)?))) {
        Ok((start, end)) => json_to_cstr(&engine.get_assessments_by_date_range(start, end)),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Clear the working answers and incidents. History is kept.
///
/// # Safety
/// - `handle` must be a valid engine pointer.
/// - Returns 0 on success, -1 on a NULL handle.
#[no_mangle]
pub unsafe extern "C" fn assess_engine_clear(handle: *mut AssessEngineHandle) -> i32 {
    clear_last_error();

    match engine_mut(handle) {
        Some(engine) => {
            engine.clear_assessment();
            0
        }
        None => -1,
    }
}

// ============================================================================
// Persistence
// ============================================================================

/// Save engine state to JSON.
///
/// # Safety
/// - `handle` must be a valid engine pointer.
/// - Returns a newly allocated string that must be freed with `assess_free_string`.
/// - Returns NULL on error; call `assess_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn assess_engine_save_state(handle: *mut AssessEngineHandle) -> *mut c_char {
    clear_last_error();

    let Some(engine) = engine_mut(handle) else {
        return ptr::null_mut();
    };

    match engine.save_state() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Load engine state from JSON.
///
/// # Safety
/// - `handle` must be a valid engine pointer.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `assess_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn assess_engine_load_state(
    handle: *mut AssessEngineHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    let Some(engine) = engine_mut(handle) else {
        return -1;
    };
    let Some(json) = required_arg(json, "JSON") else {
        return -1;
    };

    match engine.load_state(&json) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Static tables
// ============================================================================

/// The built-in questionnaire as a JSON array.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `assess_free_string`.
#[no_mangle]
pub unsafe extern "C" fn assess_questions() -> *mut c_char {
    clear_last_error();
    json_to_cstr(&default_questions())
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by this library.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an `assess_*` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn assess_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next `assess_*` call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn assess_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn assess_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
