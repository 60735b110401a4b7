//! Error types for the caseflow_core library.

use crate::types::CaseStatus;
use chrono::NaiveDate;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for caseflow_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Store management error
    #[error("Store error: {0}")]
    Store(String),

    /// Exercise catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Malformed or impossible calendar date string
    #[error("Invalid calendar date: {0}")]
    InvalidDate(String),

    /// Plan end date precedes its start date
    #[error("Invalid date range: end date precedes start date")]
    InvalidDateRange,

    /// Status value outside the known case statuses
    #[error("Invalid case status: {0}")]
    InvalidStatus(String),

    /// Backward transition attempted from return_to_work
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: CaseStatus, to: CaseStatus },

    /// Attempted return_to_work/closed while an active rehabilitation plan exists
    #[error("Cannot transition while the case has an active rehabilitation plan")]
    ActiveRehabBlocksClosure,

    /// Return-to-work transition requested without duty type and return date
    #[error("Return-to-work transition requires a duty type and a return date")]
    MissingReturnToWorkFields,

    /// Duty type outside {modified, full}
    #[error("Invalid duty type: {0}")]
    InvalidDutyType(String),

    /// Return date is before the current calendar day
    #[error("Return date {0} is in the past")]
    ReturnDateInPast(NaiveDate),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
