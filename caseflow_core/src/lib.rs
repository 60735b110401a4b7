#![forbid(unsafe_code)]

//! Core domain model and business logic for the Caseflow injury case-management system.
//!
//! This crate provides:
//! - Domain types (exceptions, cases, rehabilitation plans, completions)
//! - Calendar-day arithmetic
//! - Exception activity and conflict detection
//! - Case status transitions and notification intents
//! - Rehabilitation day progression
//! - Persistence (store, transition WAL, CSV)

pub mod types;
pub mod error;
pub mod calendar;
pub mod activity;
pub mod status;
pub mod progression;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod roster;
pub mod store;
pub mod wal;
pub mod csv_rollup;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use activity::{active_exceptions_on, find_conflict, is_active_on};
pub use catalog::build_default_catalog;
pub use config::Config;
pub use progression::{build_completion_map, compute_progress, PlanProgress};
pub use roster::load_team_roster;
pub use status::{apply_transition, case_number};
pub use store::CaseStore;
pub use wal::{EventSink, JsonlSink};
