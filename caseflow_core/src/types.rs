//! Core domain types for the Caseflow system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Worker exceptions and their lifecycle fields
//! - Cases and their status journal
//! - Rehabilitation plans, exercises and completions
//! - Transition requests and notification intents

use crate::error::Error;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Exception Types
// ============================================================================

/// Kind of time-bounded condition affecting a worker's availability
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionType {
    Injury,
    MedicalLeave,
    Accident,
    Transfer,
    Other,
}

/// A time-bounded condition affecting a worker's availability
///
/// `end_date` absent means the exception is open-ended. `is_active` is an
/// explicit override that forces the exception inactive regardless of its
/// date range; `deactivated_at` records when it was manually closed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Exception {
    pub id: Uuid,
    pub worker_id: String,
    pub exception_type: ExceptionType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

fn default_active() -> bool {
    true
}

// ============================================================================
// Case Types
// ============================================================================

/// Case lifecycle status
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    New,
    Triaged,
    Assessed,
    InRehab,
    ReturnToWork,
    Closed,
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaseStatus::New => "new",
            CaseStatus::Triaged => "triaged",
            CaseStatus::Assessed => "assessed",
            CaseStatus::InRehab => "in_rehab",
            CaseStatus::ReturnToWork => "return_to_work",
            CaseStatus::Closed => "closed",
        };
        f.write_str(s)
    }
}

impl FromStr for CaseStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(CaseStatus::New),
            "triaged" => Ok(CaseStatus::Triaged),
            "assessed" => Ok(CaseStatus::Assessed),
            "in_rehab" => Ok(CaseStatus::InRehab),
            "return_to_work" => Ok(CaseStatus::ReturnToWork),
            "closed" => Ok(CaseStatus::Closed),
            other => Err(Error::InvalidStatus(other.to_string())),
        }
    }
}

/// Duty arrangement for a worker returning to work
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DutyType {
    Modified,
    Full,
}

impl fmt::Display for DutyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DutyType::Modified => f.write_str("modified"),
            DutyType::Full => f.write_str("full"),
        }
    }
}

impl FromStr for DutyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "modified" => Ok(DutyType::Modified),
            "full" => Ok(DutyType::Full),
            other => Err(Error::InvalidDutyType(other.to_string())),
        }
    }
}

/// One entry in a case's status journal
///
/// `approved_by`/`approved_at` are stamped only for `closed` and
/// `return_to_work` entries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JournalEntry {
    pub status: CaseStatus,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
}

/// A worker exception escalated to medical/administrative tracking
///
/// The journal is an append-only ordered log of status changes; the latest
/// entry is the case's current status. A case with an empty journal is `new`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Case {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub exception: Exception,
    pub journal: Vec<JournalEntry>,
    pub return_to_work_duty: Option<DutyType>,
    pub return_to_work_date: Option<NaiveDate>,
}

impl Case {
    /// Escalate an exception into a tracked case with an initial `new` entry
    pub fn escalate(exception: Exception, actor: &str, now: DateTime<Utc>) -> Self {
        Case {
            id: Uuid::new_v4(),
            created_at: now,
            exception,
            journal: vec![JournalEntry {
                status: CaseStatus::New,
                updated_at: now,
                updated_by: actor.to_string(),
                approved_by: None,
                approved_at: None,
            }],
            return_to_work_duty: None,
            return_to_work_date: None,
        }
    }

    /// The case's current status (latest journal entry)
    pub fn current_status(&self) -> CaseStatus {
        self.journal
            .last()
            .map(|entry| entry.status)
            .unwrap_or(CaseStatus::New)
    }

    /// Display/notification case number, derived from creation time and id
    pub fn number(&self) -> String {
        crate::status::case_number(self.created_at, Some(&self.id))
    }
}

// ============================================================================
// Rehabilitation Plan Types
// ============================================================================

/// Lifecycle status of a rehabilitation plan
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Active,
    Completed,
    Cancelled,
}

/// One exercise slot within a plan, performed every plan day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exercise {
    pub id: String,
    pub order: u32,
}

/// A bounded daily exercise program tied to one case
///
/// Day 1 is `start_date`; day N is `start_date + (N-1)` days.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RehabilitationPlan {
    pub id: Uuid,
    pub case_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: PlanStatus,
    pub exercises: Vec<Exercise>,
}

impl RehabilitationPlan {
    /// Create an active plan, rejecting an end date before the start date
    pub fn new(
        case_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        mut exercises: Vec<Exercise>,
    ) -> crate::Result<Self> {
        if end_date < start_date {
            return Err(Error::InvalidDateRange);
        }
        exercises.sort_by_key(|e| e.order);
        Ok(RehabilitationPlan {
            id: Uuid::new_v4(),
            case_id,
            start_date,
            end_date,
            status: PlanStatus::Active,
            exercises,
        })
    }

    /// Total calendar days covered by the plan, minimum 1
    pub fn total_days(&self) -> i64 {
        (crate::calendar::days_between(self.start_date, self.end_date) + 1).max(1)
    }
}

/// A mark that one exercise was performed on one calendar day of a plan
///
/// Keyed by `(plan_id, exercise_id, date)`; duplicate marks for the same key
/// are idempotent, not additive.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Completion {
    pub plan_id: Uuid,
    pub exercise_id: String,
    pub date: NaiveDate,
}

/// Per-day sets of completed exercise ids for one plan
pub type CompletionMap = HashMap<NaiveDate, HashSet<String>>;

// ============================================================================
// Transition and Notification Types
// ============================================================================

/// Payload accompanying a requested status transition
///
/// Return-to-work transitions require a duty type and a return date; every
/// other transition carries no extra fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionRequest {
    Standard,
    ReturnToWork {
        duty_type: DutyType,
        return_date: NaiveDate,
    },
}

/// Recipients eligible for case status notifications
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TeamRoster {
    #[serde(default)]
    pub administrators: Vec<String>,
    pub supervisor: Option<String>,
    pub team_leader: Option<String>,
}

/// Who a notification intent is addressed to
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Recipient {
    Administrator { user: String },
    Supervisor { user: String },
    TeamLeader { user: String },
    Worker { worker_id: String },
}

/// A notification to be delivered by an external dispatcher
///
/// Delivery is out of scope; the status machine only produces the intent list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationIntent {
    pub recipient: Recipient,
    pub case_number: String,
    pub worker_id: String,
    pub status: CaseStatus,
    pub duty_type: Option<DutyType>,
    pub return_date: Option<NaiveDate>,
}

/// Result of a validated, applied status transition
#[derive(Clone, Debug)]
pub struct TransitionOutcome {
    pub case: Case,
    pub intents: Vec<NotificationIntent>,
}
