//! Case status transitions.
//!
//! Validates a requested status change against the case's journal and linked
//! rehabilitation plans, applies the side effects on the embedded exception,
//! appends the journal entry, and emits notification intents for the external
//! dispatcher. All inputs are immutable; the updated case is returned as a
//! new value and the caller is responsible for persisting it (and for
//! serializing concurrent writes to the same case).

use crate::calendar;
use crate::error::{Error, Result};
use crate::types::{
    Case, CaseStatus, DutyType, JournalEntry, NotificationIntent, PlanStatus, Recipient,
    RehabilitationPlan, TeamRoster, TransitionOutcome, TransitionRequest,
};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Derive the display case number from creation time and id
///
/// Format: `CASE-YYYYMMDD-HHMMSS-XXXX` where `XXXX` is the first four hex
/// characters of the id, uppercased, or the literal `CASE` when no id exists
/// yet (e.g. an unsaved draft).
pub fn case_number(created_at: DateTime<Utc>, id: Option<&Uuid>) -> String {
    let suffix = id
        .map(|u| u.simple().to_string()[..4].to_uppercase())
        .unwrap_or_else(|| "CASE".to_string());
    format!("CASE-{}-{}", created_at.format("%Y%m%d-%H%M%S"), suffix)
}

/// Validate and apply a status transition
///
/// Rules, in order:
/// 1. `return_to_work`/`closed` are rejected while any plan linked to the
///    case is still active.
/// 2. Once the current status is `return_to_work`, any regression to
///    `new`/`triaged`/`assessed`/`in_rehab` is rejected; only `closed` (or a
///    re-application of `return_to_work`) may follow.
/// 3. A `return_to_work` transition requires a duty type and a non-past
///    return date.
///
/// Everything else is permitted, including re-applying the current status
/// (which appends a fresh journal entry, deliberately not deduplicated) and
/// reopening a closed case. `closed` is terminal by convention only.
pub fn apply_transition(
    case: &Case,
    requested: CaseStatus,
    actor: &str,
    request: &TransitionRequest,
    plans: &[RehabilitationPlan],
    roster: &TeamRoster,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome> {
    let today = calendar::normalize_to_day(now);

    if matches!(requested, CaseStatus::ReturnToWork | CaseStatus::Closed) {
        let has_active_plan = plans
            .iter()
            .any(|p| p.case_id == case.id && p.status == PlanStatus::Active);
        if has_active_plan {
            return Err(Error::ActiveRehabBlocksClosure);
        }
    }

    let current = case.current_status();
    if current == CaseStatus::ReturnToWork
        && matches!(
            requested,
            CaseStatus::New | CaseStatus::Triaged | CaseStatus::Assessed | CaseStatus::InRehab
        )
    {
        return Err(Error::InvalidTransition {
            from: current,
            to: requested,
        });
    }

    let mut updated = case.clone();
    let mut duty_type = None;
    let mut return_date = None;

    match requested {
        CaseStatus::ReturnToWork => {
            let (duty, date) = match request {
                TransitionRequest::ReturnToWork {
                    duty_type,
                    return_date,
                } => (*duty_type, *return_date),
                TransitionRequest::Standard => return Err(Error::MissingReturnToWorkFields),
            };
            if date < today {
                return Err(Error::ReturnDateInPast(date));
            }
            updated.exception.is_active = false;
            updated.exception.end_date = Some(today);
            updated.return_to_work_duty = Some(duty);
            updated.return_to_work_date = Some(date);
            duty_type = Some(duty);
            return_date = Some(date);
        }
        CaseStatus::Closed => {
            updated.exception.is_active = false;
            if updated.exception.end_date.is_none() {
                updated.exception.end_date = Some(today);
            }
        }
        // in_rehab and all earlier statuses keep the exception in force
        _ => {
            updated.exception.is_active = true;
        }
    }

    let approved = matches!(requested, CaseStatus::ReturnToWork | CaseStatus::Closed);
    updated.journal.push(JournalEntry {
        status: requested,
        updated_at: now,
        updated_by: actor.to_string(),
        approved_by: approved.then(|| actor.to_string()),
        approved_at: approved.then_some(now),
    });

    let intents = build_intents(&updated, requested, roster, duty_type, return_date);

    tracing::info!(
        "Case {}: {} -> {} by {} ({} notifications)",
        updated.number(),
        current,
        requested,
        actor,
        intents.len()
    );

    Ok(TransitionOutcome {
        case: updated,
        intents,
    })
}

/// One intent per administrator, plus supervisor, team leader and the worker
fn build_intents(
    case: &Case,
    status: CaseStatus,
    roster: &TeamRoster,
    duty_type: Option<DutyType>,
    return_date: Option<NaiveDate>,
) -> Vec<NotificationIntent> {
    let case_number = case.number();
    let worker_id = case.exception.worker_id.clone();
    let intent = |recipient| NotificationIntent {
        recipient,
        case_number: case_number.clone(),
        worker_id: worker_id.clone(),
        status,
        duty_type,
        return_date,
    };

    let mut intents = Vec::new();
    for user in &roster.administrators {
        intents.push(intent(Recipient::Administrator { user: user.clone() }));
    }
    if let Some(user) = &roster.supervisor {
        intents.push(intent(Recipient::Supervisor { user: user.clone() }));
    }
    if let Some(user) = &roster.team_leader {
        intents.push(intent(Recipient::TeamLeader { user: user.clone() }));
    }
    intents.push(intent(Recipient::Worker {
        worker_id: worker_id.clone(),
    }));
    intents
}
