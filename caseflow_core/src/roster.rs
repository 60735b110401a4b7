//! Team roster loader.
//!
//! Notification intents address the administrators, the team's supervisor
//! and its leader. Those identities come from a roster file maintained by an
//! external HR system; a missing or unreadable roster degrades to worker-only
//! notifications rather than failing the transition.

use crate::types::TeamRoster;
use crate::Result;
use std::path::Path;

/// Load the team roster from a JSON file
///
/// Returns the default (empty) roster if the file doesn't exist or cannot be
/// read or parsed; the worker recipient is always derived from the case
/// itself, so notifications never silently vanish entirely.
pub fn load_team_roster(path: &Path) -> Result<TeamRoster> {
    if !path.exists() {
        tracing::debug!("No roster file found at {:?}", path);
        return Ok(TeamRoster::default());
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(
                "Failed to read roster at {:?}: {}. Using empty roster.",
                path,
                e
            );
            return Ok(TeamRoster::default());
        }
    };

    match serde_json::from_str::<TeamRoster>(&contents) {
        Ok(roster) => {
            tracing::info!(
                "Loaded roster: {} administrators, supervisor={:?}, leader={:?}",
                roster.administrators.len(),
                roster.supervisor,
                roster.team_leader
            );
            Ok(roster)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse roster at {:?}: {}. Using empty roster.",
                path,
                e
            );
            Ok(TeamRoster::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_roster() {
        let temp_dir = tempfile::tempdir().unwrap();
        let roster_path = temp_dir.path().join("roster.json");

        let json = r#"{
            "administrators": ["admin.ng", "admin.voss"],
            "supervisor": "sup.ortiz",
            "team_leader": "leader.kim"
        }"#;
        std::fs::write(&roster_path, json).unwrap();

        let roster = load_team_roster(&roster_path).unwrap();
        assert_eq!(roster.administrators.len(), 2);
        assert_eq!(roster.supervisor.as_deref(), Some("sup.ortiz"));
        assert_eq!(roster.team_leader.as_deref(), Some("leader.kim"));
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let roster = load_team_roster(&temp_dir.path().join("missing.json")).unwrap();
        assert!(roster.administrators.is_empty());
        assert!(roster.supervisor.is_none());
    }

    #[test]
    fn test_malformed_roster_tolerated() {
        let temp_dir = tempfile::tempdir().unwrap();
        let roster_path = temp_dir.path().join("bad.json");
        std::fs::write(&roster_path, "{ invalid json }").unwrap();

        let roster = load_team_roster(&roster_path).unwrap();
        assert!(roster.administrators.is_empty());
    }

    #[test]
    fn test_partial_roster() {
        let temp_dir = tempfile::tempdir().unwrap();
        let roster_path = temp_dir.path().join("roster.json");
        std::fs::write(&roster_path, r#"{"supervisor": "sup.ortiz"}"#).unwrap();

        let roster = load_team_roster(&roster_path).unwrap();
        assert!(roster.administrators.is_empty());
        assert_eq!(roster.supervisor.as_deref(), Some("sup.ortiz"));
        assert!(roster.team_leader.is_none());
    }
}
