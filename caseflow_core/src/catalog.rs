//! Built-in rehabilitation exercise catalog.
//!
//! Clinicians assemble plan exercise lists from these definitions; the ids
//! are what completion records reference.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A rehabilitation exercise definition
#[derive(Clone, Debug)]
pub struct ExerciseDefinition {
    pub id: String,
    pub name: String,
    pub focus: Vec<String>,
    pub reference_url: Option<String>,
}

/// The complete catalog of known rehabilitation exercises
#[derive(Clone, Debug)]
pub struct Catalog {
    pub exercises: HashMap<String, ExerciseDefinition>,
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog of rehabilitation exercises
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns
/// a cached reference. This function is retained for testing and custom
/// catalog creation.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

fn build_default_catalog_internal() -> Catalog {
    let mut exercises = HashMap::new();

    let mut insert = |id: &str, name: &str, focus: &[&str], url: Option<&str>| {
        exercises.insert(
            id.to_string(),
            ExerciseDefinition {
                id: id.to_string(),
                name: name.to_string(),
                focus: focus.iter().map(|s| s.to_string()).collect(),
                reference_url: url.map(str::to_string),
            },
        );
    };

    insert(
        "shoulder_pendulum",
        "Shoulder Pendulum Swing",
        &["shoulder", "mobility"],
        Some("https://www.youtube.com/watch?v=02W0oDJqECM"),
    );
    insert(
        "wrist_flexor_stretch",
        "Wrist Flexor Stretch",
        &["wrist", "forearm", "stretch"],
        Some("https://www.youtube.com/watch?v=reQ_gzYikDc"),
    );
    insert(
        "ankle_alphabet",
        "Ankle Alphabet",
        &["ankle", "mobility"],
        None,
    );
    insert(
        "hamstring_stretch",
        "Seated Hamstring Stretch",
        &["hamstring", "stretch"],
        Some("https://www.youtube.com/watch?v=ocRPOLRYoJk"),
    );
    insert(
        "neck_rotation",
        "Gentle Neck Rotation",
        &["neck", "mobility"],
        None,
    );
    insert(
        "grip_squeeze",
        "Grip Strengthening Squeeze",
        &["hand", "grip", "strength"],
        None,
    );
    insert(
        "lumbar_tilt",
        "Pelvic/Lumbar Tilt",
        &["lower_back", "core"],
        Some("https://www.youtube.com/watch?v=qc2npv-6uRU"),
    );

    Catalog { exercises }
}

impl Catalog {
    /// Validate catalog consistency, returning human-readable problems
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (key, exercise) in &self.exercises {
            if exercise.id != *key {
                errors.push(format!(
                    "Exercise key '{}' does not match its id '{}'",
                    key, exercise.id
                ));
            }
            if exercise.name.trim().is_empty() {
                errors.push(format!("Exercise '{}' has an empty name", key));
            }
            if exercise.focus.is_empty() {
                errors.push(format!("Exercise '{}' has no focus areas", key));
            }
        }
        errors
    }

    /// Look up an exercise definition by id
    pub fn get(&self, id: &str) -> Option<&ExerciseDefinition> {
        self.exercises.get(id)
    }
}
