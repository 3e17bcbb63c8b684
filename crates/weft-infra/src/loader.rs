//! YAML workflow loading, validation, and directory discovery.
//!
//! Converts workflow files into validated [`WorkflowDefinition`] values and
//! assembles a [`WorkflowRegistry`] from a user-authored directory plus an
//! optional library directory. A malformed file is logged and skipped during
//! registry assembly so one bad workflow cannot take down the rest.

use std::path::{Path, PathBuf};

use weft_core::registry::WorkflowRegistry;
use weft_types::error::EngineError;
use weft_types::workflow::{Step, WorkflowDefinition};

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a YAML string into a validated [`WorkflowDefinition`].
///
/// Runs [`validate_definition`] after deserialization, so the returned value
/// is guaranteed to be structurally valid.
pub fn parse_workflow_yaml(yaml: &str) -> Result<WorkflowDefinition, EngineError> {
    let def: WorkflowDefinition = serde_yaml_ng::from_str(yaml).map_err(map_parse_error)?;
    validate_definition(&def)?;
    Ok(def)
}

/// Read and parse one workflow file.
pub fn load_workflow_file(path: &Path) -> Result<WorkflowDefinition, EngineError> {
    let yaml = std::fs::read_to_string(path)
        .map_err(|e| EngineError::Parse(format!("{}: {e}", path.display())))?;
    parse_workflow_yaml(&yaml)
}

/// Distinguish an unrecognized step kind from other syntax errors.
///
/// serde's internally tagged enums report an unknown `type` tag as an
/// "unknown variant" error; surfacing that as [`EngineError::UnknownStep`]
/// gives authors a pointed message instead of a generic parse failure.
fn map_parse_error(error: serde_yaml_ng::Error) -> EngineError {
    let message = error.to_string();
    if message.contains("unknown variant") {
        EngineError::UnknownStep(message)
    } else {
        EngineError::Parse(message)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate structural constraints on a workflow definition.
///
/// Checks:
/// - id is non-empty, alphanumeric plus `-`/`_`
/// - at least one step exists
/// - retry blocks embed at least one step
/// - classify steps declare at least one class
/// - first steps list at least one candidate
pub fn validate_definition(def: &WorkflowDefinition) -> Result<(), EngineError> {
    if def.id.is_empty() {
        return Err(EngineError::Validation(
            "workflow id must not be empty".to_string(),
        ));
    }
    if !def
        .id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(EngineError::Validation(format!(
            "workflow id '{}' contains invalid characters (only alphanumeric, '-' and '_' allowed)",
            def.id
        )));
    }

    if def.steps.is_empty() {
        return Err(EngineError::Validation(
            "workflow must have at least one step".to_string(),
        ));
    }

    validate_steps(&def.steps)
}

fn validate_steps(steps: &[Step]) -> Result<(), EngineError> {
    for step in steps {
        match step {
            Step::Retry { steps, .. } => {
                if steps.is_empty() {
                    return Err(EngineError::Validation(
                        "retry block must embed at least one step".to_string(),
                    ));
                }
                validate_steps(steps)?;
            }
            Step::If {
                then_steps,
                else_steps,
                ..
            } => {
                validate_steps(then_steps)?;
                validate_steps(else_steps)?;
            }
            Step::Classify { classes, .. } => {
                if classes.is_empty() {
                    return Err(EngineError::Validation(
                        "classify step must declare at least one class".to_string(),
                    ));
                }
            }
            Step::First { from, .. } => {
                if from.is_empty() {
                    return Err(EngineError::Validation(
                        "first step must list at least one candidate".to_string(),
                    ));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Workflow files (`.yaml`/`.yml`) directly inside a directory, sorted by
/// path for deterministic registry order.
pub fn discover_workflow_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("yaml" | "yml")
            )
        })
        .collect();
    files.sort();
    files
}

/// Load every workflow under the user and library directories into a
/// registry. User workflows shadow library workflows with the same id at
/// resolution time; malformed files are logged and skipped.
pub fn load_registry(user_dir: Option<&Path>, library_dir: Option<&Path>) -> WorkflowRegistry {
    let mut registry = WorkflowRegistry::default();
    if let Some(dir) = user_dir {
        for workflow in load_dir(dir) {
            registry.add_user(workflow);
        }
    }
    if let Some(dir) = library_dir {
        for workflow in load_dir(dir) {
            registry.add_library(workflow);
        }
    }
    registry
}

fn load_dir(dir: &Path) -> Vec<WorkflowDefinition> {
    discover_workflow_files(dir)
        .iter()
        .filter_map(|path| match load_workflow_file(path) {
            Ok(workflow) => Some(workflow),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping unloadable workflow file");
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
id: daily-digest
title: Daily Digest
steps:
  - type: navigate
    url: "https://news.example.com"
  - type: stop
    message: done
"#;

    #[test]
    fn parses_and_validates_a_workflow() {
        let def = parse_workflow_yaml(VALID).unwrap();
        assert_eq!(def.id, "daily-digest");
        assert_eq!(def.steps.len(), 2);
    }

    #[test]
    fn unknown_step_kind_is_surfaced_distinctly() {
        let yaml = "id: x\ntitle: X\nsteps:\n  - type: teleport\n";
        let err = parse_workflow_yaml(yaml).unwrap_err();
        assert!(matches!(err, EngineError::UnknownStep(_)));
    }

    #[test]
    fn broken_yaml_is_a_parse_error() {
        let err = parse_workflow_yaml("id: [unclosed").unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)));
    }

    #[test]
    fn empty_steps_fail_validation() {
        let yaml = "id: x\ntitle: X\nsteps: []\n";
        let err = parse_workflow_yaml(yaml).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn bad_id_characters_fail_validation() {
        let yaml = "id: \"no spaces\"\ntitle: X\nsteps:\n  - type: stop\n";
        let err = parse_workflow_yaml(yaml).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn empty_retry_block_fails_validation_recursively() {
        let yaml = r#"
id: x
title: X
steps:
  - type: if
    condition: "a == a"
    then_steps:
      - type: retry
        steps: []
"#;
        let err = parse_workflow_yaml(yaml).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn classify_without_classes_fails_validation() {
        let yaml = r#"
id: x
title: X
steps:
  - type: classify
    input: "{{text}}"
    classes: []
    variable: label
"#;
        let err = parse_workflow_yaml(yaml).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn discovery_finds_only_yaml_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.yaml"), VALID).unwrap();
        std::fs::write(dir.path().join("a.yml"), VALID).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = discover_workflow_files(dir.path());
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["a.yml", "b.yaml"]);
    }

    #[test]
    fn registry_loads_user_before_library_and_skips_bad_files() {
        let user = tempfile::tempdir().unwrap();
        let library = tempfile::tempdir().unwrap();

        std::fs::write(
            user.path().join("digest.yaml"),
            "id: digest\ntitle: User Digest\nsteps:\n  - type: stop\n",
        )
        .unwrap();
        std::fs::write(user.path().join("broken.yaml"), "id: [unclosed").unwrap();
        std::fs::write(
            library.path().join("digest.yaml"),
            "id: digest\ntitle: Library Digest\nsteps:\n  - type: stop\n",
        )
        .unwrap();

        let registry = load_registry(Some(user.path()), Some(library.path()));
        assert_eq!(registry.resolve("digest").unwrap().title, "User Digest");
        assert_eq!(registry.iter().count(), 2);
    }
}
