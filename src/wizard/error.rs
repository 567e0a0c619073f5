//! Wizard error types.

use std::path::PathBuf;

use thiserror::Error;

use super::phase::Phase;
use super::schema::REQUIRED_SELECTION;
use crate::ai::CompletionError;

/// Result type for wizard operations.
pub type WizardResult<T> = Result<T, WizardError>;

/// Errors returned by wizard operations.
///
/// None of them touches data already accepted by an earlier phase.
#[derive(Debug, Error)]
pub enum WizardError {
    /// The idea text is empty.
    #[error("Décrivez votre idée.")]
    EmptyIdea,

    /// The operation belongs to another phase.
    #[error("'{action}' n'est pas disponible en phase {phase}")]
    WrongPhase { action: &'static str, phase: Phase },

    /// The transition is not one of the allowed edges.
    #[error("Transition interdite : {from} -> {to}")]
    IllegalTransition { from: Phase, to: Phase },

    /// A phase the operation depends on has no successful result.
    #[error("Aucun résultat valide pour la phase {phase}")]
    MissingResult { phase: Phase },

    /// Not exactly three angles are selected.
    #[error("Sélectionnez exactement {required} angles ({selected}/{required})", required = REQUIRED_SELECTION)]
    SelectionCount { selected: usize },

    /// An angle number outside the generated list.
    #[error("L'angle n°{number} n'existe pas ({available} disponibles)")]
    NoSuchAngle { number: usize, available: usize },

    /// A final choice outside the evaluated angles.
    #[error("Choix {choice} invalide : choisissez entre 1 et {available}")]
    InvalidChoice { choice: usize, available: usize },

    /// The completion step failed; the failure is also stored in the state.
    #[error(transparent)]
    Completion(#[from] CompletionError),

    /// Saving is only offered once the plan phase is reached.
    #[error("Sauvegarde possible uniquement en phase sequencage (phase actuelle : {phase})")]
    SnapshotUnavailable { phase: Phase },

    /// Reading or writing a project file failed.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Errors while reading or writing project files.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid project file: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_count_message() {
        let err = WizardError::SelectionCount { selected: 2 };
        assert_eq!(err.to_string(), "Sélectionnez exactement 3 angles (2/3)");
    }

    #[test]
    fn test_completion_error_is_transparent() {
        let err = WizardError::from(CompletionError::Transport { message: "timeout".into() });
        assert_eq!(err.to_string(), "API error: timeout");
    }
}
