//! Project state: everything the wizard has produced so far.

use serde::{Deserialize, Serialize};

use super::phase::Phase;
use super::schema::{Angle, AngleList, CrashTestResult, EvaluationSet, Plan, REQUIRED_SELECTION};
use crate::ai::CompletionError;

/// Stored result of one completion step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome<T> {
    Ready(T),
    Failed(CompletionError),
}

impl<T> Outcome<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&CompletionError> {
        match self {
            Self::Ready(_) => None,
            Self::Failed(error) => Some(error),
        }
    }
}

impl<T> From<Result<T, CompletionError>> for Outcome<T> {
    fn from(result: Result<T, CompletionError>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(error) => Self::Failed(error),
        }
    }
}

/// Whole wizard state, keyed the way project files store it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectState {
    /// Active phase
    #[serde(rename = "step")]
    pub phase: Phase,

    /// Idea as first submitted
    #[serde(rename = "idee_initiale", skip_serializing_if = "Option::is_none")]
    pub initial_idea: Option<String>,

    #[serde(rename = "crash_test_result", skip_serializing_if = "Option::is_none")]
    pub crash_test: Option<Outcome<CrashTestResult>>,

    /// Idea after the user's reformulation
    #[serde(rename = "idee_validee", skip_serializing_if = "Option::is_none")]
    pub validated_idea: Option<String>,

    #[serde(rename = "phase_g_result", skip_serializing_if = "Option::is_none")]
    pub generation: Option<Outcome<AngleList>>,

    /// Indices into the generated angles currently ticked
    #[serde(rename = "selection", skip_serializing_if = "Vec::is_empty")]
    pub selection: Vec<usize>,

    /// The three angles carried into prioritization, in list order
    #[serde(rename = "angles_selectionnes", skip_serializing_if = "Vec::is_empty")]
    pub selected_angles: Vec<Angle>,

    #[serde(rename = "phase_p_result", skip_serializing_if = "Option::is_none")]
    pub priorisation: Option<Outcome<EvaluationSet>>,

    #[serde(rename = "angle_choisi", skip_serializing_if = "Option::is_none")]
    pub chosen_angle: Option<Angle>,

    #[serde(rename = "phase_s_result", skip_serializing_if = "Option::is_none")]
    pub plan: Option<Outcome<Plan>>,
}

impl ProjectState {
    pub fn crash_test_result(&self) -> Option<&CrashTestResult> {
        self.crash_test.as_ref().and_then(Outcome::ready)
    }

    pub fn angles(&self) -> Option<&[Angle]> {
        self.generation.as_ref().and_then(Outcome::ready).map(|list| list.angles.as_slice())
    }

    pub fn evaluations(&self) -> Option<&EvaluationSet> {
        self.priorisation.as_ref().and_then(Outcome::ready)
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref().and_then(Outcome::ready)
    }

    /// Failure stored for the active phase, if its last request failed.
    pub fn current_failure(&self) -> Option<&CompletionError> {
        match self.phase {
            Phase::CrashTest => self.crash_test.as_ref().and_then(Outcome::failure),
            Phase::Generation => self.generation.as_ref().and_then(Outcome::failure),
            Phase::Priorisation => self.priorisation.as_ref().and_then(Outcome::failure),
            Phase::Sequencage => self.plan.as_ref().and_then(Outcome::failure),
        }
    }

    /// Whether the active phase has no stored outcome yet.
    pub fn awaiting_response(&self) -> bool {
        match self.phase {
            Phase::CrashTest => self.crash_test.is_none(),
            Phase::Generation => self.generation.is_none(),
            Phase::Priorisation => self.priorisation.is_none(),
            Phase::Sequencage => self.plan.is_none(),
        }
    }

    /// Current selection count against the required one.
    pub fn selection_status(&self) -> SelectionStatus {
        SelectionStatus { selected: self.selection.len() }
    }
}

/// How many angles are ticked, rendered as `n/3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionStatus {
    pub selected: usize,
}

impl SelectionStatus {
    pub fn is_complete(self) -> bool {
        self.selected == REQUIRED_SELECTION
    }
}

impl std::fmt::Display for SelectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.selected, REQUIRED_SELECTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_serializes_to_phase_only() {
        let json = serde_json::to_value(ProjectState::default()).unwrap();
        assert_eq!(json, serde_json::json!({ "step": "crash_test" }));
    }

    #[test]
    fn test_outcome_accessors() {
        let ok: Outcome<u32> = Ok(3).into();
        assert_eq!(ok.ready(), Some(&3));
        assert!(ok.failure().is_none());

        let failed: Outcome<u32> = Err(CompletionError::Malformed { raw: "x".into() }).into();
        assert!(failed.ready().is_none());
        assert_eq!(failed.failure().and_then(|e| e.raw_response()), Some("x"));
    }

    #[test]
    fn test_current_failure_follows_phase() {
        let state = ProjectState {
            phase: Phase::Generation,
            crash_test: Some(Outcome::Failed(CompletionError::Transport { message: "old".into() })),
            ..ProjectState::default()
        };
        assert!(state.current_failure().is_none());
        assert!(state.awaiting_response());
    }

    #[test]
    fn test_selection_status_display() {
        let state = ProjectState { selection: vec![0, 4], ..ProjectState::default() };
        let status = state.selection_status();
        assert_eq!(status.to_string(), "2/3");
        assert!(!status.is_complete());
    }
}
