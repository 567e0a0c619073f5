//! Session context and phase controller.
//!
//! A [`Session`] owns the project state and the in-memory history of one
//! user's wizard run. Every phase operation takes it by `&mut` and the
//! completion provider by reference; nothing is global. The credential lives
//! in the provider, so neither reset nor snapshots ever see it.
//!
//! Transitions only follow `crash_test -> generation -> priorisation ->
//! sequencage`, each guarded by its precondition. [`Session::reset`] is the
//! only way back.

use std::path::Path;

use uuid::Uuid;

use super::error::{WizardError, WizardResult};
use super::mapping::{self, ResolvedEvaluation};
use super::phase::Phase;
use super::prompts;
use super::schema::{
    Angle, AngleList, CrashTestResult, EvaluationSet, Plan, ResponseSchema, REQUIRED_SELECTION,
};
use super::snapshot;
use super::state::{Outcome, ProjectState, SelectionStatus};
use crate::ai::{complete_json, CompletionError, CompletionProvider};
use crate::core::{HistoryEvent, SessionHistory};

/// One user's wizard session.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    state: ProjectState,
    history: SessionHistory,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Start a fresh session at the crash test.
    pub fn new() -> Self {
        Self::with_history(SessionHistory::default())
    }

    /// Start a fresh session with a preconfigured history log.
    pub fn with_history(history: SessionHistory) -> Self {
        Self { id: Uuid::new_v4(), state: ProjectState::default(), history }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn state(&self) -> &ProjectState {
        &self.state
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    // ------------------------------------------------------------------------
    // Phase 0: crash test
    // ------------------------------------------------------------------------

    /// Run the D.U.R. crash test on an idea. Can be re-run with a new idea.
    pub async fn run_crash_test(
        &mut self,
        provider: &dyn CompletionProvider,
        idea: &str,
    ) -> WizardResult<&CrashTestResult> {
        self.require_phase(Phase::CrashTest, "crash test")?;

        let idea = idea.trim();
        if idea.is_empty() {
            return Err(WizardError::EmptyIdea);
        }
        self.state.initial_idea = Some(idea.to_string());
        self.state.validated_idea = None;

        let result = self
            .request::<CrashTestResult>(provider, &prompts::crash_test_message(idea))
            .await;

        if let Ok(result) = &result {
            if result.rule_verdict() != result.verdict {
                tracing::warn!(
                    verdict = %result.verdict,
                    rule = %result.rule_verdict(),
                    total = result.score_sum(),
                    "Model verdict disagrees with the D.U.R. rule"
                );
            }
        }

        store(&mut self.state.crash_test, result)
    }

    /// Accept the idea, optionally reformulated, and move to generation.
    pub fn approve_idea(&mut self, edited: Option<&str>) -> WizardResult<Phase> {
        self.require_phase(Phase::CrashTest, "validation de l'idée")?;
        if self.state.crash_test_result().is_none() {
            return Err(WizardError::MissingResult { phase: Phase::CrashTest });
        }

        let idea = edited
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| self.state.initial_idea.as_deref())
            .map(str::to_string)
            .ok_or(WizardError::EmptyIdea)?;

        self.state.validated_idea = Some(idea);
        self.transition(Phase::Generation)?;
        Ok(self.state.phase)
    }

    // ------------------------------------------------------------------------
    // Phase G: generation
    // ------------------------------------------------------------------------

    /// Request angles for the validated idea. Replaces earlier angles and
    /// clears the selection.
    pub async fn generate_angles(
        &mut self,
        provider: &dyn CompletionProvider,
    ) -> WizardResult<&AngleList> {
        self.require_phase(Phase::Generation, "génération")?;
        let idea = self
            .state
            .validated_idea
            .clone()
            .ok_or(WizardError::MissingResult { phase: Phase::CrashTest })?;

        let result = self.request::<AngleList>(provider, &prompts::generation_message(&idea)).await;

        if let Ok(list) = &result {
            if list.angles.len() != prompts::ANGLES_REQUESTED {
                tracing::warn!(
                    received = list.angles.len(),
                    requested = prompts::ANGLES_REQUESTED,
                    "Unexpected number of angles"
                );
            }
        }

        self.state.selection.clear();
        store(&mut self.state.generation, result)
    }

    /// Tick or untick the angle at `index` (0-based).
    pub fn toggle_angle(&mut self, index: usize) -> WizardResult<SelectionStatus> {
        self.require_phase(Phase::Generation, "sélection")?;
        let available = self.generated_count()?;
        if index >= available {
            return Err(WizardError::NoSuchAngle { number: index + 1, available });
        }

        if let Some(pos) = self.state.selection.iter().position(|&i| i == index) {
            self.state.selection.remove(pos);
        } else {
            self.state.selection.push(index);
            self.state.selection.sort_unstable();
        }

        Ok(self.state.selection_status())
    }

    /// Replace the selection with `indices` (0-based, duplicates ignored).
    pub fn set_selection(&mut self, indices: &[usize]) -> WizardResult<SelectionStatus> {
        self.require_phase(Phase::Generation, "sélection")?;
        let available = self.generated_count()?;
        if let Some(&bad) = indices.iter().find(|&&i| i >= available) {
            return Err(WizardError::NoSuchAngle { number: bad + 1, available });
        }

        let mut selection = indices.to_vec();
        selection.sort_unstable();
        selection.dedup();
        self.state.selection = selection;

        Ok(self.state.selection_status())
    }

    pub fn selection_status(&self) -> SelectionStatus {
        self.state.selection_status()
    }

    /// Carry exactly three ticked angles into prioritization.
    pub fn advance_to_priorisation(&mut self) -> WizardResult<&[Angle]> {
        self.require_phase(Phase::Generation, "passage à la priorisation")?;
        let angles = self.state.angles().ok_or(WizardError::MissingResult { phase: Phase::Generation })?;

        // A restored selection is not validated on load.
        let mut selection = self.state.selection.clone();
        selection.sort_unstable();
        selection.dedup();

        let selected = selection.len();
        if selected != REQUIRED_SELECTION {
            return Err(WizardError::SelectionCount { selected });
        }

        let available = angles.len();
        let chosen = selection
            .iter()
            .map(|&i| angles.get(i).cloned().ok_or(WizardError::NoSuchAngle { number: i + 1, available }))
            .collect::<WizardResult<Vec<Angle>>>()?;

        self.state.selection = selection;
        self.state.selected_angles = chosen;
        self.state.priorisation = None;
        self.state.chosen_angle = None;
        self.state.plan = None;
        self.transition(Phase::Priorisation)?;

        Ok(&self.state.selected_angles)
    }

    // ------------------------------------------------------------------------
    // Phase P: prioritization
    // ------------------------------------------------------------------------

    /// Score the three selected angles. They are sent numbered 1..3 by local
    /// position.
    pub async fn prioritize(
        &mut self,
        provider: &dyn CompletionProvider,
    ) -> WizardResult<&EvaluationSet> {
        self.require_phase(Phase::Priorisation, "priorisation")?;
        if self.state.selected_angles.len() != REQUIRED_SELECTION {
            return Err(WizardError::MissingResult { phase: Phase::Generation });
        }

        let message = prompts::priorisation_message(&self.state.selected_angles);
        let result = self.request::<EvaluationSet>(provider, &message).await;
        store(&mut self.state.priorisation, result)
    }

    /// Evaluation rows with titles resolved from the local selection.
    pub fn evaluation_table(&self) -> WizardResult<Vec<ResolvedEvaluation>> {
        let set = self.state.evaluations().ok_or(WizardError::MissingResult { phase: Phase::Priorisation })?;
        Ok(mapping::resolve_evaluations(set, &self.state.selected_angles))
    }

    /// Local index of the recommended angle, when the model named a valid one.
    pub fn recommended_position(&self) -> Option<usize> {
        let set = self.state.evaluations()?;
        mapping::recommended_position(set, &self.state.selected_angles)
    }

    /// Confirm the final angle by its index among the three selected
    /// (0-based) and move to sequencing.
    pub fn choose_final(&mut self, index: usize) -> WizardResult<&Angle> {
        self.require_phase(Phase::Priorisation, "choix final")?;
        if self.state.evaluations().is_none() {
            return Err(WizardError::MissingResult { phase: Phase::Priorisation });
        }

        let available = self.state.selected_angles.len();
        let angle = self
            .state
            .selected_angles
            .get(index)
            .cloned()
            .ok_or(WizardError::InvalidChoice { choice: index + 1, available })?;

        self.state.plan = None;
        self.transition(Phase::Sequencage)?;
        Ok(&*self.state.chosen_angle.insert(angle))
    }

    // ------------------------------------------------------------------------
    // Phase S: sequencing
    // ------------------------------------------------------------------------

    /// Build the backcasting plan for the chosen angle.
    pub async fn sequence_plan(&mut self, provider: &dyn CompletionProvider) -> WizardResult<&Plan> {
        self.require_phase(Phase::Sequencage, "séquençage")?;
        let angle = self
            .state
            .chosen_angle
            .clone()
            .ok_or(WizardError::MissingResult { phase: Phase::Priorisation })?;

        let result = self.request::<Plan>(provider, &prompts::sequencage_message(&angle)).await;
        store(&mut self.state.plan, result)
    }

    // ------------------------------------------------------------------------
    // Retry, reset, files
    // ------------------------------------------------------------------------

    /// Discard the active phase's stored outcome so it can be requested again.
    pub fn retry(&mut self) -> Phase {
        let phase = self.state.phase;
        match phase {
            Phase::CrashTest => self.state.crash_test = None,
            Phase::Generation => {
                self.state.generation = None;
                self.state.selection.clear();
            }
            Phase::Priorisation => self.state.priorisation = None,
            Phase::Sequencage => self.state.plan = None,
        }
        self.history.record(HistoryEvent::Discarded { phase });
        phase
    }

    /// Clear all phase data and return to the crash test.
    ///
    /// The history log is kept.
    pub fn reset(&mut self) {
        let from = self.state.phase;
        self.state = ProjectState::default();
        self.history.record(HistoryEvent::Reset { from });
        tracing::info!(session = %self.id, %from, "Session reset");
    }

    /// Copy of the state for a project file. Only offered at the last phase.
    pub fn snapshot(&self) -> WizardResult<ProjectState> {
        if self.state.phase != Phase::Sequencage {
            return Err(WizardError::SnapshotUnavailable { phase: self.state.phase });
        }
        Ok(self.state.clone())
    }

    /// Write the project file.
    pub fn save_project(&mut self, path: &Path) -> WizardResult<()> {
        let state = self.snapshot()?;
        snapshot::save(&state, path)?;
        self.history.record(HistoryEvent::Saved { path: path.to_path_buf() });
        Ok(())
    }

    /// Write the plan alone.
    pub fn export_plan(&mut self, path: &Path) -> WizardResult<()> {
        let plan = self.state.plan().ok_or(WizardError::MissingResult { phase: Phase::Sequencage })?;
        snapshot::export_plan(plan, path)?;
        self.history.record(HistoryEvent::Saved { path: path.to_path_buf() });
        Ok(())
    }

    /// Overwrite the state wholesale and resume at its saved phase.
    pub fn restore(&mut self, state: ProjectState) {
        let phase = state.phase;
        self.state = state;
        self.history.record(HistoryEvent::Restored { phase });
        tracing::info!(session = %self.id, %phase, "Project restored");
    }

    /// Read a project file and restore it.
    pub fn load_project(&mut self, path: &Path) -> WizardResult<Phase> {
        let state = snapshot::load(path)?;
        self.restore(state);
        Ok(self.state.phase)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn require_phase(&self, expected: Phase, action: &'static str) -> WizardResult<()> {
        if self.state.phase == expected {
            Ok(())
        } else {
            Err(WizardError::WrongPhase { action, phase: self.state.phase })
        }
    }

    fn transition(&mut self, to: Phase) -> WizardResult<()> {
        let from = self.state.phase;
        if !from.can_transition_to(to) {
            return Err(WizardError::IllegalTransition { from, to });
        }

        self.state.phase = to;
        self.history.record(HistoryEvent::Advanced { from, to });
        tracing::info!(session = %self.id, %from, %to, "Phase transition");
        Ok(())
    }

    fn generated_count(&self) -> WizardResult<usize> {
        self.state
            .angles()
            .map(<[Angle]>::len)
            .ok_or(WizardError::MissingResult { phase: Phase::Generation })
    }

    /// Send the active phase's system prompt with `user_message` and decode
    /// the reply as `T`.
    async fn request<T: ResponseSchema>(
        &mut self,
        provider: &dyn CompletionProvider,
        user_message: &str,
    ) -> Result<T, CompletionError> {
        let phase = self.state.phase;
        self.history.record(HistoryEvent::Requested { phase });

        let result = match complete_json(provider, prompts::system_prompt(phase), user_message).await {
            Ok(reply) => match T::decode(&reply.object) {
                Ok(value) => Ok((value, reply.strategy)),
                Err(e) => {
                    tracing::warn!(%phase, error = %e, "Response does not match {}", T::NAME);
                    Err(CompletionError::Schema { error: e.to_string(), raw: reply.raw })
                }
            },
            Err(e) => Err(e),
        };

        match result {
            Ok((value, strategy)) => {
                self.history.record(HistoryEvent::Succeeded { phase, strategy: strategy.name() });
                Ok(value)
            }
            Err(error) => {
                self.history.record(HistoryEvent::Failed { phase, error: error.to_string() });
                Err(error)
            }
        }
    }
}

/// Store a phase outcome and hand back the accepted value or the failure.
fn store<T>(slot: &mut Option<Outcome<T>>, result: Result<T, CompletionError>) -> WizardResult<&T> {
    match slot.insert(Outcome::from(result)) {
        Outcome::Ready(value) => Ok(&*value),
        Outcome::Failed(error) => Err(WizardError::Completion(error.clone())),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;

    /// Provider answering from a queue and recording every user message.
    struct ScriptedProvider {
        replies: Mutex<VecDeque<anyhow::Result<String>>>,
        sent: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<anyhow::Result<String>>) -> Self {
            Self { replies: Mutex::new(replies.into()), sent: Mutex::new(Vec::new()) }
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, _system: &str, user_message: &str) -> anyhow::Result<String> {
            self.sent.lock().unwrap().push(user_message.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted reply left")))
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "test-model"
        }
    }

    fn crash_test_reply(verdict: &str) -> anyhow::Result<String> {
        Ok(json!({
            "score_D": 8, "score_U": 7, "score_R": 9, "total": 24,
            "verdict": verdict,
            "analyse_critique": "Problème réel et reconnu.",
            "conseil_architecte": "Creusez la cible."
        })
        .to_string())
    }

    fn angles_reply(count: usize) -> anyhow::Result<String> {
        let angles: Vec<_> = (1..=count)
            .map(|i| {
                json!({
                    "id": i,
                    "titre": format!("Angle {i}"),
                    "cible_precise": format!("Cible {i}"),
                    "opportunite": "Marché ouvert"
                })
            })
            .collect();
        Ok(json!({ "angles": angles }).to_string())
    }

    fn evaluations_reply(winner: u32) -> anyhow::Result<String> {
        Ok(json!({
            "evaluations": [
                { "id": 1, "titre": "x", "score_douleur": 6, "score_unicite": 5, "score_alignement": 7, "score_total_pondere": 60 },
                { "id": 2, "titre": "y", "score_douleur": 9, "score_unicite": 8, "score_alignement": 8, "score_total_pondere": 84 },
                { "id": 3, "titre": "z", "score_douleur": 4, "score_unicite": 6, "score_alignement": 5, "score_total_pondere": 49 }
            ],
            "recommandation": { "id_gagnant": winner, "raison": "Douleur maximale" }
        })
        .to_string())
    }

    fn plan_reply() -> anyhow::Result<String> {
        Ok(json!({
            "resultat_j7": "10 entretiens clients réalisés",
            "etapes_journalieres": [
                { "jour": "J+1", "action_principale": "Lister 30 prospects", "detail_execution": "LinkedIn" },
                { "jour": "J+7", "action_principale": "Synthèse" }
            ]
        })
        .to_string())
    }

    async fn session_at_priorisation(provider: &ScriptedProvider) -> Session {
        let mut session = Session::new();
        session.run_crash_test(provider, "Une app de covoiturage rural").await.unwrap();
        session.approve_idea(None).unwrap();
        session.generate_angles(provider).await.unwrap();
        session.set_selection(&[1, 4, 7]).unwrap();
        session.advance_to_priorisation().unwrap();
        session
    }

    #[tokio::test]
    async fn test_empty_idea_is_rejected_without_request() {
        let provider = ScriptedProvider::new(vec![]);
        let mut session = Session::new();

        let err = session.run_crash_test(&provider, "   ").await.unwrap_err();
        assert!(matches!(err, WizardError::EmptyIdea));
        assert!(provider.sent().is_empty());
        assert!(session.state().crash_test.is_none());
    }

    #[tokio::test]
    async fn test_crash_test_then_reformulated_idea() {
        let provider = ScriptedProvider::new(vec![crash_test_reply("VERT")]);
        let mut session = Session::new();

        let result = session.run_crash_test(&provider, "Idée brute").await.unwrap();
        assert!(!result.is_alert());

        let phase = session.approve_idea(Some("  Idée reformulée ")).unwrap();
        assert_eq!(phase, Phase::Generation);
        assert_eq!(session.state().validated_idea.as_deref(), Some("Idée reformulée"));
        assert_eq!(session.state().initial_idea.as_deref(), Some("Idée brute"));
    }

    #[tokio::test]
    async fn test_failure_is_stored_and_keeps_phase() {
        let provider = ScriptedProvider::new(vec![Ok("Désolé, je ne peux pas.".to_string())]);
        let mut session = Session::new();

        let err = session.run_crash_test(&provider, "Idée").await.unwrap_err();
        assert!(matches!(err, WizardError::Completion(CompletionError::Malformed { .. })));
        assert_eq!(session.phase(), Phase::CrashTest);
        assert_eq!(
            session.state().current_failure().and_then(CompletionError::raw_response),
            Some("Désolé, je ne peux pas.")
        );
        assert_eq!(session.history().failures(Phase::CrashTest), 1);

        // No result to approve.
        assert!(matches!(session.approve_idea(None), Err(WizardError::MissingResult { .. })));
    }

    #[tokio::test]
    async fn test_schema_failure_keeps_raw_reply() {
        let provider = ScriptedProvider::new(vec![Ok(r#"{"score_D": 5}"#.to_string())]);
        let mut session = Session::new();

        let err = session.run_crash_test(&provider, "Idée").await.unwrap_err();
        match err {
            WizardError::Completion(CompletionError::Schema { error, raw }) => {
                assert!(error.contains("score_U"));
                assert_eq!(raw, r#"{"score_D": 5}"#);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_selection_of_two_is_rejected() {
        let provider = ScriptedProvider::new(vec![crash_test_reply("VERT"), angles_reply(10)]);
        let mut session = Session::new();
        session.run_crash_test(&provider, "Idée").await.unwrap();
        session.approve_idea(None).unwrap();
        session.generate_angles(&provider).await.unwrap();

        session.toggle_angle(0).unwrap();
        let status = session.toggle_angle(3).unwrap();
        assert_eq!(status.to_string(), "2/3");

        let err = session.advance_to_priorisation().unwrap_err();
        assert_eq!(err.to_string(), "Sélectionnez exactement 3 angles (2/3)");
        assert_eq!(session.phase(), Phase::Generation);

        // Toggling again removes.
        assert_eq!(session.toggle_angle(0).unwrap().selected, 1);
        assert!(matches!(session.toggle_angle(10), Err(WizardError::NoSuchAngle { number: 11, available: 10 })));
    }

    #[tokio::test]
    async fn test_regeneration_clears_selection() {
        let provider = ScriptedProvider::new(vec![
            crash_test_reply("VERT"),
            angles_reply(10),
            angles_reply(10),
        ]);
        let mut session = Session::new();
        session.run_crash_test(&provider, "Idée").await.unwrap();
        session.approve_idea(None).unwrap();
        session.generate_angles(&provider).await.unwrap();
        session.set_selection(&[0, 1, 2]).unwrap();

        session.generate_angles(&provider).await.unwrap();
        assert_eq!(session.selection_status().selected, 0);
    }

    #[tokio::test]
    async fn test_priorisation_uses_local_numbering() {
        let provider = ScriptedProvider::new(vec![
            crash_test_reply("VERT"),
            angles_reply(10),
            evaluations_reply(2),
        ]);
        let mut session = session_at_priorisation(&provider).await;
        session.prioritize(&provider).await.unwrap();

        let sent = provider.sent();
        let message = &sent[2];
        assert!(message.contains("ID 1: Angle 2"));
        assert!(message.contains("ID 2: Angle 5"));
        assert!(message.contains("ID 3: Angle 8"));

        let rows = session.evaluation_table().unwrap();
        let labels: Vec<_> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["Angle 2", "Angle 5", "Angle 8"]);
        assert_eq!(session.recommended_position(), Some(1));
    }

    #[tokio::test]
    async fn test_full_run_and_snapshot_round_trip() {
        let provider = ScriptedProvider::new(vec![
            crash_test_reply("VERT"),
            angles_reply(10),
            evaluations_reply(2),
            plan_reply(),
        ]);
        let mut session = session_at_priorisation(&provider).await;
        session.prioritize(&provider).await.unwrap();

        assert!(matches!(session.snapshot(), Err(WizardError::SnapshotUnavailable { .. })));
        assert!(matches!(session.choose_final(3), Err(WizardError::InvalidChoice { choice: 4, available: 3 })));

        let chosen = session.choose_final(1).unwrap();
        assert_eq!(chosen.title, "Angle 5");
        assert_eq!(session.phase(), Phase::Sequencage);

        let plan = session.sequence_plan(&provider).await.unwrap();
        assert_eq!(plan.steps.len(), 2);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projet.json");
        session.save_project(&path).unwrap();

        let mut restored = Session::new();
        assert_eq!(restored.load_project(&path).unwrap(), Phase::Sequencage);
        assert_eq!(restored.state(), session.state());
        assert_eq!(restored.state().chosen_angle.as_ref().map(|a| a.title.as_str()), Some("Angle 5"));
    }

    #[tokio::test]
    async fn test_reset_keeps_history() {
        let provider = ScriptedProvider::new(vec![crash_test_reply("ROUGE")]);
        let mut session = Session::new();
        session.run_crash_test(&provider, "Idée").await.unwrap();
        session.approve_idea(None).unwrap();
        let before = session.history().len();

        session.reset();
        assert_eq!(session.phase(), Phase::CrashTest);
        assert_eq!(session.state(), &ProjectState::default());
        assert_eq!(session.history().len(), before + 1);
        assert!(matches!(session.history().last().map(|e| &e.event), Some(HistoryEvent::Reset { from: Phase::Generation })));
    }

    #[tokio::test]
    async fn test_retry_discards_only_active_phase() {
        let provider = ScriptedProvider::new(vec![crash_test_reply("VERT"), angles_reply(10)]);
        let mut session = Session::new();
        session.run_crash_test(&provider, "Idée").await.unwrap();
        session.approve_idea(None).unwrap();
        session.generate_angles(&provider).await.unwrap();

        assert_eq!(session.retry(), Phase::Generation);
        assert!(session.state().generation.is_none());
        assert!(session.state().crash_test_result().is_some());
    }

    #[test]
    fn test_operations_outside_their_phase() {
        let mut session = Session::new();
        assert!(matches!(session.toggle_angle(0), Err(WizardError::WrongPhase { .. })));
        assert!(matches!(session.advance_to_priorisation(), Err(WizardError::WrongPhase { .. })));
        assert!(matches!(session.choose_final(0), Err(WizardError::WrongPhase { .. })));
    }

    fn restored_at_generation(selection: Vec<usize>) -> Session {
        let angles = (1..=3)
            .map(|i| Angle {
                id: Some(i),
                title: format!("Angle {i}"),
                target: "cible".to_string(),
                opportunity: "opportunité".to_string(),
            })
            .collect();
        let mut session = Session::new();
        session.restore(ProjectState {
            phase: Phase::Generation,
            generation: Some(Outcome::Ready(AngleList { angles })),
            selection,
            ..ProjectState::default()
        });
        session
    }

    #[test]
    fn test_restored_selection_out_of_range() {
        let mut session = restored_at_generation(vec![0, 1, 99]);

        let err = session.advance_to_priorisation().unwrap_err();
        assert!(matches!(err, WizardError::NoSuchAngle { number: 100, available: 3 }));
        assert_eq!(session.phase(), Phase::Generation);
        assert!(session.state().selected_angles.is_empty());
    }

    #[test]
    fn test_restored_duplicate_selection_counts_once() {
        let mut session = restored_at_generation(vec![0, 0, 0]);

        let err = session.advance_to_priorisation().unwrap_err();
        assert_eq!(err.to_string(), "Sélectionnez exactement 3 angles (1/3)");
        assert_eq!(session.phase(), Phase::Generation);
    }

    #[test]
    fn test_restored_valid_selection_advances() {
        let mut session = restored_at_generation(vec![2, 0, 1]);

        let titles: Vec<_> = session.advance_to_priorisation().unwrap().iter().map(|a| a.title.clone()).collect();
        assert_eq!(titles, ["Angle 1", "Angle 2", "Angle 3"]);
    }

    #[test]
    fn test_restore_overwrites_state() {
        let mut session = Session::new();
        let state = ProjectState { phase: Phase::Priorisation, ..ProjectState::default() };
        session.restore(state.clone());
        assert_eq!(session.state(), &state);
        assert!(matches!(session.history().last().map(|e| &e.event), Some(HistoryEvent::Restored { .. })));
    }
}
