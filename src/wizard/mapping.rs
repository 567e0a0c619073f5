//! Mapping of model-echoed identifiers back to locally held angles.
//!
//! The three selected angles are sent to the model numbered 1..3 by their
//! position in the local selection. Every id coming back is resolved against
//! that position; the model's own titles and original generation ids are
//! never used to identify an angle.

use super::schema::{Angle, EchoedId, Evaluation, EvaluationSet};

/// Resolve a 1-based id to a 0-based position in `selected`.
///
/// Negative, zero, out-of-range and non-numeric ids resolve to nothing.
pub fn local_position(id: &EchoedId, selected: &[Angle]) -> Option<usize> {
    let index = usize::try_from(id.as_number()?).ok()?.checked_sub(1)?;
    (index < selected.len()).then_some(index)
}

/// Label shown for an id that matches no local angle.
pub fn unknown_label(id: &EchoedId) -> String {
    format!("Option inconnue (#{id})")
}

/// One evaluation row, with the title taken from local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEvaluation {
    /// Id as echoed by the model
    pub id: EchoedId,
    /// Position in the local selection, `None` when the id is out of range
    pub position: Option<usize>,
    /// Local angle title, or the unknown sentinel
    pub label: String,
    pub pain: u32,
    pub uniqueness: u32,
    pub alignment: u32,
    /// Weighted total, reported or computed
    pub total: u32,
    /// Whether `total` had to be computed locally
    pub total_computed: bool,
}

impl ResolvedEvaluation {
    fn new(evaluation: &Evaluation, selected: &[Angle]) -> Self {
        let position = local_position(&evaluation.id, selected);
        let label = position
            .map(|i| selected[i].title.clone())
            .unwrap_or_else(|| unknown_label(&evaluation.id));

        if position.is_none() {
            tracing::warn!(id = %evaluation.id, "Evaluation refers to an unknown angle");
        }

        Self {
            id: evaluation.id.clone(),
            position,
            label,
            pain: evaluation.pain,
            uniqueness: evaluation.uniqueness,
            alignment: evaluation.alignment,
            total: evaluation.total(),
            total_computed: evaluation.weighted_total.is_none(),
        }
    }

    /// Whether the row maps to a local angle.
    pub fn is_known(&self) -> bool {
        self.position.is_some()
    }
}

/// Resolve every evaluation against the local selection, in response order.
pub fn resolve_evaluations(set: &EvaluationSet, selected: &[Angle]) -> Vec<ResolvedEvaluation> {
    set.evaluations.iter().map(|e| ResolvedEvaluation::new(e, selected)).collect()
}

/// Position of the recommended angle, if the model named a valid one.
pub fn recommended_position(set: &EvaluationSet, selected: &[Angle]) -> Option<usize> {
    let winner = set.recommendation.as_ref()?.winner_id.as_ref()?;
    local_position(winner, selected)
}
