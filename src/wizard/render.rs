//! Plain-text rendering of wizard results for the terminal.
//!
//! Every function returns a `String`; printing is left to the caller.

use std::fmt::Write;

use super::mapping::ResolvedEvaluation;
use super::phase::Phase;
use super::schema::{Angle, CrashTestResult, Plan, Recommendation, MAX_SCORE};
use super::state::ProjectState;
use crate::ai::CompletionError;

const PROGRESS_WIDTH: usize = 20;

/// Progress bar and heading for a phase.
pub fn progress(phase: Phase) -> String {
    let filled = PROGRESS_WIDTH * usize::from(phase.progress()) / 100;
    format!(
        "[{}{}] {:>3}%  {}",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled),
        phase.progress(),
        phase.title()
    )
}

/// Crash-test scores and verdict.
///
/// A red verdict is shown as an alert with the advice; a green one as a
/// success line.
pub fn crash_test(result: &CrashTestResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Douloureux : {}/{}", result.score_d, MAX_SCORE);
    let _ = writeln!(out, "  Urgent     : {}/{}", result.score_u, MAX_SCORE);
    let _ = writeln!(out, "  Reconnu    : {}/{}", result.score_r, MAX_SCORE);
    let _ = writeln!(out, "  Total      : {}/{}", result.total(), 3 * MAX_SCORE);
    out.push('\n');

    if result.is_alert() {
        let _ = writeln!(out, "🛑 ALERTE ROUGE : {}", result.critique);
        if let Some(advice) = &result.advice {
            let _ = writeln!(out, "💡 Conseil : {advice}");
        }
    } else {
        let _ = writeln!(out, "✅ FEU VERT : {}", result.critique);
    }
    out
}

/// Numbered angle list with selection marks.
pub fn angles(angles: &[Angle], selection: &[usize]) -> String {
    let mut out = String::new();
    for (i, angle) in angles.iter().enumerate() {
        let mark = if selection.contains(&i) { "[x]" } else { "[ ]" };
        let _ = writeln!(out, "{mark} {:>2}. {}", i + 1, angle.title);
        let _ = writeln!(out, "        🎯 {}", angle.target);
        let _ = writeln!(out, "        {}", angle.opportunity);
    }
    out
}

/// Evaluation table, with the recommended row marked.
pub fn evaluation_table(
    rows: &[ResolvedEvaluation],
    recommended: Option<usize>,
    recommendation: Option<&Recommendation>,
) -> String {
    let width = rows.iter().map(|r| r.label.chars().count()).max().unwrap_or(0).max(5);

    let mut out = String::new();
    let _ = writeln!(out, "     {:<width$}  Douleur  Unicité  Alignement  Total", "Angle");
    for row in rows {
        let star = if row.position.is_some() && row.position == recommended { " ★" } else { "  " };
        let computed = if row.total_computed { "*" } else { " " };
        let _ = writeln!(
            out,
            "{star} {}. {:<width$}  {:>7}  {:>7}  {:>10}  {:>4}{computed}",
            row.id, row.label, row.pain, row.uniqueness, row.alignment, row.total
        );
    }

    if rows.iter().any(|r| r.total_computed) {
        out.push_str("  * total recalculé (4 x douleur + 3 x unicité + 3 x alignement)\n");
    }

    if let (Some(position), Some(reco)) = (recommended, recommendation) {
        let _ = write!(out, "\n🏆 Recommandation : option {}", position + 1);
        match &reco.reason {
            Some(reason) => {
                let _ = writeln!(out, " ({reason})");
            }
            None => out.push('\n'),
        }
    }
    out
}

/// Backcasting plan.
pub fn plan(plan: &Plan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "🎯 Objectif J+7 : {}\n", plan.target_outcome);
    for step in &plan.steps {
        let _ = writeln!(out, "  {} : {}", step.day, step.action);
        if let Some(detail) = &step.detail {
            let _ = writeln!(out, "         {detail}");
        }
    }
    out
}

/// Failure message, with the raw reply when the service answered.
pub fn failure(error: &CompletionError) -> String {
    let mut out = format!("Erreur : {error}\n");
    if let Some(raw) = error.raw_response() {
        let _ = writeln!(out, "Réponse brute :\n{raw}");
    }
    out
}

/// Everything a saved project holds, phase by phase.
pub fn project(state: &ProjectState) -> String {
    let mut out = progress(state.phase);
    out.push_str("\n\n");

    if let Some(idea) = state.validated_idea.as_ref().or(state.initial_idea.as_ref()) {
        let _ = writeln!(out, "Idée : {idea}\n");
    }
    if let Some(result) = state.crash_test_result() {
        out.push_str(&crash_test(result));
        out.push('\n');
    }
    if let Some(chosen) = &state.chosen_angle {
        let _ = writeln!(out, "Angle retenu : {} ({})\n", chosen.title, chosen.target);
    } else if !state.selected_angles.is_empty() {
        out.push_str("Angles sélectionnés :\n");
        for (i, angle) in state.selected_angles.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, angle.title);
        }
        out.push('\n');
    }
    if let Some(plan_result) = state.plan() {
        out.push_str(&plan(plan_result));
    }
    if let Some(error) = state.current_failure() {
        out.push_str(&failure(error));
    }
    out
}
