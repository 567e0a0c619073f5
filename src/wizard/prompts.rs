//! System prompts and user messages for each phase.

use std::fmt::Write;

use super::phase::Phase;
use super::schema::Angle;

/// Number of angles requested from the generation phase.
pub const ANGLES_REQUESTED: usize = 10;

pub const SYSTEM_PROMPT_CRASH_TEST: &str = r#"Tu agis en tant qu'Auditeur Stratégique impitoyable ("Devil's Advocate").
Analyse l'idée selon la matrice D.U.R. (Douloureux, Urgent, Reconnu). Note chaque pilier sur 10.

RÈGLE DE DÉCISION :
- Si Score Total < 20/30 OU si une seule note est < 5/10 : Le projet est "ROUGE".
- Sinon : Le projet est "VERT".

FORMAT DE RÉPONSE ATTENDU (JSON) :
{
  "score_D": 0, "score_U": 0, "score_R": 0, "total": 0,
  "verdict": "VERT ou ROUGE",
  "analyse_critique": "Phrase courte",
  "conseil_architecte": "Action concrète"
}"#;

pub const SYSTEM_PROMPT_GENERATION: &str = r#"Tu es l'Explorateur de Perspectives. Génère 10 angles radicalement différents.
FORMAT JSON : { "angles": [ {"id": 1, "titre": "...", "cible_precise": "...", "opportunite": "..."} ] }"#;

pub const SYSTEM_PROMPT_PRIORISATION: &str = r#"Tu es l'Expert en Stratégie. Utilise la Matrice de Conviction.
Pondération : Douleur (Coef 4), Unicité (Coef 3), Alignement (Coef 3).
NE CHOISIS PAS LA FACILITÉ.

FORMAT DE RÉPONSE ATTENDU (JSON) - RESPECTE STRICTEMENT CE FORMAT :
{
  "evaluations": [
    {
      "id": 1,
      "titre": "Rappel du titre",
      "score_douleur": 0,
      "score_unicite": 0,
      "score_alignement": 0,
      "score_total_pondere": 0
    }
  ],
  "recommandation": {
    "id_gagnant": 1,
    "raison": "..."
  }
}"#;

pub const SYSTEM_PROMPT_SEQUENCAGE: &str = r#"Tu es Chef de Projet Sprint. Utilise le BACKCASTING.
Pars de J+7 (Résultat Final) et remonte jusqu'à J+1.
FORMAT JSON : { "resultat_j7": "...", "etapes_journalieres": [ {"jour": "J+7", "action_principale": "...", "detail_execution": "..."} ] }"#;

/// System prompt sent for a phase.
pub fn system_prompt(phase: Phase) -> &'static str {
    match phase {
        Phase::CrashTest => SYSTEM_PROMPT_CRASH_TEST,
        Phase::Generation => SYSTEM_PROMPT_GENERATION,
        Phase::Priorisation => SYSTEM_PROMPT_PRIORISATION,
        Phase::Sequencage => SYSTEM_PROMPT_SEQUENCAGE,
    }
}

pub fn crash_test_message(idea: &str) -> String {
    format!("Analyse cette idée : {}", idea.trim())
}

pub fn generation_message(idea: &str) -> String {
    format!("Génère {} angles pour : {}", ANGLES_REQUESTED, idea.trim())
}

/// Prioritization message.
///
/// Angles are numbered 1..n by their position in `selected`; whatever id the
/// generation phase gave them is not sent.
pub fn priorisation_message(selected: &[Angle]) -> String {
    let mut message = format!("Classe ces {} options :\n", selected.len());
    for (i, angle) in selected.iter().enumerate() {
        let _ = writeln!(message, "ID {}: {} ({})", i + 1, angle.title, angle.target);
    }
    let _ = write!(
        message,
        "\nIMPORTANT : Utilise uniquement les ID 1 à {} ci-dessus. Calcule bien le 'score_total_pondere'.",
        selected.len()
    );
    message
}

pub fn sequencage_message(angle: &Angle) -> String {
    format!("Plan Backcasting pour : {} (cible : {})", angle.title, angle.target)
}
