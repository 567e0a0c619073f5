//! Wizard flow integration tests.
//!
//! Runs whole sessions against a mock chat-completions endpoint.

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use brainstormer::ai::OpenAIProvider;
use brainstormer::security::SecretValue;
use brainstormer::wizard::{snapshot, Phase, Session, WizardError};
use brainstormer::CompletionError;

/// Wrap reply text in a chat-completions response body.
fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    }))
}

async fn reply_when(server: &MockServer, marker: &str, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains(marker))
        .respond_with(completion(content))
        .mount(server)
        .await;
}

fn provider_for(server: &MockServer) -> OpenAIProvider {
    OpenAIProvider::new(SecretValue::new("test-key")).with_base_url(server.uri())
}

fn angles_json() -> String {
    let angles: Vec<_> = (1..=10)
        .map(|i| {
            json!({
                "id": i,
                "titre": format!("Angle {i}"),
                "cible_precise": format!("Cible {i}"),
                "opportunite": "Opportunité"
            })
        })
        .collect();
    json!({ "angles": angles }).to_string()
}

async fn mount_happy_path(server: &MockServer) {
    // Prose around the object, as models sometimes answer.
    reply_when(
        server,
        "Analyse cette id",
        r#"Voici mon analyse : {"score_D": 8, "score_U": 7, "score_R": 6, "total": 21, "verdict": "VERT", "analyse_critique": "Douleur claire"} Bonne chance."#,
    )
    .await;

    // Fenced reply.
    let fenced = format!("```json\n{}\n```", angles_json());
    reply_when(server, "angles pour", &fenced).await;

    // Ids echoed out of order, with wrong titles and one total missing.
    reply_when(
        server,
        "Classe ces 3 options",
        &json!({
            "evaluations": [
                { "id": 3, "titre": "Titre inventé", "score_douleur": 5, "score_unicite": 5, "score_alignement": 5 },
                { "id": 1, "titre": "Autre", "score_douleur": 9, "score_unicite": 7, "score_alignement": 8, "score_total_pondere": 81 },
                { "id": 2, "titre": "Encore", "score_douleur": 6, "score_unicite": 6, "score_alignement": 6, "score_total_pondere": 60 }
            ],
            "recommandation": { "id_gagnant": 1, "raison": "Douleur maximale" }
        })
        .to_string(),
    )
    .await;

    reply_when(
        server,
        "Plan Backcasting pour",
        &json!({
            "resultat_j7": "Trois clients pilotes",
            "etapes_journalieres": [
                { "jour": "J+1", "action_principale": "Lister 20 prospects" },
                { "jour": "J+7", "action_principale": "Signer", "detail_execution": "Appels" }
            ]
        })
        .to_string(),
    )
    .await;
}

#[tokio::test]
async fn test_full_session_against_mock_server() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;
    let provider = provider_for(&server);

    let mut session = Session::new();

    let result = session.run_crash_test(&provider, "Covoiturage rural").await.unwrap();
    assert_eq!(result.total(), 21);
    assert!(!result.is_alert());
    session.approve_idea(None).unwrap();

    let angles = session.generate_angles(&provider).await.unwrap();
    assert_eq!(angles.angles.len(), 10);

    // Angles 3, 6 and 9 become local options 1, 2 and 3.
    session.set_selection(&[2, 5, 8]).unwrap();
    session.advance_to_priorisation().unwrap();
    session.prioritize(&provider).await.unwrap();

    let rows = session.evaluation_table().unwrap();
    let labels: Vec<_> = rows.iter().map(|r| (r.id.as_number(), r.label.as_str())).collect();
    assert_eq!(labels, [(Some(3), "Angle 9"), (Some(1), "Angle 3"), (Some(2), "Angle 6")]);
    assert_eq!(rows[0].total, 50);
    assert!(rows[0].total_computed);
    assert_eq!(session.recommended_position(), Some(0));

    let chosen = session.choose_final(0).unwrap();
    assert_eq!(chosen.title, "Angle 3");

    let plan = session.sequence_plan(&provider).await.unwrap();
    assert_eq!(plan.target_outcome, "Trois clients pilotes");

    let saved = session.snapshot().unwrap();
    let text = snapshot::to_json(&saved).unwrap();
    let restored = snapshot::from_json(&text).unwrap();
    assert_eq!(restored.phase, Phase::Sequencage);
    assert_eq!(restored.selected_angles, saved.selected_angles);
    assert_eq!(restored.evaluations(), saved.evaluations());
    assert_eq!(restored.plan(), saved.plan());
    assert!(!text.contains("test-key"));
}

#[tokio::test]
async fn test_service_error_is_stored_and_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "Rate limit reached" }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    reply_when(
        &server,
        "Analyse cette id",
        r#"{"score_D": 2, "score_U": 3, "score_R": 4, "verdict": "ROUGE", "analyse_critique": "Personne n'en souffre", "conseil_architecte": "Trouvez une douleur"}"#,
    )
    .await;
    let provider = provider_for(&server);

    let mut session = Session::new();
    let err = session.run_crash_test(&provider, "Une idée floue").await.unwrap_err();
    match err {
        WizardError::Completion(CompletionError::Transport { message }) => {
            assert!(message.contains("Rate limit reached"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(session.state().current_failure().is_some());

    session.retry();
    let result = session.run_crash_test(&provider, "Une idée floue").await.unwrap();
    assert!(result.is_alert());
    assert_eq!(result.advice.as_deref(), Some("Trouvez une douleur"));
}

#[tokio::test]
async fn test_prose_only_reply_is_malformed() {
    let server = MockServer::start().await;
    reply_when(&server, "Analyse cette id", "Je ne peux pas répondre en JSON.").await;
    let provider = provider_for(&server);

    let mut session = Session::new();
    let err = session.run_crash_test(&provider, "Idée").await.unwrap_err();
    assert!(matches!(
        err,
        WizardError::Completion(CompletionError::Malformed { ref raw }) if raw == "Je ne peux pas répondre en JSON."
    ));
    assert_eq!(session.phase(), Phase::CrashTest);
}
