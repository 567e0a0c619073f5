//! Interactive wizard driver.
//!
//! `App` owns the configuration, the session and the completion provider,
//! and runs the line-oriented terminal dialogue. Input and output are generic
//! so the whole dialogue can be driven from tests.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::ai::CompletionProvider;
use crate::core::{Config, SessionHistory};
use crate::wizard::{render, Phase, Session, WizardError, WizardResult};

const HELP: &str = "\
Commandes disponibles à tout moment :
  q        quitter
  x        recommencer depuis le crash test
  r        relancer la requête de la phase en cours
  ?        afficher cette aide";

/// What the dialogue loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Main application state.
pub struct App {
    /// Application configuration
    pub config: Config,

    /// The wizard session
    pub session: Session,

    provider: Box<dyn CompletionProvider>,
    runtime: tokio::runtime::Runtime,
}

impl App {
    /// Create an app with a fresh session.
    pub fn new(config: Config, provider: Box<dyn CompletionProvider>) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;
        let session = Session::with_history(SessionHistory::new(config.session.max_history));

        tracing::debug!(
            session = %session.id(),
            provider = provider.name(),
            model = provider.model(),
            "Wizard session created"
        );

        Ok(Self { config, session, provider, runtime })
    }

    /// Restore a saved project before running.
    pub fn resume(&mut self, path: &Path) -> WizardResult<Phase> {
        self.session.load_project(path)
    }

    /// Run the dialogue until the user quits or input ends.
    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> anyhow::Result<()> {
        writeln!(out, "Brainstormer GPS ({})\n", self.provider.model())?;
        writeln!(out, "{HELP}\n")?;

        loop {
            writeln!(out, "\n{}\n", render::progress(self.session.phase()))?;

            let flow = match self.session.phase() {
                Phase::CrashTest => self.crash_test_step(input, out)?,
                Phase::Generation => self.generation_step(input, out)?,
                Phase::Priorisation => self.priorisation_step(input, out)?,
                Phase::Sequencage => self.sequencage_step(input, out)?,
            };

            if flow == Flow::Quit {
                writeln!(out, "À bientôt !")?;
                return Ok(());
            }
        }
    }

    // ------------------------------------------------------------------------
    // Phase steps
    // ------------------------------------------------------------------------

    fn crash_test_step<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> anyhow::Result<Flow> {
        if self.session.state().awaiting_response() {
            let Some(idea) = prompt(input, out, "Décrivez votre idée :")? else {
                return Ok(Flow::Quit);
            };
            if let Some(flow) = self.global_command(&idea, out)? {
                return Ok(flow);
            }
            return self.request_crash_test(&idea, out);
        }

        if let Some(error) = self.session.state().current_failure() {
            write!(out, "{}", render::failure(error))?;
            let Some(line) = prompt(input, out, "[r] réessayer  [n] nouvelle idée  [q] quitter")? else {
                return Ok(Flow::Quit);
            };
            return match line.as_str() {
                "n" => {
                    self.session.retry();
                    Ok(Flow::Continue)
                }
                _ => self.handle_or_complain(&line, out),
            };
        }

        if let Some(result) = self.session.state().crash_test_result() {
            write!(out, "{}", render::crash_test(result))?;
        }
        let Some(line) = prompt(input, out, "[v] valider l'idée  [n] nouvelle idée  [q] quitter")? else {
            return Ok(Flow::Quit);
        };

        match line.as_str() {
            "v" => {
                let Some(edited) = prompt(input, out, "Reformulez l'idée (Entrée pour la garder) :")? else {
                    return Ok(Flow::Quit);
                };
                let edited = (!edited.is_empty()).then_some(edited.as_str());
                report(out, self.session.approve_idea(edited).map(|_| ()))?;
                Ok(Flow::Continue)
            }
            "n" => {
                self.session.retry();
                Ok(Flow::Continue)
            }
            _ => self.handle_or_complain(&line, out),
        }
    }

    fn generation_step<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> anyhow::Result<Flow> {
        if self.session.state().awaiting_response() {
            writeln!(out, "Génération des angles...")?;
            let result = self.runtime.block_on(self.session.generate_angles(self.provider.as_ref())).map(|_| ());
            return self.after_request(result, input, out);
        }

        if let Some(error) = self.session.state().current_failure() {
            write!(out, "{}", render::failure(error))?;
            let Some(line) = prompt(input, out, "[r] réessayer  [q] quitter")? else {
                return Ok(Flow::Quit);
            };
            return self.handle_or_complain(&line, out);
        }

        let state = self.session.state();
        if let Some(angles) = state.angles() {
            write!(out, "{}", render::angles(angles, &state.selection))?;
        }
        writeln!(out, "\nSélection : {}", self.session.selection_status())?;

        let Some(line) = prompt(
            input,
            out,
            "Numéros à cocher/décocher (ex. 1 4 7), [ok] valider, [r] régénérer, [q] quitter",
        )?
        else {
            return Ok(Flow::Quit);
        };

        if line == "ok" {
            report(out, self.session.advance_to_priorisation().map(|_| ()))?;
            return Ok(Flow::Continue);
        }

        match parse_numbers(&line) {
            Some(numbers) => {
                for number in numbers {
                    if let Err(e) = self.session.toggle_angle(number - 1) {
                        writeln!(out, "⚠️  {e}")?;
                    }
                }
                Ok(Flow::Continue)
            }
            None => self.handle_or_complain(&line, out),
        }
    }

    fn priorisation_step<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> anyhow::Result<Flow> {
        if self.session.state().awaiting_response() {
            writeln!(out, "Évaluation des 3 angles...")?;
            let result = self.runtime.block_on(self.session.prioritize(self.provider.as_ref())).map(|_| ());
            return self.after_request(result, input, out);
        }

        if let Some(error) = self.session.state().current_failure() {
            write!(out, "{}", render::failure(error))?;
            let Some(line) = prompt(input, out, "[r] réessayer  [q] quitter")? else {
                return Ok(Flow::Quit);
            };
            return self.handle_or_complain(&line, out);
        }

        let rows = self.session.evaluation_table()?;
        let recommended = self.session.recommended_position();
        let recommendation = self.session.state().evaluations().and_then(|set| set.recommendation.as_ref());
        write!(out, "{}", render::evaluation_table(&rows, recommended, recommendation))?;

        let question = match recommended {
            Some(position) => format!("Angle final (1-3, Entrée pour l'option {}) :", position + 1),
            None => "Angle final (1-3) :".to_string(),
        };
        let Some(line) = prompt(input, out, &question)? else {
            return Ok(Flow::Quit);
        };

        let choice = match (line.as_str(), recommended) {
            ("", Some(position)) => Some(position),
            (text, _) => text.parse::<usize>().ok().and_then(|n| n.checked_sub(1)),
        };
        match choice {
            Some(index) => {
                report(out, self.session.choose_final(index).map(|_| ()))?;
                Ok(Flow::Continue)
            }
            None => self.handle_or_complain(&line, out),
        }
    }

    fn sequencage_step<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> anyhow::Result<Flow> {
        if self.session.state().awaiting_response() {
            writeln!(out, "Construction du plan...")?;
            let result = self.runtime.block_on(self.session.sequence_plan(self.provider.as_ref())).map(|_| ());
            return self.after_request(result, input, out);
        }

        if let Some(error) = self.session.state().current_failure() {
            write!(out, "{}", render::failure(error))?;
        } else if let Some(plan) = self.session.state().plan() {
            if let Some(angle) = &self.session.state().chosen_angle {
                writeln!(out, "Angle : {}\n", angle.title)?;
            }
            write!(out, "{}", render::plan(plan))?;
        }

        let Some(line) = prompt(
            input,
            out,
            "[s [fichier]] sauvegarder le projet  [p [fichier]] exporter le plan  [x] nouveau projet  [q] quitter",
        )?
        else {
            return Ok(Flow::Quit);
        };

        let (command, argument) = split_command(&line);
        match command {
            "s" => {
                let path = argument.map_or_else(|| self.config.default_project_path(), PathBuf::from);
                let result = self.session.save_project(&path);
                if result.is_ok() {
                    writeln!(out, "💾 Projet sauvegardé : {}", path.display())?;
                }
                report(out, result)?;
                Ok(Flow::Continue)
            }
            "p" => {
                let path = argument.map_or_else(|| self.config.default_plan_path(), PathBuf::from);
                let result = self.session.export_plan(&path);
                if result.is_ok() {
                    writeln!(out, "📄 Plan exporté : {}", path.display())?;
                }
                report(out, result)?;
                Ok(Flow::Continue)
            }
            _ => self.handle_or_complain(&line, out),
        }
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn request_crash_test<W: Write>(&mut self, idea: &str, out: &mut W) -> anyhow::Result<Flow> {
        writeln!(out, "Crash test en cours...")?;
        let result = self.runtime.block_on(self.session.run_crash_test(self.provider.as_ref(), idea));
        report(out, result.map(|_| ()))?;
        Ok(Flow::Continue)
    }

    /// Continue after an automatic request.
    ///
    /// A completion failure is stored and shown on the next pass. Any other
    /// error means the state cannot support the request (a partial project
    /// file, for instance), so input is read before anything is retried.
    fn after_request<R: BufRead, W: Write>(
        &mut self,
        result: WizardResult<()>,
        input: &mut R,
        out: &mut W,
    ) -> anyhow::Result<Flow> {
        match result {
            Ok(()) | Err(WizardError::Completion(_)) => Ok(Flow::Continue),
            Err(e) => {
                writeln!(out, "⚠️  {e}")?;
                let Some(line) = prompt(input, out, "[x] recommencer depuis le crash test  [q] quitter")? else {
                    return Ok(Flow::Quit);
                };
                self.handle_or_complain(&line, out)
            }
        }
    }

    /// Handle `q`, `x`, `r` and `?`. Returns `None` for anything else.
    fn global_command<W: Write>(&mut self, line: &str, out: &mut W) -> anyhow::Result<Option<Flow>> {
        match line {
            "q" => Ok(Some(Flow::Quit)),
            "x" => {
                self.session.reset();
                writeln!(out, "🔄 Nouveau projet.")?;
                Ok(Some(Flow::Continue))
            }
            "r" => {
                let phase = self.session.retry();
                if phase == Phase::CrashTest {
                    if let Some(idea) = self.session.state().initial_idea.clone() {
                        return self.request_crash_test(&idea, out).map(Some);
                    }
                }
                Ok(Some(Flow::Continue))
            }
            "?" => {
                writeln!(out, "{HELP}")?;
                Ok(Some(Flow::Continue))
            }
            _ => Ok(None),
        }
    }

    fn handle_or_complain<W: Write>(&mut self, line: &str, out: &mut W) -> anyhow::Result<Flow> {
        match self.global_command(line, out)? {
            Some(flow) => Ok(flow),
            None => {
                writeln!(out, "Commande inconnue : '{line}' (tapez ? pour l'aide)")?;
                Ok(Flow::Continue)
            }
        }
    }
}

/// Print `question`, read one trimmed line. `None` at end of input.
fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> anyhow::Result<Option<String>> {
    write!(out, "{question}\n> ")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Print a wizard error as a corrective message; other results pass silently.
fn report<W: Write>(out: &mut W, result: WizardResult<()>) -> anyhow::Result<()> {
    match result {
        Ok(()) => Ok(()),
        // Stored in the state and shown on the next pass.
        Err(WizardError::Completion(_)) => Ok(()),
        Err(e) => {
            writeln!(out, "⚠️  {e}")?;
            Ok(())
        }
    }
}

/// Parse `1 4 7` or `1,4,7` into 1-based numbers.
fn parse_numbers(line: &str) -> Option<Vec<usize>> {
    let numbers: Vec<usize> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().ok().filter(|&n| n > 0))
        .collect::<Option<_>>()?;
    (!numbers.is_empty()).then_some(numbers)
}

fn split_command(line: &str) -> (&str, Option<&str>) {
    match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, Some(rest.trim()).filter(|s| !s.is_empty())),
        None => (line, None),
    }
}
