//! The guided brainstorming wizard.
//!
//! Four phases run in order, each backed by one completion request:
//!
//! 1. **Crash test**: D.U.R. scoring of the raw idea
//! 2. **Génération**: ten candidate angles, three of which are selected
//! 3. **Priorisation**: weighted scoring of the selected angles
//! 4. **Séquençage**: a seven-day backcasting plan for the chosen angle
//!
//! [`Session`] drives the phases; [`ProjectState`] is what gets saved.

mod error;
pub mod mapping;
mod phase;
pub mod prompts;
pub mod render;
pub mod schema;
mod session;
pub mod snapshot;
mod state;

pub use error::{SnapshotError, WizardError, WizardResult};
pub use mapping::ResolvedEvaluation;
pub use phase::Phase;
pub use schema::{
    Angle, AngleList, CrashTestResult, DailyStep, EchoedId, Evaluation, EvaluationSet, Plan, Recommendation,
    ResponseSchema, SchemaError, Verdict,
};
pub use session::Session;
pub use state::{Outcome, ProjectState, SelectionStatus};
