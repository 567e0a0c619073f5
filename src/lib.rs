//! # Brainstormer
//!
//! Guided brainstorming GPS for your terminal.
//!
//! Brainstormer walks an idea through four phases, each backed by one
//! chat-completion request that returns JSON:
//!
//! - **Crash test**: D.U.R. scoring (Douloureux, Urgent, Reconnu) of the raw idea
//! - **Génération**: ten candidate angles, three of which are kept
//! - **Priorisation**: weighted conviction matrix over the three angles
//! - **Séquençage**: a seven-day backcasting plan for the chosen angle
//!
//! Replies are recovered from prose or code fences, validated against typed
//! schemas, and stored per phase. A finished project can be saved as JSON and
//! resumed later.
//!
//! ## Quick Start
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! brainstormer
//!
//! # Or the short alias
//! gps
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::future_not_send)]

pub mod ai;
pub mod app;
pub mod core;
pub mod security;
pub mod wizard;

// Re-export commonly used types
pub use ai::{CompletionError, CompletionProvider, OpenAIProvider};
pub use app::App;
pub use core::Config;
pub use wizard::{Phase, ProjectState, Session, WizardError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "brainstormer";

/// Short alias
pub const APP_ALIAS: &str = "gps";
