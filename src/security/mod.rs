//! Security module for Brainstormer.
//!
//! The only secret the application handles is the user's completion-service
//! key. It is redacted in `Debug`/`Display`, zeroed on drop when the
//! `secrets` feature is enabled, and never serialized into a project file.

mod secrets;

pub use secrets::{KeySource, SecretValue, SecretsError, SecretsManager, SecretsResult, OPENAI_KEY_ENV};
