//! Core types for Brainstormer.
//!
//! Configuration and the in-memory session history.

mod config;
pub mod history;

pub use config::{AiConfig, Config, ProjectConfig, SessionConfig, LOCAL_CONFIG_FILE};
pub use history::{HistoryEntry, HistoryEvent, SessionHistory};
