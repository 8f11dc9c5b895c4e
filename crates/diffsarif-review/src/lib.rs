//! Diff analysis pipeline: from changed files to one SARIF report.
//!
//! Provides the prompt builder, the completion client, the response parser,
//! SARIF normalization and aggregation, and the orchestrator tying them
//! together.

pub mod llm;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod sarif;
