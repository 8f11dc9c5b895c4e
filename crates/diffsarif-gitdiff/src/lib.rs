//! Diff sources for diffsarif.
//!
//! Turns either a git revision range or a `git diff` style text into one
//! [`diffsarif_core::DiffUnit`] per changed file.

pub mod repo;
pub mod split;

pub use repo::{collect_commit_diffs, CommitRange};
pub use split::split_unified_diff;
