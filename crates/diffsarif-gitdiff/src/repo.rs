//! Per-file diffs between two revisions of a git repository, via git2.

use std::path::Path;

use diffsarif_core::{DiffSarifError, DiffUnit};
use git2::{Delta, DiffOptions, Patch, Repository};

use crate::split::hunk_body;

/// Revisions to compare.
///
/// # Examples
///
/// ```
/// use diffsarif_gitdiff::CommitRange;
///
/// let range = CommitRange::default();
/// assert_eq!(range.base, "HEAD^");
/// assert_eq!(range.head, "HEAD");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRange {
    /// Older revision (default: `HEAD^`).
    pub base: String,
    /// Newer revision (default: `HEAD`).
    pub head: String,
}

impl Default for CommitRange {
    fn default() -> Self {
        Self {
            base: "HEAD^".into(),
            head: "HEAD".into(),
        }
    }
}

/// Collect one [`DiffUnit`] per file changed between `range.base` and
/// `range.head`.
///
/// Deleted files, binary files and paths that no longer exist in the working
/// tree are skipped. Each unit's diff text starts at the first hunk header.
///
/// # Errors
///
/// Returns [`DiffSarifError::Git`] if the repository cannot be opened, a
/// revision cannot be resolved, or the diff cannot be computed.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use diffsarif_gitdiff::{collect_commit_diffs, CommitRange};
///
/// let units = collect_commit_diffs(Path::new("."), &CommitRange::default()).unwrap();
/// for unit in &units {
///     println!("{}", unit.filename);
/// }
/// ```
pub fn collect_commit_diffs(
    repo_path: &Path,
    range: &CommitRange,
) -> Result<Vec<DiffUnit>, DiffSarifError> {
    let repo = Repository::discover(repo_path)
        .map_err(|e| DiffSarifError::Git(format!("failed to open repository: {e}")))?;

    let base_tree = resolve_tree(&repo, &range.base)?;
    let head_tree = resolve_tree(&repo, &range.head)?;

    let mut diff_opts = DiffOptions::new();
    let diff = repo
        .diff_tree_to_tree(Some(&base_tree), Some(&head_tree), Some(&mut diff_opts))
        .map_err(|e| DiffSarifError::Git(format!("failed to compute diff: {e}")))?;

    let workdir = repo.workdir();
    let mut units = Vec::new();

    for delta_idx in 0..diff.deltas().len() {
        let Some(delta) = diff.get_delta(delta_idx) else {
            continue;
        };
        if delta.status() == Delta::Deleted {
            continue;
        }

        let Some(path) = delta.new_file().path().map(Path::to_path_buf) else {
            continue;
        };
        if let Some(dir) = workdir {
            if !dir.join(&path).exists() {
                tracing::debug!(path = %path.display(), "skipping file missing from working tree");
                continue;
            }
        }

        let Some(mut patch) = Patch::from_diff(&diff, delta_idx)
            .map_err(|e| DiffSarifError::Git(format!("failed to build patch: {e}")))?
        else {
            continue;
        };
        if patch.delta().flags().is_binary() {
            tracing::debug!(path = %path.display(), "skipping binary file");
            continue;
        }

        let buf = patch
            .to_buf()
            .map_err(|e| DiffSarifError::Git(format!("failed to render patch: {e}")))?;
        let text = String::from_utf8_lossy(&buf);

        units.push(DiffUnit::new(
            path.to_string_lossy().replace('\\', "/"),
            hunk_body(&text),
        ));
    }

    Ok(units)
}

fn resolve_tree<'r>(repo: &'r Repository, spec: &str) -> Result<git2::Tree<'r>, DiffSarifError> {
    repo.revparse_single(spec)
        .and_then(|object| object.peel_to_tree())
        .map_err(|e| DiffSarifError::Git(format!("failed to resolve revision '{spec}': {e}")))
}
