//! Version-control-based changed-file detection. Grounded on `git2`'s diff/status APIs the way VCS-aware
//! Rust tooling in the corpus uses them for working-tree introspection.

use std::path::{Path, PathBuf};

use git2::{Repository, StatusOptions};
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct ChangedFiles {
    pub added_or_modified: Vec<PathBuf>,
    pub untracked: Vec<PathBuf>,
    pub renames: Vec<(PathBuf, PathBuf)>,
}

/// Detects the union of (a) `baseRef..HEAD` added/modified/renamed files,
/// (b) the unstaged diff, and (c) untracked unignored files. Returns
/// `None` when the root is not inside a git work tree or the repository
/// is shallow with an unresolvable `baseRef`.
pub fn detect_changed_files(root: &Path, base_ref: Option<&str>) -> Option<ChangedFiles> {
    let repo = match Repository::discover(root) {
        Ok(repo) => repo,
        Err(e) => {
            debug!(error = %e, "not a git work tree; falling back to full content hashing");
            return None;
        }
    };

    if repo.is_shallow() && base_ref.map_or(false, |r| repo.revparse_single(r).is_err()) {
        warn!("shallow clone cannot resolve baseRef; falling back to full content hashing");
        return None;
    }

    let mut changed = ChangedFiles::default();

    if let Some(base_ref) = base_ref {
        if let Ok(base) = repo.revparse_single(base_ref).and_then(|o| o.peel_to_tree()) {
            let head = repo
                .head()
                .ok()
                .and_then(|h| h.peel_to_tree().ok());
            if let Some(head_tree) = head {
                if let Ok(diff) = repo.diff_tree_to_tree(Some(&base), Some(&head_tree), None) {
                    collect_diff_deltas(&diff, &mut changed, root);
                }
            }
        }
    }

    if let Ok(diff) = repo.diff_index_to_workdir(None, None) {
        collect_diff_deltas(&diff, &mut changed, root);
    }

    let mut status_opts = StatusOptions::new();
    status_opts.include_untracked(true).recurse_untracked_dirs(true);
    if let Ok(statuses) = repo.statuses(Some(&mut status_opts)) {
        for status in statuses.iter() {
            if status.status().is_wt_new() {
                if let Some(path) = status.path() {
                    changed.untracked.push(root.join(path));
                }
            }
        }
    }

    Some(changed)
}

fn collect_diff_deltas(diff: &git2::Diff<'_>, changed: &mut ChangedFiles, root: &Path) {
    for delta in diff.deltas() {
        use git2::Delta;
        let new_path = delta.new_file().path().map(|p| root.join(p));
        let old_path = delta.old_file().path().map(|p| root.join(p));
        match delta.status() {
            Delta::Added | Delta::Modified | Delta::Copied => {
                if let Some(p) = new_path {
                    changed.added_or_modified.push(p);
                }
            }
            Delta::Renamed => {
                if let (Some(from), Some(to)) = (old_path, new_path) {
                    changed.renames.push((from, to));
                }
            }
            _ => {}
        }
    }
}
