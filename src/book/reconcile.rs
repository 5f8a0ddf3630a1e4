use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One pending deletion. `DeleteTree` removes a directory with everything
/// under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    DeleteFile,
    DeleteTree,
}

/// Deletions that would make the destination's leaf files exactly the
/// preserve set. Computed from a tree snapshot without touching anything;
/// `apply` performs the side effects.
#[derive(Debug, Default)]
pub struct ReconcilePlan {
    pub deletions: Vec<(PathBuf, Action)>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOutcome {
    pub removed: usize,
    pub failed: usize,
}

/// Paths produced by both the renderer and the static copier. The caller
/// decides (and diagnoses) which side owns the destination bytes; the
/// reconciler only reports the overlap.
pub fn shadowed(generated: &BTreeSet<PathBuf>, copied: &BTreeSet<PathBuf>) -> Vec<PathBuf> {
    generated.intersection(copied).cloned().collect()
}

/// Decide what to delete under `destination` so that only `preserve`
/// remains.
///
/// Preserve paths are relative to the destination; entries that do not
/// currently exist are ignored. A preserved path keeps its whole subtree.
/// Ancestor directories of preserved paths are pass-through: never deleted
/// themselves, but their other children are still fair game. That is how
/// a hand-placed file survives while stale siblings around it are cleared.
pub fn plan(destination: &Path, preserve: &BTreeSet<PathBuf>) -> Result<ReconcilePlan> {
    let mut kept: BTreeSet<PathBuf> = BTreeSet::new();
    let mut pass_through: BTreeSet<PathBuf> = BTreeSet::new();
    for relative in preserve {
        if !destination.join(relative).exists() {
            continue;
        }
        kept.insert(relative.clone());
        let mut ancestor = relative.parent();
        while let Some(dir) = ancestor {
            if !dir.as_os_str().is_empty() {
                pass_through.insert(dir.to_path_buf());
            }
            ancestor = dir.parent();
        }
    }

    let mut out = ReconcilePlan::default();
    visit(destination, Path::new(""), &kept, &pass_through, &mut out)?;
    Ok(out)
}

fn visit(
    destination: &Path,
    relative_dir: &Path,
    kept: &BTreeSet<PathBuf>,
    pass_through: &BTreeSet<PathBuf>,
    out: &mut ReconcilePlan,
) -> Result<()> {
    let dir = destination.join(relative_dir);
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        // The directory vanished between listing and descent; nothing left
        // to reconcile below it.
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", dir.display()));
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read {}", dir.display()))?;
        names.push(entry.file_name());
    }
    names.sort();

    for name in names {
        let relative = relative_dir.join(&name);
        let full = destination.join(&relative);
        let is_dir = full.is_dir();
        if kept.contains(&relative) {
            continue;
        }
        if is_dir && pass_through.contains(&relative) {
            visit(destination, &relative, kept, pass_through, out)?;
            continue;
        }
        let action = if is_dir {
            Action::DeleteTree
        } else {
            Action::DeleteFile
        };
        out.deletions.push((full, action));
    }
    Ok(())
}

/// Execute a deletion plan.
///
/// A path already gone counts as satisfied. Any other per-path failure is
/// diagnosed and the rest of the plan still runs; nothing is rolled back.
pub fn apply(plan: &ReconcilePlan) -> ApplyOutcome {
    let mut outcome = ApplyOutcome::default();
    for (path, action) in &plan.deletions {
        let result = match action {
            Action::DeleteFile => fs::remove_file(path),
            Action::DeleteTree => fs::remove_dir_all(path),
        };
        match result {
            Ok(()) => {
                debug!("clearing unused entry from output dir: \"{}\"", path.display());
                outcome.removed += 1;
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                outcome.removed += 1;
            }
            Err(err) => {
                warn!("failed to delete \"{}\": {err}", path.display());
                outcome.failed += 1;
            }
        }
    }
    outcome
}

/// Plan and apply in one step.
pub fn reconcile(destination: &Path, preserve: &BTreeSet<PathBuf>) -> Result<ApplyOutcome> {
    let plan = plan(destination, preserve)?;
    Ok(apply(&plan))
}
