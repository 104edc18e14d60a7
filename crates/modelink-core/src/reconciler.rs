use crate::planner::LinkPlan;
use crate::LinkKind;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub links_removed: usize,
    pub dirs_removed: usize,
    pub failures: usize,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct LinkReport {
    pub attempted: usize,
    pub created: usize,
    pub failed: usize,
}

/// Remove every managed link under the target root, then any directory left
/// empty by that removal, innermost first.
///
/// The tree is snapshotted completely before anything is deleted; nothing
/// iterates a directory while removing from it. Regular files that are not
/// links are left alone: the target root is exclusively ours, but the
/// cleaner must not destroy an accidental foreign file. A missing target
/// root is a no-op, and an entry that cannot be inspected or removed is
/// logged and counted in `failures`, never fatal.
pub fn clean(target_root: &Path) -> CleanReport {
    let mut report = CleanReport::default();
    if !target_root.is_dir() {
        return report;
    }

    let mut files = Vec::new();
    let mut dirs = Vec::new();
    snapshot_tree(target_root, &mut files, &mut dirs, &mut report.failures);

    for path in &files {
        if !is_managed_link(path) {
            continue;
        }
        match fs::remove_file(path) {
            Ok(()) => {
                debug!("removed link: {}", path.display());
                report.links_removed += 1;
            }
            Err(e) => {
                warn!("failed to remove link {}: {e}", path.display());
                report.failures += 1;
            }
        }
    }

    // Innermost first, so emptied parents become removable in turn.
    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
    for dir in &dirs {
        if fs::remove_dir(dir).is_ok() {
            debug!("removed empty directory: {}", dir.display());
            report.dirs_removed += 1;
        }
    }

    report
}

/// Create every planned link, replacing stale occupants of destination
/// paths. One failed link is logged and skipped; success of the run means
/// every plan was attempted, not that every plan succeeded.
pub fn recreate(plans: &[LinkPlan]) -> LinkReport {
    let mut report = LinkReport::default();

    for plan in plans {
        report.attempted += 1;
        if let Err(e) = create_one(plan) {
            warn!(
                "failed to link {} -> {}: {e}",
                plan.destination.display(),
                plan.source.display()
            );
            report.failed += 1;
        } else {
            debug!(
                "linked {} -> {}",
                plan.destination.display(),
                plan.source.display()
            );
            report.created += 1;
        }
    }

    report
}

fn create_one(plan: &LinkPlan) -> std::io::Result<()> {
    if let Some(parent) = plan.destination.parent() {
        fs::create_dir_all(parent)?;
    }
    // A stale link or leftover may still occupy the destination.
    if fs::symlink_metadata(&plan.destination).is_ok() {
        fs::remove_file(&plan.destination)?;
    }
    match plan.kind {
        LinkKind::Symbolic => symlink(&plan.source, &plan.destination),
        LinkKind::Hard => fs::hard_link(&plan.source, &plan.destination),
    }
}

#[cfg(unix)]
fn symlink(source: &Path, destination: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, destination)
}

#[cfg(windows)]
fn symlink(source: &Path, destination: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(source, destination)
}

/// Collect all files and directories below `root` into immutable snapshots.
/// `root` itself is not included in `dirs`. Entries that cannot be read are
/// counted as failures and skipped.
fn snapshot_tree(
    root: &Path,
    files: &mut Vec<PathBuf>,
    dirs: &mut Vec<PathBuf>,
    failures: &mut usize,
) {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot read directory {}: {e}", root.display());
            *failures += 1;
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        // symlink_metadata so a symlink to a directory counts as a file.
        let meta = match fs::symlink_metadata(&path) {
            Ok(meta) => meta,
            Err(e) => {
                warn!("cannot inspect {}: {e}", path.display());
                *failures += 1;
                continue;
            }
        };
        if meta.is_dir() {
            dirs.push(path.clone());
            snapshot_tree(&path, files, dirs, failures);
        } else {
            files.push(path);
        }
    }
}

/// A managed link is a symlink, or (on unix) a regular file whose link count
/// shows it is a hard link to a blob. Platforms without a stable link-count
/// API fall back to symlink detection only.
fn is_managed_link(path: &Path) -> bool {
    let Ok(meta) = fs::symlink_metadata(path) else {
        return false;
    };
    if meta.file_type().is_symlink() {
        return true;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        if meta.is_file() && meta.nlink() > 1 {
            return true;
        }
    }
    false
}
