use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::AppError;
use crate::models::history::{MoveHistory, MoveRecord};

#[derive(Debug)]
pub struct UndoReport {
    pub batch_id: String,
    pub restored: usize,
    pub pruned_dirs: Vec<PathBuf>,
}

/// Reverse the most recent batch and prune the directories it may have
/// created. All destinations are verified before anything moves, and the
/// batch is popped only after every record has been reversed; a failed
/// preflight mutates nothing. Directory pruning is best-effort and never
/// fails the undo.
pub fn undo(base: &Path, history: &mut MoveHistory) -> Result<UndoReport, AppError> {
    let batch = history
        .peek()
        .cloned()
        .ok_or_else(|| AppError::General("nothing to undo".to_string()))?;

    for record in &batch.records {
        if !record.to.exists() {
            return Err(AppError::General(format!(
                "cannot undo, file no longer exists: {}",
                record.to.display()
            )));
        }
    }

    for record in batch.records.iter().rev() {
        if let Some(parent) = record.from.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&record.to, &record.from)?;
        info!(from = %record.to.display(), to = %record.from.display(), "restored");
    }

    history.pop();

    let pruned_dirs = prune_created_dirs(base, &batch.records);
    info!(
        batch_id = %batch.batch_id,
        restored = batch.records.len(),
        pruned = pruned_dirs.len(),
        "undid move batch"
    );

    Ok(UndoReport {
        batch_id: batch.batch_id,
        restored: batch.records.len(),
        pruned_dirs,
    })
}

/// Every strict ancestor of a destination, up to but excluding the
/// organizing root. The batch cannot tell which of these it created, so all
/// of them are prune candidates under the empty-only rule.
fn candidate_dirs(base: &Path, records: &[MoveRecord]) -> Vec<PathBuf> {
    let mut candidates: HashSet<PathBuf> = HashSet::new();
    for record in records {
        let mut current = record.to.parent();
        while let Some(dir) = current {
            if dir == base || !dir.starts_with(base) {
                break;
            }
            candidates.insert(dir.to_path_buf());
            current = dir.parent();
        }
    }
    let mut candidates: Vec<PathBuf> = candidates.into_iter().collect();
    // Deepest first, so emptying a child can free its parent for pruning.
    candidates.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));
    candidates
}

fn dir_is_empty(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

fn prune_created_dirs(base: &Path, records: &[MoveRecord]) -> Vec<PathBuf> {
    let mut pruned = Vec::new();
    let mut candidates = candidate_dirs(base, records);
    // The root itself follows the same empty-only rule, visited last.
    candidates.push(base.to_path_buf());

    for dir in candidates {
        // Re-check emptiness at deletion time: pruning a sibling may have
        // just emptied this directory's parent.
        if !dir_is_empty(&dir) {
            continue;
        }
        match fs::remove_dir(&dir) {
            Ok(()) => {
                info!(dir = %dir.display(), "removed empty directory");
                pruned.push(dir);
            }
            Err(err) => {
                warn!(dir = %dir.display(), %err, "could not remove directory");
            }
        }
    }
    pruned
}
