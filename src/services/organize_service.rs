use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::error::AppError;
use crate::models::history::{MoveBatch, MoveHistory, MoveRecord};
use crate::models::plan::Plan;
use crate::scope_path;

/// What happened to one plan item during `apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// The same source was already moved earlier in this invocation.
    SkippedDuplicate,
    /// The source no longer exists on disk; stale plan entry.
    SkippedMissing,
    /// The source or destination resolves outside the organizing root.
    SkippedUnsafe,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ItemOutcome {
    pub category: String,
    pub original_path: String,
    pub destination: Option<PathBuf>,
    pub outcome: MoveOutcome,
}

#[derive(Debug, Default)]
pub struct ApplyReport {
    pub batch_id: Option<String>,
    pub outcomes: Vec<ItemOutcome>,
}

impl ApplyReport {
    pub fn moved_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|item| item.outcome == MoveOutcome::Moved)
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|item| {
                matches!(
                    item.outcome,
                    MoveOutcome::SkippedDuplicate
                        | MoveOutcome::SkippedMissing
                        | MoveOutcome::SkippedUnsafe
                )
            })
            .count()
    }

    /// False only when the batch hit an unrecoverable I/O fault; skips do
    /// not count as failure.
    pub fn success(&self) -> bool {
        !self
            .outcomes
            .iter()
            .any(|item| matches!(item.outcome, MoveOutcome::Failed(_)))
    }
}

/// Repair a destination that designates only a folder: when the final
/// segment has no extension, the original item's filename is appended.
pub fn normalize_destination(new_path: &str, original_path: &str) -> String {
    let destination = Path::new(new_path);
    if destination.extension().is_some() {
        return new_path.to_string();
    }
    match Path::new(original_path).file_name() {
        Some(file_name) => destination.join(file_name).to_string_lossy().to_string(),
        None => new_path.to_string(),
    }
}

/// Apply a validated plan under `base`: categories in plan order, items in
/// list order, one physical rename per item. Duplicate sources, missing
/// sources, and out-of-scope paths are skipped without aborting the batch;
/// an I/O fault stops it. Every successful move is recorded, and a
/// non-empty record set is pushed onto `history` as one batch. This
/// includes the partial batch accumulated before a fault, so those moves
/// stay undoable.
pub fn apply(base: &Path, plan: &Plan, history: &mut MoveHistory) -> Result<ApplyReport, AppError> {
    let mut report = ApplyReport::default();
    let mut moved_sources: HashSet<PathBuf> = HashSet::new();
    let mut records: Vec<MoveRecord> = Vec::new();

    'categories: for category in &plan.categories {
        for item in &category.items {
            let mut outcome = ItemOutcome {
                category: category.name.clone(),
                original_path: item.original_path.clone(),
                destination: None,
                outcome: MoveOutcome::Moved,
            };

            let Some(source) = scope_path::resolve_in_scope(base, &item.original_path) else {
                warn!(path = %item.original_path, "source escapes the organizing root, skipping");
                outcome.outcome = MoveOutcome::SkippedUnsafe;
                report.outcomes.push(outcome);
                continue;
            };
            let normalized = normalize_destination(&item.new_path, &item.original_path);
            let Some(destination) = scope_path::resolve_in_scope(base, &normalized) else {
                warn!(path = %item.new_path, "destination escapes the organizing root, skipping");
                outcome.outcome = MoveOutcome::SkippedUnsafe;
                report.outcomes.push(outcome);
                continue;
            };
            outcome.destination = Some(destination.clone());

            if moved_sources.contains(&source) {
                warn!(path = %source.display(), "source already moved in this batch, skipping");
                outcome.outcome = MoveOutcome::SkippedDuplicate;
                report.outcomes.push(outcome);
                continue;
            }

            if !source.exists() {
                warn!(path = %source.display(), "source not found, skipping");
                outcome.outcome = MoveOutcome::SkippedMissing;
                report.outcomes.push(outcome);
                continue;
            }

            if let Some(parent) = destination.parent() {
                if let Err(err) = fs::create_dir_all(parent) {
                    error!(dir = %parent.display(), %err, "could not create destination directory");
                    outcome.outcome = MoveOutcome::Failed(err.to_string());
                    report.outcomes.push(outcome);
                    break 'categories;
                }
            }

            match fs::rename(&source, &destination) {
                Ok(()) => {
                    info!(from = %source.display(), to = %destination.display(), "moved");
                    moved_sources.insert(source.clone());
                    records.push(MoveRecord {
                        from: source,
                        to: destination,
                    });
                    report.outcomes.push(outcome);
                }
                Err(err) => {
                    error!(from = %source.display(), to = %destination.display(), %err, "move failed");
                    outcome.outcome = MoveOutcome::Failed(err.to_string());
                    report.outcomes.push(outcome);
                    break 'categories;
                }
            }
        }
    }

    if !records.is_empty() {
        let batch = MoveBatch::new(records);
        report.batch_id = Some(batch.batch_id.clone());
        info!(
            batch_id = %batch.batch_id,
            moves = batch.records.len(),
            "recorded move batch"
        );
        history.push(batch);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plan::{MoveItem, PlanCategory};
    use std::fs::File;
    use std::io::Write;

    fn write_file(path: &Path, content: &str) {
        File::create(path)
            .unwrap()
            .write_all(content.as_bytes())
            .unwrap();
    }

    fn plan_of(entries: &[(&str, &str, &str)]) -> Plan {
        let mut categories: Vec<PlanCategory> = Vec::new();
        for (category, original, new) in entries {
            let item = MoveItem {
                original_path: original.to_string(),
                new_path: new.to_string(),
            };
            match categories.iter_mut().find(|c| c.name == *category) {
                Some(c) => c.items.push(item),
                None => categories.push(PlanCategory {
                    name: category.to_string(),
                    items: vec![item],
                }),
            }
        }
        Plan { categories }
    }

    #[test]
    fn normalize_destination_appends_original_filename() {
        assert_eq!(
            normalize_destination("documents", "report.pdf"),
            "documents/report.pdf"
        );
        assert_eq!(
            normalize_destination("archives/old", "backup.zip"),
            "archives/old/backup.zip"
        );
    }

    #[test]
    fn normalize_destination_keeps_full_paths() {
        assert_eq!(
            normalize_destination("documents/report.pdf", "report.pdf"),
            "documents/report.pdf"
        );
    }

    #[test]
    fn apply_moves_files_and_records_one_batch() {
        let base = tempfile::tempdir().unwrap();
        write_file(&base.path().join("a.txt"), "alpha");
        write_file(&base.path().join("b.jpg"), "beta");

        let plan = plan_of(&[
            ("documents", "a.txt", "documents/a.txt"),
            ("images", "b.jpg", "images/b.jpg"),
        ]);
        let mut history = MoveHistory::new();
        let report = apply(base.path(), &plan, &mut history).unwrap();

        assert!(report.success());
        assert_eq!(report.moved_count(), 2);
        assert!(base.path().join("documents/a.txt").is_file());
        assert!(base.path().join("images/b.jpg").is_file());
        assert!(!base.path().join("a.txt").exists());
        assert!(!base.path().join("b.jpg").exists());
        assert_eq!(history.len(), 1);
        assert_eq!(history.peek().unwrap().records.len(), 2);
    }

    #[test]
    fn apply_repairs_folder_only_destinations() {
        let base = tempfile::tempdir().unwrap();
        write_file(&base.path().join("report.pdf"), "pdf");

        let plan = plan_of(&[("documents", "report.pdf", "documents")]);
        let mut history = MoveHistory::new();
        let report = apply(base.path(), &plan, &mut history).unwrap();

        assert!(report.success());
        assert!(base.path().join("documents/report.pdf").is_file());
    }

    #[test]
    fn apply_skips_missing_sources_without_side_effects() {
        let base = tempfile::tempdir().unwrap();
        write_file(&base.path().join("real.txt"), "real");

        let plan = plan_of(&[
            ("documents", "missing.txt", "documents/missing.txt"),
            ("documents", "real.txt", "documents/real.txt"),
        ]);
        let mut history = MoveHistory::new();
        let report = apply(base.path(), &plan, &mut history).unwrap();

        assert!(report.success());
        assert_eq!(report.moved_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.outcomes[0].outcome, MoveOutcome::SkippedMissing);
        assert!(base.path().join("documents/real.txt").is_file());
        assert_eq!(history.peek().unwrap().records.len(), 1);
    }

    #[test]
    fn apply_skips_duplicate_sources_across_categories() {
        let base = tempfile::tempdir().unwrap();
        write_file(&base.path().join("a.txt"), "alpha");

        let plan = plan_of(&[
            ("documents", "a.txt", "documents/a.txt"),
            ("text_files", "a.txt", "text_files/a.txt"),
        ]);
        let mut history = MoveHistory::new();
        let report = apply(base.path(), &plan, &mut history).unwrap();

        assert!(report.success());
        assert_eq!(report.moved_count(), 1);
        assert_eq!(report.outcomes[1].outcome, MoveOutcome::SkippedDuplicate);
        assert!(base.path().join("documents/a.txt").is_file());
        assert!(!base.path().join("text_files").exists());
    }

    #[test]
    fn apply_rejects_paths_escaping_the_root() {
        let base = tempfile::tempdir().unwrap();
        write_file(&base.path().join("a.txt"), "alpha");

        let plan = plan_of(&[
            ("evil", "a.txt", "../stolen/a.txt"),
            ("evil", "../a.txt", "documents/a.txt"),
        ]);
        let mut history = MoveHistory::new();
        let report = apply(base.path(), &plan, &mut history).unwrap();

        assert!(report.success());
        assert_eq!(report.moved_count(), 0);
        assert_eq!(report.outcomes[0].outcome, MoveOutcome::SkippedUnsafe);
        assert_eq!(report.outcomes[1].outcome, MoveOutcome::SkippedUnsafe);
        assert!(base.path().join("a.txt").is_file());
        assert!(history.is_empty());
    }

    #[test]
    fn apply_without_successful_moves_records_no_batch() {
        let base = tempfile::tempdir().unwrap();
        let plan = plan_of(&[("documents", "ghost.txt", "documents/ghost.txt")]);
        let mut history = MoveHistory::new();
        let report = apply(base.path(), &plan, &mut history).unwrap();

        assert!(report.success());
        assert_eq!(report.moved_count(), 0);
        assert!(report.batch_id.is_none());
        assert!(history.is_empty());
    }

    #[test]
    fn apply_fault_keeps_partial_batch_undoable() {
        let base = tempfile::tempdir().unwrap();
        write_file(&base.path().join("a.txt"), "alpha");
        write_file(&base.path().join("b.txt"), "beta");
        // A file squatting on the destination directory name makes
        // create_dir_all fail for the second item.
        write_file(&base.path().join("blocked"), "in the way");

        let plan = plan_of(&[
            ("documents", "a.txt", "documents/a.txt"),
            ("blocked", "b.txt", "blocked/b.txt"),
        ]);
        let mut history = MoveHistory::new();
        let report = apply(base.path(), &plan, &mut history).unwrap();

        assert!(!report.success());
        assert_eq!(report.moved_count(), 1);
        assert!(matches!(report.outcomes[1].outcome, MoveOutcome::Failed(_)));
        // The move that did succeed is recorded so it can be undone.
        assert_eq!(history.len(), 1);
        assert_eq!(history.peek().unwrap().records.len(), 1);
        assert!(base.path().join("b.txt").is_file());
    }
}
