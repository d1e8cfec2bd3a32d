use std::path::PathBuf;

/// One completed physical move, recorded only after the rename succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// All moves performed by one `apply` invocation; the unit of undo.
#[derive(Debug, Clone)]
pub struct MoveBatch {
    pub batch_id: String,
    pub executed_at: String,
    pub records: Vec<MoveRecord>,
}

impl MoveBatch {
    pub fn new(records: Vec<MoveRecord>) -> Self {
        Self {
            batch_id: uuid::Uuid::new_v4().to_string(),
            executed_at: chrono::Utc::now().to_rfc3339(),
            records,
        }
    }
}

/// LIFO stack of batches for one organizing root. One instance per session;
/// callers hand it to `apply` and `undo` by mutable reference. Not persisted.
#[derive(Debug, Default)]
pub struct MoveHistory {
    batches: Vec<MoveBatch>,
}

impl MoveHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, batch: MoveBatch) {
        self.batches.push(batch);
    }

    pub fn peek(&self) -> Option<&MoveBatch> {
        self.batches.last()
    }

    pub fn pop(&mut self) -> Option<MoveBatch> {
        self.batches.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }
}
