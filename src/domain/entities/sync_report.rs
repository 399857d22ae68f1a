use crate::domain::value_objects::{EntityKind, OperationId, PendingAction};
use serde::{Deserialize, Serialize};

/// Progress of one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgress {
    pub processed: usize,
    pub total: usize,
}

impl SyncProgress {
    pub fn new(processed: usize, total: usize) -> Self {
        Self { processed, total }
    }

    pub fn complete(total: usize) -> Self {
        Self {
            processed: total,
            total,
        }
    }

    /// Fraction in `[0.0, 1.0]`; an empty run counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }

    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFailure {
    pub operation_id: OperationId,
    pub entity: EntityKind,
    pub action: PendingAction,
    pub attempts: u32,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: Vec<OperationFailure>,
    pub abandoned: Vec<OperationFailure>,
    pub remapped: usize,
    /// Another run was already in progress; nothing was attempted.
    pub skipped: bool,
}

impl SyncReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}
