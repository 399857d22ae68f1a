pub mod identity;
pub mod pending_operation;
pub mod record;
pub mod sync_report;

pub use identity::Identity;
pub use pending_operation::PendingOperation;
pub use record::{LocalRecord, RecordDraft, record_date_for};
pub use sync_report::{OperationFailure, SyncProgress, SyncReport};
