pub mod autosave_service;
pub mod offline_service;
pub mod sync_service;

pub use autosave_service::{AutosaveListener, AutosaveScheduler, NoopListener, SaveStatus, SnapshotSink};
pub use offline_service::{EntityCount, OfflineService, OfflineStatus};
pub use sync_service::SyncService;
