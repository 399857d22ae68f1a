pub mod local_store;
mod mappers;
mod rows;
pub mod sqlite_intent_writer;
pub mod sqlite_pending_log;
pub mod sqlite_record_store;

pub use local_store::LocalStore;
pub use sqlite_intent_writer::SqliteIntentWriter;
pub use sqlite_pending_log::SqlitePendingLog;
pub use sqlite_record_store::SqliteRecordStore;
