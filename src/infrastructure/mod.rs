pub mod database;
pub mod identity;
pub mod offline;
pub mod remote;

pub use database::ConnectionPool;
pub use identity::SessionIdentityProvider;
pub use offline::{LocalStore, SqliteIntentWriter, SqlitePendingLog, SqliteRecordStore};
pub use remote::PostgrestBackend;
