pub mod identity_provider;
pub mod intent_writer;
pub mod pending_log;
pub mod record_store;
pub mod remote_backend;

pub use identity_provider::IdentityProvider;
pub use intent_writer::IntentWriter;
pub use pending_log::PendingOperationLog;
pub use record_store::RecordStore;
pub use remote_backend::{RemoteBackend, RemoteError, RemoteRecord};
