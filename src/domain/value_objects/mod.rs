pub mod entity_kind;
pub mod operation_id;
pub mod owner_id;
pub mod payload;
pub mod pending_action;
pub mod record_id;

pub use entity_kind::EntityKind;
pub use operation_id::OperationId;
pub use owner_id::{ANONYMOUS_OWNER, OwnerId};
pub use payload::RecordPayload;
pub use pending_action::PendingAction;
pub use record_id::RecordId;
