use crate::domain::value_objects::{EntityKind, RecordPayload};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("no authenticated identity")]
    Unauthenticated,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

/// Row returned by the backend after an insert or update.
pub type RemoteRecord = RecordPayload;

#[async_trait]
pub trait RemoteBackend: Send + Sync {
    async fn insert(
        &self,
        entity: EntityKind,
        payload: &RecordPayload,
    ) -> Result<RemoteRecord, RemoteError>;
    async fn update(
        &self,
        entity: EntityKind,
        id: &str,
        payload: &RecordPayload,
    ) -> Result<RemoteRecord, RemoteError>;
    async fn delete(&self, entity: EntityKind, id: &str) -> Result<(), RemoteError>;
}
