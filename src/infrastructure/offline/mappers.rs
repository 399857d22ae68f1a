use crate::domain::entities::{LocalRecord, PendingOperation};
use crate::domain::value_objects::{
    EntityKind, OperationId, OwnerId, PendingAction, RecordId, RecordPayload,
};
use crate::infrastructure::offline::rows::{PendingOperationRow, RecordRow};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use std::convert::TryInto;

pub fn domain_record_from_row(kind: EntityKind, row: RecordRow) -> Result<LocalRecord, AppError> {
    let id = RecordId::new(row.local_id).map_err(AppError::ValidationError)?;
    let owner = OwnerId::new(row.owner_id).map_err(AppError::ValidationError)?;
    let fields = RecordPayload::from_json_str(&row.data).map_err(AppError::DeserializationError)?;

    Ok(LocalRecord {
        id,
        kind,
        owner,
        fields,
        record_date: row.record_date,
        synced: row.synced,
        remote_confirmed: row.remote_confirmed,
        server_id: row.server_id,
        created_at: timestamp_to_datetime(row.created_at),
        updated_at: timestamp_to_datetime(row.updated_at),
    })
}

pub fn domain_operation_from_row(row: PendingOperationRow) -> Result<PendingOperation, AppError> {
    let id = OperationId::new(row.operation_id).map_err(AppError::ValidationError)?;
    let entity = row
        .entity
        .parse::<EntityKind>()
        .map_err(AppError::ValidationError)?;
    let action = row
        .action
        .parse::<PendingAction>()
        .map_err(AppError::ValidationError)?;
    let record_id = RecordId::new(row.record_id).map_err(AppError::ValidationError)?;
    let payload =
        RecordPayload::from_json_str(&row.payload).map_err(AppError::DeserializationError)?;

    Ok(PendingOperation {
        id,
        entity,
        action,
        record_id,
        remote_id: row.remote_id,
        payload,
        enqueued_at: row.enqueued_at,
        sequence: row.sequence,
        attempts: try_i64_to_u32(row.attempts, "attempts")?,
        last_error: row.last_error,
    })
}

/// Extracts the record id every queued payload must carry.
pub fn record_id_from_payload(payload: &RecordPayload) -> Result<RecordId, AppError> {
    let id = payload.get_str("id").ok_or_else(|| {
        AppError::ValidationError("Pending operation payload must carry an `id`".to_string())
    })?;
    RecordId::new(id.to_string()).map_err(AppError::ValidationError)
}

pub fn try_i64_to_u32(value: i64, label: &str) -> Result<u32, AppError> {
    value
        .try_into()
        .map_err(|_| AppError::ValidationError(format!("{label} out of range: {value}")))
}

pub fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ts).unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operation_row_with_unknown_action_is_rejected() {
        let row = PendingOperationRow {
            sequence: 1,
            operation_id: "op-1".into(),
            entity: "virtues".into(),
            action: "upsert".into(),
            record_id: "r-1".into(),
            remote_id: None,
            payload: r#"{"id":"r-1"}"#.into(),
            enqueued_at: 10,
            attempts: 0,
            last_error: None,
        };
        assert!(matches!(
            domain_operation_from_row(row),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn payload_without_id_is_rejected() {
        let payload = RecordPayload::new(json!({"mood": 3})).unwrap();
        assert!(record_id_from_payload(&payload).is_err());

        let payload = RecordPayload::new(json!({"id": "abc"})).unwrap();
        assert_eq!(record_id_from_payload(&payload).unwrap().as_str(), "abc");
    }

    #[test]
    fn record_row_maps_metadata() {
        let row = RecordRow {
            local_id: "r-2".into(),
            owner_id: "anonymous".into(),
            record_date: "2025-01-02".into(),
            data: r#"{"date":"2025-01-02","wisdom":4}"#.into(),
            synced: true,
            remote_confirmed: false,
            server_id: None,
            created_at: 1_735_776_000_000,
            updated_at: 1_735_776_000_000,
        };
        let record = domain_record_from_row(EntityKind::Virtues, row).unwrap();
        assert!(record.owner.is_anonymous());
        assert!(record.synced);
        assert_eq!(record.created_at.timestamp_millis(), 1_735_776_000_000);
    }
}
