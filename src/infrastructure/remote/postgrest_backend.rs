use crate::application::ports::identity_provider::IdentityProvider;
use crate::application::ports::remote_backend::{RemoteBackend, RemoteError, RemoteRecord};
use crate::domain::value_objects::{EntityKind, RecordPayload};
use crate::shared::config::RemoteConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Remote backend speaking the PostgREST dialect served by Supabase.
pub struct PostgrestBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    identity: Arc<dyn IdentityProvider>,
}

impl PostgrestBackend {
    pub fn new(config: &RemoteConfig, identity: Arc<dyn IdentityProvider>) -> Result<Self, AppError> {
        let base_url = config
            .base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| AppError::ConfigurationError("remote base_url is not set".into()))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::ConfigurationError("remote api_key is not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|err| AppError::ConfigurationError(err.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key,
            identity,
        })
    }

    pub fn table_url(&self, entity: EntityKind) -> String {
        format!("{}/rest/v1/{}", self.base_url, entity.remote_table())
    }

    async fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, RemoteError> {
        let token = self
            .identity
            .current_user()
            .await
            .and_then(|identity| identity.access_token)
            .ok_or(RemoteError::Unauthenticated)?;

        Ok(builder
            .header("apikey", &self.api_key)
            .bearer_auth(token))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, RemoteError> {
        let response = self
            .authorized(builder)
            .await?
            .send()
            .await
            .map_err(|err| RemoteError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(rejection(status.as_u16(), body))
    }

    async fn send_expecting_row(&self, builder: RequestBuilder) -> Result<RemoteRecord, RemoteError> {
        let response = self
            .send(builder.header("Prefer", "return=representation"))
            .await?;
        let value: Value = response
            .json()
            .await
            .map_err(|err| RemoteError::InvalidResponse(err.to_string()))?;
        single_row(value)
    }
}

/// Maps a non-2xx response onto a remote error. An expired or invalid JWT
/// comes back as 401.
pub fn rejection(status: u16, body: String) -> RemoteError {
    if status == 401 {
        debug!(body = %body, "Remote rejected the session token");
        return RemoteError::Unauthenticated;
    }
    RemoteError::Rejected { status, body }
}

/// PostgREST filter selecting one row by primary key.
pub fn id_filter(id: &str) -> (&'static str, String) {
    ("id", format!("eq.{id}"))
}

/// Unwraps the single row a representation response carries.
pub fn single_row(value: Value) -> Result<RemoteRecord, RemoteError> {
    let row = match value {
        Value::Array(mut rows) => {
            if rows.len() != 1 {
                return Err(RemoteError::InvalidResponse(format!(
                    "expected exactly one row, got {}",
                    rows.len()
                )));
            }
            rows.remove(0)
        }
        other => other,
    };
    RecordPayload::new(row).map_err(RemoteError::InvalidResponse)
}

#[async_trait]
impl RemoteBackend for PostgrestBackend {
    async fn insert(
        &self,
        entity: EntityKind,
        payload: &RecordPayload,
    ) -> Result<RemoteRecord, RemoteError> {
        debug!(entity = %entity, "POST remote row");
        let builder = self.client.post(self.table_url(entity)).json(payload.as_map());
        self.send_expecting_row(builder).await
    }

    async fn update(
        &self,
        entity: EntityKind,
        id: &str,
        payload: &RecordPayload,
    ) -> Result<RemoteRecord, RemoteError> {
        debug!(entity = %entity, id, "PATCH remote row");
        let builder = self
            .client
            .patch(self.table_url(entity))
            .query(&[id_filter(id)])
            .json(payload.as_map());
        self.send_expecting_row(builder).await
    }

    async fn delete(&self, entity: EntityKind, id: &str) -> Result<(), RemoteError> {
        debug!(entity = %entity, id, "DELETE remote row");
        let builder = self
            .client
            .delete(self.table_url(entity))
            .query(&[id_filter(id)])
            .header("Prefer", "return=minimal");
        self.send(builder).await.map(|_| ())
    }
}
