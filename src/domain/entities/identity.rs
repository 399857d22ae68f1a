use crate::domain::value_objects::OwnerId;
use serde::{Deserialize, Serialize};

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub user_id: OwnerId,
    pub access_token: Option<String>,
}

impl Identity {
    pub fn new(user_id: OwnerId) -> Self {
        Self {
            user_id,
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}
