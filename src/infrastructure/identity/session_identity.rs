use crate::application::ports::identity_provider::IdentityProvider;
use crate::domain::entities::Identity;
use crate::domain::value_objects::OwnerId;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

/// Holds the signed-in user for the lifetime of the process.
#[derive(Default)]
pub struct SessionIdentityProvider {
    current: RwLock<Option<Identity>>,
}

impl SessionIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self {
            current: RwLock::new(Some(identity)),
        }
    }

    /// Builds a session from `STOIC_USER_ID` / `STOIC_ACCESS_TOKEN`.
    pub fn from_env() -> Self {
        let user = std::env::var("STOIC_USER_ID")
            .ok()
            .and_then(|value| OwnerId::new(value.trim().to_string()).ok());
        let token = std::env::var("STOIC_ACCESS_TOKEN")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        match user {
            Some(user_id) => Self::signed_in(Identity {
                user_id,
                access_token: token,
            }),
            None => Self::new(),
        }
    }

    pub async fn sign_in(&self, identity: Identity) {
        info!(user = %identity.user_id, "Signed in");
        *self.current.write().await = Some(identity);
    }

    pub async fn sign_out(&self) {
        if self.current.write().await.take().is_some() {
            info!("Signed out");
        }
    }
}

#[async_trait]
impl IdentityProvider for SessionIdentityProvider {
    async fn current_user(&self) -> Option<Identity> {
        self.current.read().await.clone()
    }
}
