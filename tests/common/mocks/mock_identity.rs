use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use stoic_offline::application::ports::IdentityProvider;
use stoic_offline::domain::entities::Identity;
use stoic_offline::domain::value_objects::OwnerId;
use tokio::sync::RwLock;

pub const TEST_USER_ID: &str = "user-test";

#[derive(Clone, Default)]
pub struct MockIdentityProvider {
    identity: Arc<RwLock<Option<Identity>>>,
    lookups: Arc<AtomicUsize>,
}

impl MockIdentityProvider {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in() -> Self {
        let identity = Identity::new(OwnerId::new(TEST_USER_ID.to_string()).unwrap())
            .with_access_token("test-token");
        Self {
            identity: Arc::new(RwLock::new(Some(identity))),
            lookups: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn sign_out(&self) {
        *self.identity.write().await = None;
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn current_user(&self) -> Option<Identity> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.identity.read().await.clone()
    }
}
