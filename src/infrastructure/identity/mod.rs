pub mod session_identity;

pub use session_identity::SessionIdentityProvider;
