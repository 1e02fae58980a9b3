//! Authentication hook for resolving a connection to a player identity.
//!
//! Identity provision is external to this service — a platform account
//! system, a JWT validator, whatever the deployment uses. The gateway only
//! needs one async call: token in, [`PlayerId`] out.

use skirmish_protocol::PlayerId;

use crate::AuthError;

/// Validates a client's auth token and returns their identity.
///
/// `Send + Sync + 'static` so one authenticator can be shared across all
/// connection tasks for the lifetime of the server.
pub trait Authenticator: Send + Sync + 'static {
    /// Called once per connection, with the token from the opening `Hello`.
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<PlayerId, AuthError>> + Send;
}

/// Treats any non-empty token as the account identity itself.
///
/// Matches the platform model this service was built against, where the
/// connection layer has already verified the account and hands over its
/// opaque id. Also the authenticator of choice for tests and local runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenIdentity;

impl Authenticator for TokenIdentity {
    async fn authenticate(&self, token: &str) -> Result<PlayerId, AuthError> {
        if token.is_empty() {
            return Err(AuthError("empty token".into()));
        }
        Ok(PlayerId::new(token))
    }
}
