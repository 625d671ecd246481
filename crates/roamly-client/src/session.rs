//! Session-derived identity.
//!
//! The bearer credential is process-wide state with exactly one writer. The
//! [`SessionWriter`] is held by the login/logout flow; everything else gets a
//! cloneable, read-only [`SessionIdentity`]. The decoded claim is computed
//! when the token is written and stored next to it, so it can never drift
//! from the token it came from.

use tokio::sync::watch;
use tracing::{debug, info};

use roamly_shared::constants::LOGIN_PATH;
use roamly_shared::{decode_identity, SessionClaim, UserId};

#[derive(Clone, PartialEq, Eq)]
struct Credential {
    token: String,
    claim: Option<SessionClaim>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("claim", &self.claim)
            .finish()
    }
}

/// Outcome of a route guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteGuard {
    Allow,
    /// Send the visitor to the login page, remembering where they came from.
    RedirectToLogin { to: String, from: String },
}

/// Create an empty session. A fresh client never inherits a credential.
pub fn channel() -> (SessionWriter, SessionIdentity) {
    let (tx, rx) = watch::channel(None);
    (SessionWriter { tx }, SessionIdentity { rx })
}

/// The only handle able to change the credential.
#[derive(Debug)]
pub struct SessionWriter {
    tx: watch::Sender<Option<Credential>>,
}

impl SessionWriter {
    /// Store a freshly issued credential. A blank token clears the session.
    pub fn set(&self, token: &str) {
        let token = token.trim();
        if token.is_empty() {
            self.clear();
            return;
        }

        let claim = decode_identity(token);
        match &claim {
            Some(claim) => info!(
                user_id = %claim.subject,
                expires_at = ?claim.expires_at,
                "Session started"
            ),
            None => info!("Session started with an undecodable credential"),
        }

        self.tx.send_replace(Some(Credential {
            token: token.to_string(),
            claim,
        }));
    }

    pub fn clear(&self) {
        if self.tx.send_replace(None).is_some() {
            info!("Session cleared");
        }
    }

    pub fn reader(&self) -> SessionIdentity {
        SessionIdentity {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read-only view of the current session.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    rx: watch::Receiver<Option<Credential>>,
}

impl SessionIdentity {
    pub fn current_token(&self) -> Option<String> {
        self.rx.borrow().as_ref().map(|c| c.token.clone())
    }

    /// True iff a credential is present. Expiry is left to the server.
    pub fn is_authenticated(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Decoded claim of the current credential, `None` if absent or malformed.
    pub fn identity(&self) -> Option<SessionClaim> {
        self.rx.borrow().as_ref().and_then(|c| c.claim.clone())
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.identity().map(|claim| claim.subject)
    }

    /// Whether the signed-in actor owns a resource.
    ///
    /// Fails closed: no credential or an undecodable one is never an owner.
    pub fn is_owner(&self, resource_owner_id: impl AsRef<str>) -> bool {
        let owner = UserId::new(resource_owner_id);
        if owner.as_str().is_empty() {
            return false;
        }
        let is_owner = self
            .current_user_id()
            .is_some_and(|subject| subject == owner);
        debug!(owner = %owner, is_owner, "Ownership check");
        is_owner
    }

    /// Guard for routes that need a signed-in actor.
    pub fn require_auth(&self, from: &str) -> RouteGuard {
        if self.is_authenticated() {
            RouteGuard::Allow
        } else {
            RouteGuard::RedirectToLogin {
                to: LOGIN_PATH.to_string(),
                from: from.to_string(),
            }
        }
    }

    /// Profile route of the signed-in actor.
    pub fn own_profile_path(&self) -> Option<String> {
        self.current_user_id()
            .map(|id| format!("/user/{id}/profile"))
    }

    /// Wait until the credential is written or cleared.
    ///
    /// Returns `false` once the writer is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

#[cfg(test)]
pub(crate) fn token_for(user_id: &str) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"user_id":"{user_id}","exp":1900000000}}"#));
    format!("{header}.{claims}.signature")
}
