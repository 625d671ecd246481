//! Login, account creation and logout.
//!
//! [`AuthFlow`] owns the session's only [`SessionWriter`]; no other component
//! can set or clear the credential.

use std::sync::Arc;

use tracing::{info, warn};

use roamly_shared::AccountCreated;

use crate::api::{NewAccount, RemoteApi};
use crate::error::Result;
use crate::events::{ClientEvent, EventBus, Notification};
use crate::session::{self, SessionIdentity, SessionWriter};

pub struct AuthFlow {
    api: Arc<dyn RemoteApi>,
    writer: SessionWriter,
    session: SessionIdentity,
    events: EventBus,
}

impl AuthFlow {
    /// Start with an empty session.
    pub fn new(api: Arc<dyn RemoteApi>, events: EventBus) -> Self {
        let (writer, session) = session::channel();
        Self {
            api,
            writer,
            session,
            events,
        }
    }

    /// Read-only handle on the session this flow writes.
    pub fn session(&self) -> SessionIdentity {
        self.session.clone()
    }

    pub async fn login(&self, identifier: &str, password: &str) -> Result<()> {
        match self.api.login(identifier.trim(), password).await {
            Ok(token) => {
                self.writer.set(&token);
                self.announce_session();
                self.events
                    .notify(Notification::success("Logged in successfully!"));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.events.notify(Notification::failure(e.user_message()));
                Err(e.into())
            }
        }
    }

    /// Register a new account; the server signs the new user in directly.
    pub async fn create_account(&self, account: NewAccount) -> Result<AccountCreated> {
        match self.api.create_account(&account).await {
            Ok(created) => {
                info!(username = %created.username, "Account created");
                self.writer.set(&created.jwt_token);
                self.announce_session();
                self.events
                    .notify(Notification::success("Account created successfully!"));
                Ok(created)
            }
            Err(e) => {
                warn!(error = %e, "Account creation failed");
                self.events.notify(Notification::failure(e.user_message()));
                Err(e.into())
            }
        }
    }

    pub fn logout(&self) {
        self.writer.clear();
        self.announce_session();
    }

    fn announce_session(&self) {
        self.events.emit(ClientEvent::SessionChanged {
            authenticated: self.session.is_authenticated(),
            user_id: self.session.current_user_id().map(|id| id.to_string()),
        });
    }
}
