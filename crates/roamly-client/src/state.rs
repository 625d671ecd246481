//! Composition root shared by every view.
//!
//! [`ClientState`] wires one API handle, one session, one search coordinator
//! and one event bus together. Views hold it behind an `Arc` and create an
//! [`EditableMediaSet`] per adventure page.

use std::sync::Arc;

use roamly_shared::{AdventureId, AdventureSummary};

use crate::adventure::{self, AdventureDraft};
use crate::api::{HttpApi, RemoteApi};
use crate::auth::AuthFlow;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::events::EventBus;
use crate::media::{EditableMediaSet, MediaGallery};
use crate::search::{SearchCoordinator, SearchSettings};
use crate::session::SessionIdentity;

pub struct ClientState {
    config: ClientConfig,
    api: Arc<dyn RemoteApi>,
    auth: AuthFlow,
    search: SearchCoordinator,
    events: EventBus,
}

impl ClientState {
    /// Build the state against the HTTP API named in `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api = HttpApi::new(&config.api_base, config.connect_timeout)?;
        tracing::info!(api_base = %api.base_url(), "Client state initialised");
        Ok(Self::with_api(config, Arc::new(api)))
    }

    pub fn with_api(config: ClientConfig, api: Arc<dyn RemoteApi>) -> Self {
        let events = EventBus::new();
        let auth = AuthFlow::new(api.clone(), events.clone());
        let search = SearchCoordinator::new(api.clone(), SearchSettings::from(&config));
        Self {
            config,
            api,
            auth,
            search,
            events,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn auth(&self) -> &AuthFlow {
        &self.auth
    }

    pub fn session(&self) -> SessionIdentity {
        self.auth.session()
    }

    pub fn search(&self) -> &SearchCoordinator {
        &self.search
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Editable image set for one adventure, with an empty cache.
    pub fn media_set(&self, adventure_id: AdventureId) -> EditableMediaSet {
        EditableMediaSet::new(MediaGallery::new(
            adventure_id,
            self.api.clone(),
            self.session(),
            self.events.clone(),
        ))
    }

    pub async fn create_adventure(&self, draft: &AdventureDraft) -> Result<AdventureSummary> {
        adventure::create_adventure(self.api.as_ref(), &self.session(), &self.events, draft).await
    }

    pub async fn delete_adventure(&self, adventure_id: &AdventureId) -> Result<()> {
        adventure::delete_adventure(self.api.as_ref(), &self.session(), &self.events, adventure_id)
            .await
    }
}
