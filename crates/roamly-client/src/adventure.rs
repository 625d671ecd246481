use tracing::{info, warn};

use roamly_shared::{AdventureId, AdventureSummary};

use crate::api::{NewAdventure, RemoteApi};
use crate::error::{ClientError, Result};
use crate::events::{EventBus, Notification};
use crate::media::DraftSlots;
use crate::session::SessionIdentity;

/// Contents of the create-adventure form.
#[derive(Debug, Clone, Default)]
pub struct AdventureDraft {
    pub title: String,
    pub description: String,
    pub media: DraftSlots,
}

impl AdventureDraft {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Post a new adventure with every filled draft row in a single request.
pub async fn create_adventure(
    api: &dyn RemoteApi,
    session: &SessionIdentity,
    events: &EventBus,
    draft: &AdventureDraft,
) -> Result<AdventureSummary> {
    let Some(token) = session.current_token() else {
        return Err(ClientError::NotAuthenticated);
    };

    let adventure = NewAdventure {
        title: draft.title.trim().to_string(),
        description: draft.description.clone(),
        images: draft.media.to_submission_batch(),
    };

    match api.create_adventure(&token, &adventure).await {
        Ok(summary) => {
            info!(
                adventure_id = %summary.adventure_id,
                images = adventure.images.len(),
                "Adventure posted"
            );
            events.notify(Notification::success("Adventure posted!"));
            Ok(summary)
        }
        Err(e) => {
            warn!(error = %e, "Adventure submission failed");
            events.notify(Notification::failure(e.user_message()));
            Err(e.into())
        }
    }
}

/// Delete an adventure together with its images.
///
/// The server only lets the owner do this; a refusal is surfaced unchanged.
pub async fn delete_adventure(
    api: &dyn RemoteApi,
    session: &SessionIdentity,
    events: &EventBus,
    adventure_id: &AdventureId,
) -> Result<()> {
    let Some(token) = session.current_token() else {
        return Err(ClientError::NotAuthenticated);
    };

    match api.delete_adventure(&token, adventure_id).await {
        Ok(()) => {
            info!(adventure_id = %adventure_id, "Adventure deleted");
            events.notify(Notification::success("Adventure deleted"));
            Ok(())
        }
        Err(e) => {
            warn!(adventure_id = %adventure_id, error = %e, "Adventure deletion failed");
            events.notify(Notification::failure(e.user_message()));
            Err(e.into())
        }
    }
}
