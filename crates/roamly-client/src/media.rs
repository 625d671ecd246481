//! Editable image + caption collection of one adventure.
//!
//! Two phases share the type:
//!
//! - **Drafts** ([`DraftSlots`]): rows the user fills in before submitting.
//!   Rows are addressed by a stable slot index and never get an image id.
//! - **Gallery** ([`MediaGallery`]): the last snapshot the server returned.
//!   Every mutation adopts the server's answer wholesale; nothing is patched
//!   or reordered locally, and a failed call leaves the cache untouched.

use std::sync::Arc;

use tracing::{debug, info, warn};

use roamly_shared::{AdventureId, ImageId, MediaPayload, PersistedImage, UploadItem, UploadOutcome};

use crate::api::RemoteApi;
use crate::error::{ClientError, Result};
use crate::events::{ClientEvent, EventBus};
use crate::session::SessionIdentity;

/// One draft row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftSlot {
    pub payload: Option<MediaPayload>,
    pub caption: String,
}

/// Rows of not-yet-submitted images.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftSlots {
    slots: Vec<DraftSlot>,
}

impl DraftSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an empty row and return its index.
    pub fn add_slot(&mut self) -> usize {
        self.slots.push(DraftSlot::default());
        self.slots.len() - 1
    }

    pub fn set_payload(&mut self, index: usize, payload: MediaPayload) -> Result<()> {
        self.slot_mut(index)?.payload = Some(payload);
        Ok(())
    }

    pub fn set_caption(&mut self, index: usize, caption: impl Into<String>) -> Result<()> {
        self.slot_mut(index)?.caption = caption.into();
        Ok(())
    }

    /// Empty a row after its image was uploaded. The row itself stays so
    /// later indices do not shift.
    pub fn reset_slot(&mut self, index: usize) -> Result<()> {
        *self.slot_mut(index)? = DraftSlot::default();
        Ok(())
    }

    pub fn slot(&self, index: usize) -> Option<&DraftSlot> {
        self.slots.get(index)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Rows that carry a payload, in row order. Caption-only rows are dropped.
    pub fn to_submission_batch(&self) -> Vec<UploadItem> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot_index, slot)| {
                slot.payload.as_ref().map(|payload| UploadItem {
                    slot_index,
                    payload: payload.clone(),
                    caption: slot.caption.clone(),
                })
            })
            .collect()
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut DraftSlot> {
        let len = self.slots.len();
        self.slots
            .get_mut(index)
            .ok_or(ClientError::SlotOutOfRange { index, len })
    }
}

/// An upload that did not go through.
#[derive(Debug)]
pub struct BatchFailure {
    pub slot_index: usize,
    pub error: ClientError,
}

/// Per-item outcome of [`MediaGallery::append_many`].
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Slot indices whose upload succeeded, in submission order.
    pub uploaded: Vec<usize>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Client-side cache of an adventure's persisted images.
pub struct MediaGallery {
    adventure_id: AdventureId,
    api: Arc<dyn RemoteApi>,
    session: SessionIdentity,
    events: EventBus,
    images: Vec<PersistedImage>,
}

impl MediaGallery {
    pub fn new(
        adventure_id: AdventureId,
        api: Arc<dyn RemoteApi>,
        session: SessionIdentity,
        events: EventBus,
    ) -> Self {
        Self {
            adventure_id,
            api,
            session,
            events,
            images: Vec::new(),
        }
    }

    pub fn adventure_id(&self) -> &AdventureId {
        &self.adventure_id
    }

    /// Last snapshot adopted from the server.
    pub fn images(&self) -> &[PersistedImage] {
        &self.images
    }

    pub fn get(&self, image_id: &ImageId) -> Option<&PersistedImage> {
        self.images.iter().find(|img| &img.image_id == image_id)
    }

    /// Fetch the current gallery and adopt it.
    pub async fn load(&mut self) -> Result<()> {
        let snapshot = self.api.list_media(&self.adventure_id).await?;
        self.adopt_snapshot(snapshot);
        Ok(())
    }

    /// Delete an image. The cache changes only once the server confirms.
    pub async fn remove(&mut self, image_id: &ImageId) -> Result<()> {
        let token = self.bearer()?;
        match self.api.delete_media(&token, image_id).await {
            Ok(snapshot) => {
                info!(image_id = %image_id, "Image deleted");
                self.adopt_snapshot(snapshot);
                Ok(())
            }
            Err(e) => {
                warn!(image_id = %image_id, error = %e, "Image delete failed");
                Err(e.into())
            }
        }
    }

    /// Change an image's caption. On failure the previous caption stays.
    pub async fn relabel(&mut self, image_id: &ImageId, caption: &str) -> Result<()> {
        let token = self.bearer()?;
        match self.api.relabel_media(&token, image_id, caption).await {
            Ok(snapshot) => {
                info!(image_id = %image_id, "Image caption changed");
                self.adopt_snapshot(snapshot);
                Ok(())
            }
            Err(e) => {
                warn!(image_id = %image_id, error = %e, "Caption change failed");
                Err(e.into())
            }
        }
    }

    /// Upload a batch, one item at a time, in order.
    ///
    /// Each success is reflected in the cache before the next upload starts.
    /// A failed item neither rolls back earlier ones nor stops later ones.
    /// Only a missing session fails the whole call, before any upload.
    pub async fn append_many(&mut self, batch: Vec<UploadItem>) -> Result<BatchReport> {
        let token = self.bearer()?;
        let mut report = BatchReport::default();

        for item in batch {
            match self
                .api
                .upload_media(&token, &self.adventure_id, &item)
                .await
            {
                Ok(UploadOutcome::Snapshot(snapshot)) => {
                    self.adopt_snapshot(snapshot);
                    report.uploaded.push(item.slot_index);
                }
                Ok(UploadOutcome::Created(created)) => {
                    debug!(image_id = %created.image_id, "Image created");
                    self.images.push(created);
                    self.announce();
                    report.uploaded.push(item.slot_index);
                }
                Err(e) => {
                    warn!(
                        slot = item.slot_index,
                        file_name = %item.payload.file_name,
                        error = %e,
                        "Image upload failed"
                    );
                    report.failed.push(BatchFailure {
                        slot_index: item.slot_index,
                        error: e.into(),
                    });
                }
            }
        }

        info!(
            adventure_id = %self.adventure_id,
            uploaded = report.uploaded.len(),
            failed = report.failed.len(),
            "Image batch finished"
        );
        Ok(report)
    }

    fn bearer(&self) -> Result<String> {
        self.session
            .current_token()
            .ok_or(ClientError::NotAuthenticated)
    }

    fn adopt_snapshot(&mut self, snapshot: Vec<PersistedImage>) {
        self.images = snapshot;
        self.announce();
    }

    fn announce(&self) {
        self.events.emit(ClientEvent::GalleryReplaced {
            adventure_id: self.adventure_id.to_string(),
            count: self.images.len(),
        });
    }
}

/// Drafts plus gallery for one adventure's edit page.
pub struct EditableMediaSet {
    drafts: DraftSlots,
    gallery: MediaGallery,
}

impl EditableMediaSet {
    pub fn new(gallery: MediaGallery) -> Self {
        Self {
            drafts: DraftSlots::new(),
            gallery,
        }
    }

    pub fn drafts(&self) -> &DraftSlots {
        &self.drafts
    }

    pub fn gallery(&self) -> &MediaGallery {
        &self.gallery
    }

    pub fn add_slot(&mut self) -> usize {
        self.drafts.add_slot()
    }

    pub fn set_payload(&mut self, index: usize, payload: MediaPayload) -> Result<()> {
        self.drafts.set_payload(index, payload)
    }

    pub fn set_caption(&mut self, index: usize, caption: impl Into<String>) -> Result<()> {
        self.drafts.set_caption(index, caption)
    }

    pub fn to_submission_batch(&self) -> Vec<UploadItem> {
        self.drafts.to_submission_batch()
    }

    pub async fn load(&mut self) -> Result<()> {
        self.gallery.load().await
    }

    pub async fn remove(&mut self, image_id: &ImageId) -> Result<()> {
        self.gallery.remove(image_id).await
    }

    pub async fn relabel(&mut self, image_id: &ImageId, caption: &str) -> Result<()> {
        self.gallery.relabel(image_id, caption).await
    }

    pub async fn append_many(&mut self, batch: Vec<UploadItem>) -> Result<BatchReport> {
        self.gallery.append_many(batch).await
    }

    /// Upload every filled draft row; rows that made it are emptied so a
    /// retry resubmits only the failures.
    pub async fn submit_drafts(&mut self) -> Result<BatchReport> {
        let batch = self.drafts.to_submission_batch();
        if batch.is_empty() {
            return Ok(BatchReport::default());
        }

        let report = self.gallery.append_many(batch).await?;
        for &slot_index in &report.uploaded {
            self.drafts.reset_slot(slot_index)?;
        }
        Ok(report)
    }
}
