//! Slide service: persistence plus live room notifications.

use tracing::{instrument, warn};

use crate::db::{Database, StoreError, StoreResult};
use crate::presentation::room_for;
use crate::ws::{RoomEvent, RoomHub};

use super::models::{Slide, SlideDraft, SlideRequest, Tally};
use super::repository::SlideRepository;
use super::votes::VoteStore;

/// Service for slide management and voting.
///
/// Writes go to the database first; only once they commit is the matching
/// [`RoomEvent`] broadcast to the presentation's room.
#[derive(Debug, Clone)]
pub struct SlideService {
    repo: SlideRepository,
    votes: VoteStore,
    hub: RoomHub,
}

impl SlideService {
    pub fn new(db: Database, hub: RoomHub) -> Self {
        Self {
            repo: SlideRepository::new(db.clone()),
            votes: VoteStore::new(db),
            hub,
        }
    }

    pub async fn list_slides(&self, presentation_id: i64) -> StoreResult<Vec<Slide>> {
        self.repo.find_all_slides(presentation_id).await
    }

    pub async fn get_slide(&self, presentation_id: i64, slide_id: i64) -> StoreResult<Slide> {
        self.repo
            .get_slide(presentation_id, slide_id)
            .await?
            .ok_or_else(|| {
                StoreError::not_found(format!(
                    "slide {slide_id} in presentation {presentation_id}"
                ))
            })
    }

    #[instrument(skip(self, request))]
    pub async fn create_slide(
        &self,
        presentation_id: i64,
        request: SlideRequest,
    ) -> StoreResult<Slide> {
        let draft = SlideDraft::try_from(request)?;
        let slide = self.repo.create_slide(presentation_id, draft).await?;
        self.publish_slide(&slide).await;
        Ok(slide)
    }

    #[instrument(skip(self, request))]
    pub async fn update_slide(
        &self,
        presentation_id: i64,
        slide_id: i64,
        request: SlideRequest,
    ) -> StoreResult<Slide> {
        let draft = SlideDraft::try_from(request)?;
        let slide = self
            .repo
            .update_slide(presentation_id, slide_id, draft)
            .await?;
        self.publish_slide(&slide).await;
        Ok(slide)
    }

    #[instrument(skip(self))]
    pub async fn delete_slide(&self, presentation_id: i64, slide_id: i64) -> StoreResult<()> {
        self.repo.delete_slide(presentation_id, slide_id).await?;
        self.publish(
            presentation_id,
            RoomEvent::SlideDeleted {
                presentation_id,
                slide_id,
            },
        )
        .await;
        Ok(())
    }

    /// Record one vote and push the new tally to the presentation's room.
    ///
    /// The content must belong to `presentation_id` and the option to the
    /// content; otherwise nothing is written and `NoRowsAffected` is returned.
    #[instrument(skip(self))]
    pub async fn submit_vote(
        &self,
        presentation_id: i64,
        content_id: i64,
        option_id: i64,
    ) -> StoreResult<Tally> {
        let owner = self.votes.content_presentation(content_id).await?;
        if owner != Some(presentation_id) {
            return Err(StoreError::no_rows(format!(
                "content {content_id} in presentation {presentation_id}"
            )));
        }

        if self.votes.submit_vote(content_id, option_id).await? == 0 {
            return Err(StoreError::no_rows(format!(
                "option {option_id} in content {content_id}"
            )));
        }

        let tally = self.votes.tally(presentation_id, content_id).await?;
        self.publish(presentation_id, RoomEvent::tally(tally.clone()))
            .await;
        Ok(tally)
    }

    async fn publish_slide(&self, slide: &Slide) {
        match RoomEvent::slide_updated(slide) {
            Ok(event) => self.publish(slide.presentation_id, event).await,
            Err(e) => warn!(slide_id = slide.id, error = %e, "Failed to encode slide event"),
        }
    }

    /// Broadcast failures are logged, never returned: the write has already
    /// committed.
    async fn publish(&self, presentation_id: i64, event: RoomEvent) {
        let frame = match event.to_json() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(presentation_id, error = %e, "Failed to encode room event");
                return;
            }
        };
        if let Err(e) = self.hub.broadcast(&room_for(presentation_id), frame).await {
            warn!(presentation_id, error = %e, "Failed to broadcast room event");
        }
    }
}
