//! Session supervision: creation, membership, and round progression.
//!
//! One [`Supervisor`] per client, all pointed at the same store. Every
//! operation here is a store write; the phase itself is never written,
//! only re-derived from the documents these writes produce.

mod lobby;
mod round;
mod score;

pub use score::BEST_IMAGE_POINTS;

use crate::error::GameResult;
use crate::imagegen::{ImageGenerator, PlaceholderGenerator};
use crate::phase;
use crate::store::{SessionStore, StoreEvent};
use crate::types::*;
use std::sync::Arc;
use tokio::sync::broadcast;

pub struct Supervisor {
    store: Arc<dyn SessionStore>,
    generator: Arc<dyn ImageGenerator>,
}

impl Supervisor {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            generator: Arc::new(PlaceholderGenerator),
        }
    }

    pub fn with_generator(store: Arc<dyn SessionStore>, generator: Arc<dyn ImageGenerator>) -> Self {
        Self { store, generator }
    }

    /// Snapshot stream for the reactive loop: on every event, recompute
    /// phase and UI state from the delivered documents.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    pub async fn session(&self, id: &str) -> GameResult<Session> {
        self.store.get_session(id).await
    }

    pub async fn round(&self, session_id: &str, index: u32) -> GameResult<Round> {
        self.store.get_round(session_id, index).await
    }

    /// The active round document, if the session has started and the
    /// round has been created.
    pub async fn current_round(&self, session: &Session) -> GameResult<Option<Round>> {
        if session.round_index == 0 {
            return Ok(None);
        }
        match self.store.get_round(&session.id, session.round_index).await {
            Ok(round) => Ok(Some(round)),
            Err(crate::error::GameError::UnknownRound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Convenience read: fetch the documents and derive the phase.
    pub async fn phase(&self, session_id: &str) -> GameResult<Phase> {
        let session = self.session(session_id).await?;
        let round = self.current_round(&session).await?;
        Ok(phase::infer_phase(&session, round.as_ref()))
    }

    /// Produce an image for a player's prompt via the configured provider.
    /// Failures are transient; the session is untouched until the image is
    /// actually submitted.
    pub async fn generate_image(&self, prompt: &str, requester: &str) -> GameResult<PromptedImage> {
        let image = self.generator.generate(prompt, requester).await?;
        tracing::debug!(
            "generated image {} for {} via {}",
            image.id,
            requester,
            self.generator.name()
        );
        Ok(image)
    }
}

/// Readiness is phase-scoped: whenever a write moves the derived phase
/// forward, every player's flag resets for the new phase.
fn clear_readiness(session: &mut Session) {
    for player in &mut session.players {
        player.is_ready = false;
    }
}
