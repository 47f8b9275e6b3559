//! Image generation boundary.
//!
//! The real generation backend lives outside this crate; the core only
//! depends on this trait. Generation failures are always recoverable: the
//! caller retries or asks the player for a new prompt, and the session is
//! never touched by a failed generation.

mod placeholder;

pub use placeholder::PlaceholderGenerator;

use crate::error::GameResult;
use crate::types::PromptedImage;
use async_trait::async_trait;

/// Trait that all image generation providers must implement.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Produce an image for the given prompt on behalf of a player.
    ///
    /// Fails with [`crate::error::GameError::GenerationFailed`], which is
    /// transient; timeouts report the same way.
    async fn generate(&self, prompt: &str, requester: &str) -> GameResult<PromptedImage>;

    /// Name of this provider, for logging.
    fn name(&self) -> &str;
}
