use super::ImageGenerator;
use crate::error::{GameError, GameResult};
use crate::types::PromptedImage;
use async_trait::async_trait;
use rand::Rng;

/// Stock-photo stand-in used when no real backend is configured, so a game
/// can be played end to end without an image API key.
pub struct PlaceholderGenerator;

#[async_trait]
impl ImageGenerator for PlaceholderGenerator {
    async fn generate(&self, prompt: &str, requester: &str) -> GameResult<PromptedImage> {
        if prompt.trim().is_empty() {
            return Err(GameError::GenerationFailed("prompt is empty".to_string()));
        }

        let index = rand::rng().random_range(0..100);
        tracing::debug!("serving placeholder image {} for {}", index, requester);

        Ok(PromptedImage {
            id: ulid::Ulid::new().to_string(),
            uri: format!("https://picsum.photos/id/{index}/256/256"),
            prompt: prompt.to_string(),
            created_by: requester.to_string(),
        })
    }

    fn name(&self) -> &str {
        "placeholder"
    }
}
