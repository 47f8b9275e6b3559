use super::{clear_readiness, Supervisor};
use crate::error::GameResult;
use crate::store::SessionStore;
use crate::types::*;

/// Points awarded to the creator of a round's winning image.
pub const BEST_IMAGE_POINTS: u32 = 5;

impl Supervisor {
    /// Apply the round award to the winning image's creator.
    ///
    /// Called only by the winner of the best-image conditional set, which
    /// is what makes the award exactly-once. A winner who already left the
    /// session forfeits the points; the round stays resolved.
    pub(crate) async fn award_best_image(&self, session_id: &str, winner: &str) -> GameResult<Session> {
        let winner_owned = winner.to_string();
        let session = self
            .store
            .update_session(
                session_id,
                Box::new(move |session| {
                    match session.player_mut(&winner_owned) {
                        Some(player) => player.score += BEST_IMAGE_POINTS,
                        None => {
                            tracing::warn!("round winner {} has left; no award", winner_owned)
                        }
                    }
                    // Resolution moves the phase to the round summary.
                    clear_readiness(session);
                    Ok(())
                }),
            )
            .await?;

        tracing::info!("awarded {} points to {}", BEST_IMAGE_POINTS, winner);
        Ok(session)
    }

    /// Players ordered by cumulative score, highest first.
    pub async fn leaderboard(&self, session_id: &str) -> GameResult<Vec<Player>> {
        let mut players = self.session(session_id).await?.players;
        players.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(players)
    }
}
