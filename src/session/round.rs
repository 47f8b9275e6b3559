use super::{clear_readiness, Supervisor};
use crate::error::{GameError, GameResult};
use crate::phase;
use crate::store::SessionStore;
use crate::types::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

impl Supervisor {
    /// Start the session: host-only, needs at least two players. Creates
    /// round 1 with its rotation-assigned theme setter.
    pub async fn start_session(&self, session_id: &str, by: &str) -> GameResult<(Session, Round)> {
        let by_owned = by.to_string();
        let session = self
            .store
            .update_session(
                session_id,
                Box::new(move |session| {
                    if session.is_expired {
                        return Err(GameError::SessionExpired);
                    }
                    if session.host != by_owned {
                        return Err(GameError::NotHost);
                    }
                    if session.is_started {
                        return Err(GameError::AlreadyStarted);
                    }
                    if session.players.len() < 2 {
                        return Err(GameError::InsufficientPlayers {
                            required: 2,
                            actual: session.players.len(),
                        });
                    }
                    session.is_started = true;
                    session.round_index = 1;
                    clear_readiness(session);
                    Ok(())
                }),
            )
            .await?;

        let round = self.create_round(&session).await?;
        tracing::info!(
            "session {} started with {} players, round 1 setter {}",
            session_id,
            session.players.len(),
            round.theme_selector
        );
        Ok((session, round))
    }

    /// Set the round's theme. Setter-only; moves the derived phase from
    /// theme-setting to drawing, which resets everyone's readiness.
    pub async fn set_theme(
        &self,
        session_id: &str,
        round_index: u32,
        setter: &str,
        text: &str,
    ) -> GameResult<Round> {
        let session = self.store.get_session(session_id).await?;
        if session.is_expired {
            return Err(GameError::SessionExpired);
        }

        let setter_owned = setter.to_string();
        let theme = text.trim().to_string();
        let round = self
            .store
            .update_round(
                session_id,
                round_index,
                Box::new(move |round| {
                    if setter_owned != round.theme_selector {
                        return Err(GameError::NotSetter);
                    }
                    if !round.theme.trim().is_empty() {
                        return Err(GameError::AlreadySubmitted);
                    }
                    if theme.is_empty() {
                        return Err(GameError::EmptyTheme);
                    }
                    round.theme = theme;
                    Ok(())
                }),
            )
            .await?;

        self.store
            .update_session(
                session_id,
                Box::new(|session| {
                    clear_readiness(session);
                    Ok(())
                }),
            )
            .await?;

        tracing::info!("round {} theme set: {}", round_index, round.theme);
        Ok(round)
    }

    /// Submit a player's image for the round. Each non-setter player
    /// gets the style's images-per-player quota; a submission past the
    /// quota is a hard `AlreadySubmitted` rejection. The append runs
    /// inside a store transaction, so two players submitting at the
    /// same moment both land.
    pub async fn submit_image(
        &self,
        session_id: &str,
        round_index: u32,
        image: PromptedImage,
    ) -> GameResult<Round> {
        let session = self.store.get_session(session_id).await?;
        if session.is_expired {
            return Err(GameError::SessionExpired);
        }
        let player_id = image.created_by.clone();
        if session.player(&player_id).is_none() {
            return Err(GameError::UnknownPlayer(player_id));
        }
        let required = phase::required_images(&session);
        let per_player = session.style.images_per_player() as usize;

        let pid = player_id.clone();
        let round = self
            .store
            .update_round(
                session_id,
                round_index,
                Box::new(move |round| {
                    // Drawing only happens between theme and vote.
                    if round.theme.trim().is_empty() || round.best_image.is_some() {
                        return Err(GameError::NotYourTurn);
                    }
                    if pid == round.theme_selector {
                        return Err(GameError::NotYourTurn);
                    }
                    if round.submissions_by(&pid) >= per_player {
                        return Err(GameError::AlreadySubmitted);
                    }
                    round.images.push(image);
                    Ok(())
                }),
            )
            .await?;

        // A submitter is done with this phase once they hit their quota.
        // Once the last drawing lands the derived phase moves to voting,
        // and readiness resets for the new phase.
        let complete = round.images.len() >= required;
        let quota_met = round.submissions_by(&player_id) >= per_player;
        self.store
            .update_session(
                session_id,
                Box::new(move |session| {
                    if complete {
                        clear_readiness(session);
                    } else if quota_met {
                        if let Some(player) = session.player_mut(&player_id) {
                            player.is_ready = true;
                        }
                    }
                    Ok(())
                }),
            )
            .await?;

        Ok(round)
    }

    /// The setter picks the round winner. Sets the best image and awards
    /// its creator exactly once: the write is a conditional set (only if
    /// currently unset), so racing retries cannot double the award.
    /// Retrying with the already-chosen image is an idempotent no-op.
    pub async fn choose_best_image(
        &self,
        session_id: &str,
        round_index: u32,
        setter: &str,
        image_id: &str,
    ) -> GameResult<Round> {
        let session = self.store.get_session(session_id).await?;
        if session.is_expired {
            return Err(GameError::SessionExpired);
        }
        let required = phase::required_images(&session);

        let did_set = Arc::new(AtomicBool::new(false));
        let flag = did_set.clone();
        let setter_owned = setter.to_string();
        let image_id_owned = image_id.to_string();
        let round = self
            .store
            .update_round(
                session_id,
                round_index,
                Box::new(move |round| {
                    if round.theme.trim().is_empty() || round.images.len() < required {
                        return Err(GameError::NotYourTurn);
                    }
                    if setter_owned != round.theme_selector {
                        return Err(GameError::NotSetter);
                    }
                    match &round.best_image {
                        // Retry of an already-resolved round with the same
                        // choice: accept without a second award.
                        Some(current) if *current == image_id_owned => Ok(()),
                        Some(_) => Err(GameError::AlreadySubmitted),
                        None => {
                            if round.image(&image_id_owned).is_none() {
                                return Err(GameError::UnknownImage(image_id_owned.clone()));
                            }
                            round.best_image = Some(image_id_owned.clone());
                            flag.store(true, Ordering::SeqCst);
                            Ok(())
                        }
                    }
                }),
            )
            .await?;

        if !did_set.load(Ordering::SeqCst) {
            return Ok(round);
        }

        // This call won the conditional set, so it alone applies the award
        // and closes out the round.
        let winner = round
            .image(image_id)
            .map(|img| img.created_by.clone())
            .ok_or_else(|| GameError::UnknownImage(image_id.to_string()))?;
        self.award_best_image(session_id, &winner).await?;

        self.store
            .update_round(
                session_id,
                round_index,
                Box::new(|round| {
                    round.is_finished = true;
                    Ok(())
                }),
            )
            .await
    }

    /// Move on from the summary of round `completed_index`: create the
    /// next round, or expire the session after the final one. Any player
    /// may confirm. Idempotent: confirming a round the session has
    /// already moved past is a no-op, so repeated or concurrent
    /// confirmations of the same summary advance the session once.
    pub async fn advance_round(
        &self,
        session_id: &str,
        by: &str,
        completed_index: u32,
    ) -> GameResult<Session> {
        let session = self.store.get_session(session_id).await?;
        if session.player(by).is_none() {
            return Err(GameError::UnknownPlayer(by.to_string()));
        }
        if session.is_expired || session.round_index > completed_index {
            // Terminal, or another confirm already advanced past this
            // round; nothing left to do.
            return Ok(session);
        }

        let current = self.store.get_round(session_id, completed_index).await?;
        if current.best_image.is_none() {
            return Err(GameError::NotYourTurn);
        }

        let advanced = Arc::new(AtomicBool::new(false));
        let flag = advanced.clone();
        let session = self
            .store
            .update_session(
                session_id,
                Box::new(move |session| {
                    if session.is_expired || session.round_index != completed_index {
                        // Someone else already advanced; keep this call a
                        // no-op instead of skipping a round.
                        return Ok(());
                    }
                    if session.round_index >= session.number_of_rounds {
                        session.is_expired = true;
                    } else {
                        session.round_index += 1;
                        flag.store(true, Ordering::SeqCst);
                    }
                    clear_readiness(session);
                    Ok(())
                }),
            )
            .await?;

        if advanced.load(Ordering::SeqCst) {
            let round = self.create_round(&session).await?;
            tracing::info!(
                "session {} advanced to round {}, setter {}",
                session_id,
                round.index,
                round.theme_selector
            );
        } else if session.is_expired {
            tracing::info!("session {} finished after round {}", session_id, completed_index);
        }

        Ok(session)
    }

    /// Create the round document for the session's current index, with the
    /// setter recomputed by rotation over the current roster. Racing
    /// creators are harmless: the store keeps the first document.
    async fn create_round(&self, session: &Session) -> GameResult<Round> {
        let selector = phase::theme_selector(session, session.round_index).ok_or(
            GameError::InsufficientPlayers {
                required: 2,
                actual: 0,
            },
        )?;
        let round = Round::new(session.round_index, selector.id.clone());
        self.store.insert_round(&session.id, round.clone()).await?;
        self.store.get_round(&session.id, session.round_index).await
    }
}
