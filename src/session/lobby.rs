use super::{clear_readiness, Supervisor};
use crate::error::{GameError, GameResult};
use crate::store::SessionStore;
use crate::types::*;
use rand::Rng;

/// Safe character set for room codes (excludes 0/O, 1/I/L to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 5;

/// Attempts before giving up on finding a free room code.
const CODE_ATTEMPTS: usize = 8;

fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

fn normalize_room_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl Supervisor {
    /// Create a session with the caller as host and sole player.
    ///
    /// The room code is verified unique among joinable (not started, not
    /// expired) sessions before the session is committed; collisions retry
    /// with a fresh code a bounded number of times, then surface
    /// [`GameError::RoomCodeTaken`].
    pub async fn create_session(
        &self,
        host_id: &str,
        host_alias: &str,
        config: SessionConfig,
    ) -> GameResult<Session> {
        let room_code = {
            let mut found = None;
            for _ in 0..CODE_ATTEMPTS {
                let code = generate_room_code();
                let clashing = self.store.find_by_room_code(&code).await?;
                if clashing.iter().all(|s| !s.is_joinable()) {
                    found = Some(code);
                    break;
                }
            }
            found.ok_or(GameError::RoomCodeTaken)?
        };

        let mut host = Player::new(host_id, host_alias);
        host.is_host = true;

        let session = Session {
            id: ulid::Ulid::new().to_string(),
            room_code,
            host: host_id.to_string(),
            style: config.style,
            players: vec![host],
            round_index: 0,
            number_of_rounds: config.number_of_rounds,
            max_players: config.max_players,
            is_started: false,
            is_expired: false,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        self.store.insert_session(session.clone()).await?;
        tracing::info!(
            "created session {} (room code {}) hosted by {}",
            session.id,
            session.room_code,
            host_id
        );
        Ok(session)
    }

    /// Join a session by room code.
    ///
    /// Exactly one eligible session must match: joinable ones, plus
    /// already-started ones the player belongs to (re-join after a
    /// disconnect). Re-joining is idempotent and never resets the player's
    /// score or duplicates their entry.
    pub async fn join_session(
        &self,
        room_code: &str,
        player_id: &str,
        alias: &str,
    ) -> GameResult<Session> {
        let code = normalize_room_code(room_code);
        let candidates = self.store.find_by_room_code(&code).await?;

        let eligible: Vec<&Session> = candidates
            .iter()
            .filter(|s| s.is_joinable() || s.player(player_id).is_some())
            .collect();

        let session = match eligible.as_slice() {
            [] => return Err(GameError::NoSessionFound),
            [one] => one,
            _ => {
                // Creation enforces uniqueness; reaching this means the
                // store holds conflicting documents.
                tracing::warn!("room code {} matches {} sessions", code, eligible.len());
                return Err(GameError::AmbiguousRoomCode);
            }
        };

        let player_id_owned = player_id.to_string();
        let alias_owned = alias.to_string();
        let joined = self
            .store
            .update_session(
                &session.id,
                Box::new(move |session| {
                    if session.is_expired {
                        return Err(GameError::SessionExpired);
                    }
                    if session.player(&player_id_owned).is_some() {
                        // Re-join: keep the existing record as-is.
                        return Ok(());
                    }
                    if session.is_started {
                        return Err(GameError::AlreadyStarted);
                    }
                    if session.players.len() >= session.max_players {
                        return Err(GameError::SessionFull(session.max_players));
                    }
                    session.players.push(Player::new(&player_id_owned, &alias_owned));
                    Ok(())
                }),
            )
            .await?;

        tracing::info!("{} joined session {}", player_id, joined.id);
        Ok(joined)
    }

    /// Remove a player from the session.
    ///
    /// The session expires when the last player or the host leaves. Past
    /// rounds keep their recorded selector and images. Leaving a session
    /// the player is not part of is a no-op.
    pub async fn leave_session(&self, session_id: &str, player_id: &str) -> GameResult<Session> {
        let player_id_owned = player_id.to_string();
        let session = self
            .store
            .update_session(
                session_id,
                Box::new(move |session| {
                    let before = session.players.len();
                    session.players.retain(|p| p.id != player_id_owned);
                    if session.players.len() == before {
                        return Ok(());
                    }
                    if session.players.is_empty() || session.host == player_id_owned {
                        session.is_expired = true;
                    }
                    Ok(())
                }),
            )
            .await?;

        if session.is_expired {
            tracing::info!("session {} expired after {} left", session_id, player_id);
        } else {
            tracing::info!("{} left session {}", player_id, session_id);
        }
        Ok(session)
    }

    /// Change a player's display alias. Owner-only: callers pass their own
    /// id. A blank alias is ignored.
    pub async fn rename_player(
        &self,
        session_id: &str,
        player_id: &str,
        alias: &str,
    ) -> GameResult<Session> {
        let player_id_owned = player_id.to_string();
        let alias = alias.trim().to_string();
        self.store
            .update_session(
                session_id,
                Box::new(move |session| {
                    let player = session
                        .player_mut(&player_id_owned)
                        .ok_or_else(|| GameError::UnknownPlayer(player_id_owned.clone()))?;
                    if !alias.is_empty() {
                        player.name = alias;
                    }
                    Ok(())
                }),
            )
            .await
    }

    /// Mark a player ready (lobby and summary screens show who is set to
    /// continue). Informational; never gates a phase transition.
    pub async fn set_ready(
        &self,
        session_id: &str,
        player_id: &str,
        ready: bool,
    ) -> GameResult<Session> {
        let player_id_owned = player_id.to_string();
        self.store
            .update_session(
                session_id,
                Box::new(move |session| {
                    let player = session
                        .player_mut(&player_id_owned)
                        .ok_or_else(|| GameError::UnknownPlayer(player_id_owned.clone()))?;
                    player.is_ready = ready;
                    Ok(())
                }),
            )
            .await
    }

    /// End the session outright. Host-only; expiry is terminal.
    pub async fn end_session(&self, session_id: &str, by: &str) -> GameResult<Session> {
        let by_owned = by.to_string();
        let session = self
            .store
            .update_session(
                session_id,
                Box::new(move |session| {
                    if session.host != by_owned {
                        return Err(GameError::NotHost);
                    }
                    session.is_expired = true;
                    clear_readiness(session);
                    Ok(())
                }),
            )
            .await?;
        tracing::info!("session {} ended by host", session_id);
        Ok(session)
    }
}
