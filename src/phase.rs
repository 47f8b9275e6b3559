//! Round lifecycle engine.
//!
//! The phase of a round is never stored. It is a pure function of the
//! session and round documents, recomputed on every observation, so any
//! number of independently-connected clients converge on the same view
//! without a writable "current stage" flag to race on. A client that
//! reconnects mid-round reads the same documents and lands on the same
//! phase as everyone else.
//!
//! Nothing in this module writes. Phase transitions happen only as a side
//! effect of writes to the underlying round data (theme, images, best
//! image), which live in [`crate::session`].

use crate::types::*;

/// Rotation offset applied to the setter formula. Fixed per session.
pub const ROTATION_OFFSET: u32 = 0;

/// Derive the active phase from a session and its current round.
///
/// Clauses are evaluated in this fixed order; the first match wins:
/// 1. not started -> `Lobby`
/// 2. expired -> `Finished`
/// 3. theme unset -> `Theme`
/// 4. fewer images than non-setter players -> `Draw`
/// 5. best image unset -> `Vote`
/// 6. otherwise -> `RoundSummary`
///
/// Total: every reachable document state lands in exactly one phase. A
/// started, unexpired session with no round document yet is in `Theme`,
/// since the round's facts are all still unset.
pub fn infer_phase(session: &Session, round: Option<&Round>) -> Phase {
    if !session.is_started {
        return Phase::Lobby;
    }
    if session.is_expired {
        return Phase::Finished;
    }

    let Some(round) = round else {
        return Phase::Theme;
    };

    if round.theme.trim().is_empty() {
        return Phase::Theme;
    }
    if round.images.len() < required_images(session) {
        return Phase::Draw;
    }
    if round.best_image.is_none() {
        return Phase::Vote;
    }

    Phase::RoundSummary
}

/// How many image submissions a round needs before voting can happen:
/// the style's images-per-player quota for every player other than the
/// setter. With fewer than two players this is zero, and the draw phase
/// is skipped entirely.
pub fn required_images(session: &Session) -> usize {
    session.players.len().saturating_sub(1) * session.style.images_per_player() as usize
}

/// The player responsible for setting this round's theme and choosing its
/// winner, by rotation over the join-ordered roster:
///
/// `players[(round_index + offset) mod len]`
///
/// The roster is a stable, join-ordered list, never a map iteration, so
/// every client computes the same selector. With offset 0 and players
/// `[A, B, C]`, round 1 falls on B, round 2 on C, round 3 on A.
///
/// Returns `None` for an empty roster. Callers assigning a new round
/// snapshot the result into the round document; past rounds keep their
/// stored selector even if the roster changes afterwards.
pub fn theme_selector(session: &Session, round_index: u32) -> Option<&Player> {
    if session.players.is_empty() {
        return None;
    }
    let idx = (round_index + ROTATION_OFFSET) as usize % session.players.len();
    session.players.get(idx)
}

/// The players expected to act in the given phase.
pub fn acting_players(session: &Session, round: &Round) -> Vec<PlayerId> {
    match infer_phase(session, Some(round)) {
        Phase::Theme | Phase::Vote => vec![round.theme_selector.clone()],
        Phase::Draw => session
            .players
            .iter()
            .filter(|p| p.id != round.theme_selector)
            .map(|p| p.id.clone())
            .collect(),
        Phase::Lobby | Phase::RoundSummary | Phase::Finished => Vec::new(),
    }
}

/// The acting players who have not yet completed this phase's action.
///
/// Informational only (waiting lists in the UI). Never consulted for
/// advancing the phase: the phase already follows from the data these
/// actions produce.
pub fn waiting_on(session: &Session, round: &Round) -> Vec<PlayerId> {
    match infer_phase(session, Some(round)) {
        Phase::Theme | Phase::Vote => vec![round.theme_selector.clone()],
        Phase::Draw => {
            let per_player = session.style.images_per_player() as usize;
            session
                .players
                .iter()
                .filter(|p| {
                    p.id != round.theme_selector && round.submissions_by(&p.id) < per_player
                })
                .map(|p| p.id.clone())
                .collect()
        }
        Phase::Lobby | Phase::RoundSummary | Phase::Finished => Vec::new(),
    }
}

/// True once every acting player for the current phase has finished.
pub fn all_ready(session: &Session, round: &Round) -> bool {
    waiting_on(session, round).is_empty()
}

/// Human status line for the session, matching the lobby/game screens.
pub fn session_status(session: &Session, round: Option<&Round>) -> &'static str {
    match infer_phase(session, round) {
        Phase::Lobby => "Waiting for players",
        Phase::Theme | Phase::Vote => "Waiting for players to be ready",
        Phase::Draw => "Waiting for players to finish",
        Phase::RoundSummary => "Waiting for players to be ready",
        Phase::Finished => "Finished",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(player_ids: &[&str]) -> Session {
        let mut players: Vec<Player> = player_ids
            .iter()
            .map(|id| Player::new(*id, format!("Player {id}")))
            .collect();
        if let Some(first) = players.first_mut() {
            first.is_host = true;
        }
        Session {
            id: "s1".to_string(),
            room_code: "ABCDE".to_string(),
            host: player_ids.first().unwrap_or(&"").to_string(),
            style: GameStyle::Simons,
            players,
            round_index: 1,
            number_of_rounds: 3,
            max_players: 6,
            is_started: true,
            is_expired: false,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn image(id: &str, by: &str) -> PromptedImage {
        PromptedImage {
            id: id.to_string(),
            uri: format!("https://example.com/{id}.png"),
            prompt: "something spooky".to_string(),
            created_by: by.to_string(),
        }
    }

    #[test]
    fn test_not_started_is_lobby() {
        let mut s = session(&["a", "b", "c"]);
        s.is_started = false;
        s.round_index = 0;
        assert_eq!(infer_phase(&s, None), Phase::Lobby);
    }

    #[test]
    fn test_not_started_wins_over_expired() {
        // Clause order is fixed: an expired session that never started
        // still reads as lobby, not finished.
        let mut s = session(&["a"]);
        s.is_started = false;
        s.is_expired = true;
        assert_eq!(infer_phase(&s, None), Phase::Lobby);
    }

    #[test]
    fn test_expired_is_finished() {
        let mut s = session(&["a", "b", "c"]);
        s.is_expired = true;
        let round = Round::new(1, "b".to_string());
        assert_eq!(infer_phase(&s, Some(&round)), Phase::Finished);
    }

    #[test]
    fn test_missing_round_is_theme() {
        let s = session(&["a", "b", "c"]);
        assert_eq!(infer_phase(&s, None), Phase::Theme);
    }

    #[test]
    fn test_blank_theme_is_theme() {
        let s = session(&["a", "b", "c"]);
        let mut round = Round::new(1, "b".to_string());
        assert_eq!(infer_phase(&s, Some(&round)), Phase::Theme);

        // Whitespace does not count as a theme.
        round.theme = "   ".to_string();
        assert_eq!(infer_phase(&s, Some(&round)), Phase::Theme);
    }

    #[test]
    fn test_incomplete_images_is_draw() {
        let s = session(&["a", "b", "c"]);
        let mut round = Round::new(1, "b".to_string());
        round.theme = "Halloween".to_string();
        assert_eq!(infer_phase(&s, Some(&round)), Phase::Draw);

        round.images.push(image("i1", "a"));
        assert_eq!(infer_phase(&s, Some(&round)), Phase::Draw);
    }

    #[test]
    fn test_all_images_in_is_vote() {
        let s = session(&["a", "b", "c"]);
        let mut round = Round::new(1, "b".to_string());
        round.theme = "Halloween".to_string();
        round.images.push(image("i1", "a"));
        round.images.push(image("i2", "c"));
        assert_eq!(infer_phase(&s, Some(&round)), Phase::Vote);
    }

    #[test]
    fn test_best_image_set_is_round_summary() {
        let s = session(&["a", "b", "c"]);
        let mut round = Round::new(1, "b".to_string());
        round.theme = "Halloween".to_string();
        round.images.push(image("i1", "a"));
        round.images.push(image("i2", "c"));
        round.best_image = Some("i1".to_string());
        assert_eq!(infer_phase(&s, Some(&round)), Phase::RoundSummary);
    }

    #[test]
    fn test_single_player_skips_draw() {
        // With fewer than two players no images are required, so a themed
        // round is immediately open for voting.
        let s = session(&["a"]);
        let mut round = Round::new(1, "a".to_string());
        round.theme = "Halloween".to_string();
        assert_eq!(required_images(&s), 0);
        assert_eq!(infer_phase(&s, Some(&round)), Phase::Vote);
    }

    #[test]
    fn test_empty_roster_required_images() {
        let mut s = session(&["a"]);
        s.players.clear();
        assert_eq!(required_images(&s), 0);
    }

    #[test]
    fn test_required_images_scales_with_style_quota() {
        let mut s = session(&["a", "b", "c"]);
        assert_eq!(required_images(&s), 2);

        s.style = GameStyle::Original {
            images_per_player: 2,
        };
        assert_eq!(required_images(&s), 4);

        // Draw persists until the full quota is in, and the waiting list
        // tracks each player's remaining quota.
        let mut round = Round::new(1, "b".to_string());
        round.theme = "Halloween".to_string();
        round.images.push(image("i1", "a"));
        round.images.push(image("i2", "a"));
        round.images.push(image("i3", "c"));
        assert_eq!(infer_phase(&s, Some(&round)), Phase::Draw);
        assert_eq!(waiting_on(&s, &round), vec!["c".to_string()]);

        round.images.push(image("i4", "c"));
        assert_eq!(infer_phase(&s, Some(&round)), Phase::Vote);
    }

    #[test]
    fn test_phase_is_deterministic() {
        let s = session(&["a", "b", "c"]);
        let mut round = Round::new(1, "b".to_string());
        round.theme = "Halloween".to_string();
        let first = infer_phase(&s, Some(&round));
        let second = infer_phase(&s, Some(&round));
        assert_eq!(first, second);
    }

    #[test]
    fn test_every_fact_combination_lands_in_one_phase() {
        // Totality: walk every combination of the three derived-from facts
        // plus the session flags; each must produce exactly one phase.
        for started in [false, true] {
            for expired in [false, true] {
                for themed in [false, true] {
                    for images in 0..=2usize {
                        for best in [false, true] {
                            let mut s = session(&["a", "b", "c"]);
                            s.is_started = started;
                            s.is_expired = expired;
                            let mut round = Round::new(1, "b".to_string());
                            if themed {
                                round.theme = "Halloween".to_string();
                            }
                            for i in 0..images {
                                round.images.push(image(&format!("i{i}"), "a"));
                            }
                            if best {
                                round.best_image = Some("i0".to_string());
                            }
                            // Must not panic; the result is one of the six.
                            let phase = infer_phase(&s, Some(&round));
                            assert!(matches!(
                                phase,
                                Phase::Lobby
                                    | Phase::Theme
                                    | Phase::Draw
                                    | Phase::Vote
                                    | Phase::RoundSummary
                                    | Phase::Finished
                            ));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_rotation_concrete_assignments() {
        let s = session(&["a", "b", "c"]);
        assert_eq!(theme_selector(&s, 1).unwrap().id, "b");
        assert_eq!(theme_selector(&s, 2).unwrap().id, "c");
        assert_eq!(theme_selector(&s, 3).unwrap().id, "a");
    }

    #[test]
    fn test_rotation_fairness() {
        // N players, N consecutive rounds: everyone selects exactly once.
        for n in 1..=6usize {
            let ids: Vec<String> = (0..n).map(|i| format!("p{i}")).collect();
            let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            let s = session(&refs);

            let mut seen = std::collections::HashSet::new();
            for round_index in 1..=n as u32 {
                let selector = theme_selector(&s, round_index).unwrap();
                assert!(seen.insert(selector.id.clone()), "{} selected twice", selector.id);
            }
            assert_eq!(seen.len(), n);
        }
    }

    #[test]
    fn test_rotation_empty_roster() {
        let mut s = session(&["a"]);
        s.players.clear();
        assert!(theme_selector(&s, 1).is_none());
    }

    #[test]
    fn test_rotation_recomputes_over_current_roster() {
        // After a player leaves, future rounds rotate over who is left.
        let mut s = session(&["a", "b", "c"]);
        s.players.retain(|p| p.id != "b");
        assert_eq!(theme_selector(&s, 1).unwrap().id, "c");
        assert_eq!(theme_selector(&s, 2).unwrap().id, "a");
    }

    #[test]
    fn test_acting_and_waiting_players() {
        let s = session(&["a", "b", "c"]);
        let mut round = Round::new(1, "b".to_string());

        // Theme phase: only the setter acts.
        assert_eq!(acting_players(&s, &round), vec!["b".to_string()]);
        assert_eq!(waiting_on(&s, &round), vec!["b".to_string()]);
        assert!(!all_ready(&s, &round));

        // Draw phase: everyone but the setter, drained as they submit.
        round.theme = "Halloween".to_string();
        assert_eq!(
            acting_players(&s, &round),
            vec!["a".to_string(), "c".to_string()]
        );
        round.images.push(image("i1", "a"));
        assert_eq!(waiting_on(&s, &round), vec!["c".to_string()]);

        // Vote phase: back to the setter.
        round.images.push(image("i2", "c"));
        assert_eq!(waiting_on(&s, &round), vec!["b".to_string()]);

        // Summary: nobody owes an action.
        round.best_image = Some("i1".to_string());
        assert!(waiting_on(&s, &round).is_empty());
        assert!(all_ready(&s, &round));
    }

    #[test]
    fn test_session_status_lines() {
        let mut s = session(&["a", "b", "c"]);
        s.is_started = false;
        assert_eq!(session_status(&s, None), "Waiting for players");

        s.is_started = true;
        let mut round = Round::new(1, "b".to_string());
        assert_eq!(session_status(&s, Some(&round)), "Waiting for players to be ready");

        round.theme = "Halloween".to_string();
        assert_eq!(session_status(&s, Some(&round)), "Waiting for players to finish");

        s.is_expired = true;
        assert_eq!(session_status(&s, Some(&round)), "Finished");
    }
}
