use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type SessionId = String;
pub type PlayerId = String;
pub type ImageId = String;

/// One step of a round's lifecycle.
///
/// Never persisted: every client re-derives it from the Session and Round
/// documents via [`crate::phase::infer_phase`], so a reconnecting client
/// always lands on the same phase as everyone else.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Lobby,
    Theme,
    Draw,
    Vote,
    RoundSummary,
    Finished,
}

/// Closed set of game styles a session can be created with.
///
/// Style-specific fields live on the variant, so code dispatches with a
/// `match` instead of string comparisons on a style field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "style", rename_all = "lowercase")]
pub enum GameStyle {
    Original { images_per_player: u32 },
    Custom { images_per_player: u32 },
    Simons,
}

impl GameStyle {
    pub fn description(&self) -> &'static str {
        match self {
            GameStyle::Original { .. } => "Original game style",
            GameStyle::Custom { .. } => "Custom game style",
            GameStyle::Simons => "Simons game style",
        }
    }

    /// How many images each non-setter player draws per round.
    pub fn images_per_player(&self) -> u32 {
        match self {
            GameStyle::Original { images_per_player }
            | GameStyle::Custom { images_per_player } => *images_per_player,
            GameStyle::Simons => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub style: GameStyle,
    pub number_of_rounds: u32,
    pub max_players: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            style: GameStyle::Simons,
            number_of_rounds: 3,
            max_players: 6,
        }
    }
}

/// A session document: one game instance from creation to expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    /// Short human-entered join code, unique among joinable sessions.
    pub room_code: String,
    /// Player that created the session; privileged for start/end.
    pub host: PlayerId,
    pub style: GameStyle,
    /// Join-ordered roster with unique ids. Order matters: setter rotation
    /// walks this list, so enumeration must be stable across reads.
    pub players: Vec<Player>,
    /// 0 until the session starts, then the 1-based index of the active round.
    pub round_index: u32,
    pub number_of_rounds: u32,
    pub max_players: usize,
    pub is_started: bool,
    /// Terminal: once set, no further mutation is meaningful.
    pub is_expired: bool,
    pub created_at: String,
}

impl Session {
    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// A session can be joined by code until it starts or expires.
    pub fn is_joinable(&self) -> bool {
        !self.is_started && !self.is_expired
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    /// Display alias, mutable by the owner only.
    pub name: String,
    /// Adjusted only by the score ledger.
    pub score: u32,
    /// Phase-scoped: cleared whenever the derived phase moves forward.
    pub is_ready: bool,
    pub is_host: bool,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            score: 0,
            is_ready: false,
            is_host: false,
        }
    }
}

/// A round document, addressed by its 1-based index under the session.
///
/// There is no stored stage field: the theme, image list, and best-image
/// fields are the facts the phase is derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub index: u32,
    /// Empty until the setter picks one.
    pub theme: String,
    /// Immutable history: assigned by rotation when the round is created
    /// and never recomputed, even if players leave later.
    pub theme_selector: PlayerId,
    /// Submission-ordered; one entry per non-setter player.
    pub images: Vec<PromptedImage>,
    /// Set exactly once, when the setter picks the round winner.
    pub best_image: Option<ImageId>,
    /// True once scoring has been applied.
    pub is_finished: bool,
}

impl Round {
    pub fn new(index: u32, theme_selector: PlayerId) -> Self {
        Self {
            index,
            theme: String::new(),
            theme_selector,
            images: Vec::new(),
            best_image: None,
            is_finished: false,
        }
    }

    pub fn image(&self, id: &str) -> Option<&PromptedImage> {
        self.images.iter().find(|i| i.id == id)
    }

    pub fn submissions_by(&self, player: &str) -> usize {
        self.images.iter().filter(|i| i.created_by == player).count()
    }
}

/// An image produced from a player's prompt. Immutable once created;
/// referenced by `Round::images` and `Round::best_image`, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PromptedImage {
    pub id: ImageId,
    pub uri: String,
    pub prompt: String,
    pub created_by: PlayerId,
}
