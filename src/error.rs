/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;

/// Errors that game operations can surface to the caller.
///
/// Every rejection carries the specific kind so the presentation layer can
/// show it to the player instead of swallowing it. Only
/// [`GameError::StoreUnavailable`] and [`GameError::GenerationFailed`] are
/// transient; everything else is a game-rule rejection or a caller bug and
/// must not be retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("only the host may do this")]
    NotHost,

    #[error("only this round's theme setter may do this")]
    NotSetter,

    #[error("not your turn to act in this phase")]
    NotYourTurn,

    #[error("already submitted for this round")]
    AlreadySubmitted,

    #[error("image {0} is not part of this round")]
    UnknownImage(String),

    #[error("theme must not be blank")]
    EmptyTheme,

    #[error("need at least {required} players, have {actual}")]
    InsufficientPlayers { required: usize, actual: usize },

    #[error("no session found with that room code")]
    NoSessionFound,

    #[error("multiple sessions found with that room code")]
    AmbiguousRoomCode,

    #[error("could not allocate a free room code")]
    RoomCodeTaken,

    #[error("session is full ({0} players max)")]
    SessionFull(usize),

    #[error("session has already started")]
    AlreadyStarted,

    #[error("session has ended")]
    SessionExpired,

    #[error("no such session: {0}")]
    UnknownSession(String),

    #[error("no such player: {0}")]
    UnknownPlayer(String),

    #[error("round {0} does not exist")]
    UnknownRound(u32),

    #[error("image generation failed: {0}")]
    GenerationFailed(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl GameError {
    /// Whether a caller may retry the failed operation as-is.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GameError::StoreUnavailable(_) | GameError::GenerationFailed(_)
        )
    }
}
