//! Move-level errors from [`crate::apply_move`].
//!
//! All of these are rules violations in §7's taxonomy: reported to the
//! acting session only, never broadcast, never logged as server errors.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("game already finished")]
    GameFinished,
    #[error("move not valid in the current phase")]
    WrongPhaseForMove,
    #[error("only the leader can propose a team")]
    NotLeader,
    #[error("team must have exactly {expected} members for this round")]
    InvalidTeamSize { expected: usize, got: usize },
    #[error("team contains a player not in this game")]
    UnknownPlayer,
    #[error("already voted")]
    AlreadyVoted,
    #[error("actor is not on the proposed team")]
    ActorNotOnTeam,
    #[error("player count must be between {min} and {max}, got {got}")]
    InvalidPlayerCount { min: u32, max: u32, got: u32 },
    #[error("malformed move payload: {0}")]
    InvalidPayload(String),
}
