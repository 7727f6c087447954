//! Avalon rules engine: a synchronous, side-effect-free state machine
//! (§4.3). `apply_move` is the only way to transition an [`EngineState`];
//! everything else in this crate is types consumed by that function.

mod engine;
mod error;
mod types;

pub use engine::apply_move;
pub use error::EngineError;
pub use types::{
    ActionMove, EngineEvent, EngineState, GameStatus, MissionResult, Move, MoveOutcome, Phase,
    Role, RulesConfig, TeamSizes, VoteMove, Winner,
};
