//! Engine state, rules configuration, and move types (§4.3).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    InProgress,
    Finished,
}

/// The engine's current substate. `MissionResolution` is part of the
/// declared phase set (§4.3) but the transition algorithm never leaves the
/// engine resting there — resolution happens atomically within the
/// `mission_vote` move and the next phase (`team_selection` or `finished`)
/// is set immediately. Kept for forward compatibility with rule variants
/// that might want a distinct resolution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Lobby,
    TeamSelection,
    TeamVote,
    MissionVote,
    MissionResolution,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Good,
    Evil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionResult {
    Success,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Good,
    Evil,
}

/// Full engine state, serialized verbatim as the snapshot payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub game_id: Uuid,
    pub status: GameStatus,
    pub phase: Phase,
    pub round_index: u32,
    pub leader_index: usize,
    pub player_ids: Vec<Uuid>,
    pub roles: HashMap<Uuid, Role>,
    pub proposed_team: Vec<Uuid>,
    pub team_votes: HashMap<Uuid, bool>,
    pub mission_votes: HashMap<Uuid, bool>,
    pub mission_results: Vec<MissionResult>,
    pub reject_count: u32,
    pub winner: Option<Winner>,
    pub version: i64,
}

impl EngineState {
    /// The lobby state written as a game's v1 snapshot (§3 lifecycles).
    pub fn lobby(game_id: Uuid) -> Self {
        Self {
            game_id,
            status: GameStatus::Waiting,
            phase: Phase::Lobby,
            round_index: 0,
            leader_index: 0,
            player_ids: Vec::new(),
            roles: HashMap::new(),
            proposed_team: Vec::new(),
            team_votes: HashMap::new(),
            mission_votes: HashMap::new(),
            mission_results: Vec::new(),
            reject_count: 0,
            winner: None,
            version: 1,
        }
    }

    pub fn leader_id(&self) -> Option<Uuid> {
        self.player_ids.get(self.leader_index).copied()
    }
}

/// Team sizes indexed by `round_index - 1`, for a given player count.
/// Default preset per §4.3.
pub type TeamSizes = [usize; 5];

/// Rules configuration provided to the engine at construction. The default
/// preset behaves exactly as specified; fields are public so a variant
/// ruleset can override any of them.
#[derive(Debug, Clone)]
pub struct RulesConfig {
    pub min_players: u32,
    pub max_players: u32,
    pub fail_threshold: usize,
    pub success_threshold: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self { min_players: 5, max_players: 10, fail_threshold: 3, success_threshold: 3 }
    }
}

impl RulesConfig {
    /// `team_sizes[round_index - 1]` for a table of `n` players (§4.3).
    pub fn team_sizes(n: u32) -> Option<TeamSizes> {
        match n {
            5 => Some([2, 3, 2, 3, 3]),
            6 => Some([2, 3, 4, 3, 4]),
            7 => Some([2, 3, 3, 4, 4]),
            8 | 9 | 10 => Some([3, 4, 4, 5, 5]),
            _ => None,
        }
    }

    /// Number of evil players for a table of `n` (§4.3).
    pub fn evil_count(n: u32) -> usize {
        if n <= 6 { 2 } else { 3 }
    }
}

/// Mirrors the wire `vote` payload shape (§6): whichever of `approved` /
/// `success` is populated depends on the current phase, not on the move
/// itself — the engine resolves that ambiguity against `EngineState::phase`
/// rather than requiring the caller to pre-classify it.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoteMove {
    pub approved: Option<bool>,
    pub success: Option<bool>,
}

#[derive(Debug, Clone)]
pub enum ActionMove {
    StartGame,
    ProposeTeam { team_ids: Vec<Uuid> },
}

#[derive(Debug, Clone)]
pub enum Move {
    Vote(VoteMove),
    Action(ActionMove),
}

/// Events the engine emits for the Hub to broadcast (§4.3, §6). Carries
/// structured fields rather than a pre-rendered JSON blob so the boundary
/// between engine and wire format stays an explicit, typed contract (§9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    GameStarted { phase: Phase, round_index: u32, leader_id: Uuid },
    TeamProposed { team: Vec<Uuid>, phase: Phase },
    VoteRecorded { player_id: Uuid },
    TeamApproved { phase: Phase },
    TeamRejected { phase: Phase, reject_count: u32, leader_id: Uuid },
    MissionResolved { result: MissionResult, round_index: u32, leader_id: Uuid, phase: Phase },
    GameEnded { winner: Winner, mission_result: MissionResult },
}

pub struct MoveOutcome {
    pub next_state: EngineState,
    pub events: Vec<EngineEvent>,
}
