//! `apply_move`: the single entry point into the rules state machine
//! (§4.3). Synchronous and side-effect-free — the caller (Hub/Session via
//! the Store) is responsible for loading the current snapshot, invoking
//! this, and persisting the result atomically.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use uuid::Uuid;

use crate::error::EngineError;
use crate::types::{
    ActionMove, EngineEvent, EngineState, GameStatus, Move, MoveOutcome, Phase, Role, RulesConfig,
    VoteMove, Winner,
};

/// Applies one move to `current`, returning the next state and the events
/// to broadcast, or a rules-violation error with no state change.
///
/// `join_order` is the game's roster in join order (`GetGamePlayerIdsInJoinOrder`,
/// §4.2); it's only consulted for the bootstrap `start_game` move, since
/// `EngineState::player_ids` is empty until that move populates it.
pub fn apply_move(
    current: &EngineState,
    config: &RulesConfig,
    join_order: &[Uuid],
    actor: Uuid,
    mv: Move,
    seed: u64,
) -> Result<MoveOutcome, EngineError> {
    if current.status == GameStatus::Finished {
        return Err(EngineError::GameFinished);
    }

    let is_bootstrap = current.phase == Phase::Lobby && current.player_ids.is_empty();
    if is_bootstrap {
        return match mv {
            Move::Action(ActionMove::StartGame) => handle_start_game(current, config, join_order, seed),
            _ => Err(EngineError::WrongPhaseForMove),
        };
    }

    match mv {
        Move::Action(ActionMove::StartGame) => Err(EngineError::WrongPhaseForMove),
        Move::Action(ActionMove::ProposeTeam { team_ids }) => {
            handle_propose_team(current, actor, team_ids)
        }
        Move::Vote(vote) => handle_vote(current, config, actor, vote),
    }
}

fn handle_start_game(
    current: &EngineState,
    config: &RulesConfig,
    join_order: &[Uuid],
    seed: u64,
) -> Result<MoveOutcome, EngineError> {
    let n = join_order.len() as u32;
    if n < config.min_players || n > config.max_players {
        return Err(EngineError::InvalidPlayerCount { min: config.min_players, max: config.max_players, got: n });
    }

    let evil_count = RulesConfig::evil_count(n);
    let mut shuffled = join_order.to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let mut roles = std::collections::HashMap::with_capacity(join_order.len());
    for (i, id) in shuffled.iter().enumerate() {
        roles.insert(*id, if i < evil_count { Role::Evil } else { Role::Good });
    }

    let mut next = current.clone();
    next.status = GameStatus::InProgress;
    next.phase = Phase::TeamSelection;
    next.round_index = 1;
    next.leader_index = 0;
    next.player_ids = join_order.to_vec();
    next.roles = roles;
    next.proposed_team.clear();
    next.team_votes.clear();
    next.mission_votes.clear();
    next.mission_results.clear();
    next.reject_count = 0;
    next.winner = None;
    next.version += 1;

    let leader_id = next.leader_id().expect("player_ids non-empty after bootstrap");
    let events = vec![EngineEvent::GameStarted { phase: next.phase, round_index: next.round_index, leader_id }];

    Ok(MoveOutcome { next_state: next, events })
}

fn handle_propose_team(
    current: &EngineState,
    actor: Uuid,
    team_ids: Vec<Uuid>,
) -> Result<MoveOutcome, EngineError> {
    if current.phase != Phase::TeamSelection {
        return Err(EngineError::WrongPhaseForMove);
    }
    let leader_id = current.leader_id().ok_or(EngineError::WrongPhaseForMove)?;
    if actor != leader_id {
        return Err(EngineError::NotLeader);
    }

    let sizes = RulesConfig::team_sizes(current.player_ids.len() as u32)
        .ok_or(EngineError::InvalidPlayerCount {
            min: 5,
            max: 10,
            got: current.player_ids.len() as u32,
        })?;
    let expected = sizes[(current.round_index - 1) as usize];
    if team_ids.len() != expected {
        return Err(EngineError::InvalidTeamSize { expected, got: team_ids.len() });
    }
    if team_ids.iter().any(|id| !current.player_ids.contains(id)) {
        return Err(EngineError::UnknownPlayer);
    }

    let mut next = current.clone();
    next.phase = Phase::TeamVote;
    next.proposed_team = team_ids.clone();
    next.team_votes.clear();
    next.version += 1;

    let events = vec![EngineEvent::TeamProposed { team: team_ids, phase: next.phase }];
    Ok(MoveOutcome { next_state: next, events })
}

fn handle_vote(
    current: &EngineState,
    config: &RulesConfig,
    actor: Uuid,
    vote: VoteMove,
) -> Result<MoveOutcome, EngineError> {
    match current.phase {
        Phase::TeamVote => handle_team_vote(current, actor, vote),
        Phase::MissionVote => handle_mission_vote(current, config, actor, vote),
        _ => Err(EngineError::WrongPhaseForMove),
    }
}

fn handle_team_vote(current: &EngineState, actor: Uuid, vote: VoteMove) -> Result<MoveOutcome, EngineError> {
    let approved = match (vote.approved, vote.success) {
        (Some(approved), None) => approved,
        _ => return Err(EngineError::InvalidPayload("team vote requires `approved`".into())),
    };
    if !current.player_ids.contains(&actor) {
        return Err(EngineError::UnknownPlayer);
    }
    if current.team_votes.contains_key(&actor) {
        return Err(EngineError::AlreadyVoted);
    }

    let mut next = current.clone();
    next.version += 1;
    next.team_votes.insert(actor, approved);

    let mut events = Vec::new();
    if next.team_votes.len() == next.player_ids.len() {
        let approve_count = next.team_votes.values().filter(|&&v| v).count();
        if approve_count * 2 > next.player_ids.len() {
            next.phase = Phase::MissionVote;
            next.team_votes.clear();
            events.push(EngineEvent::TeamApproved { phase: next.phase });
        } else {
            next.reject_count += 1;
            next.leader_index = (next.leader_index + 1) % next.player_ids.len();
            next.phase = Phase::TeamSelection;
            next.proposed_team.clear();
            next.team_votes.clear();
            let leader_id = next.leader_id().expect("player_ids non-empty");
            events.push(EngineEvent::TeamRejected {
                phase: next.phase,
                reject_count: next.reject_count,
                leader_id,
            });
        }
    } else {
        events.push(EngineEvent::VoteRecorded { player_id: actor });
    }

    Ok(MoveOutcome { next_state: next, events })
}

fn handle_mission_vote(
    current: &EngineState,
    config: &RulesConfig,
    actor: Uuid,
    vote: VoteMove,
) -> Result<MoveOutcome, EngineError> {
    let success = match (vote.approved, vote.success) {
        (None, Some(success)) => success,
        _ => return Err(EngineError::InvalidPayload("mission vote requires `success`".into())),
    };
    if !current.proposed_team.contains(&actor) {
        return Err(EngineError::ActorNotOnTeam);
    }
    if current.mission_votes.contains_key(&actor) {
        return Err(EngineError::AlreadyVoted);
    }

    let mut next = current.clone();
    next.version += 1;
    next.mission_votes.insert(actor, success);

    let mut events = Vec::new();
    if next.mission_votes.len() == next.proposed_team.len() {
        let result = if next.mission_votes.values().any(|&v| !v) {
            crate::types::MissionResult::Fail
        } else {
            crate::types::MissionResult::Success
        };
        next.mission_results.push(result);
        next.proposed_team.clear();
        next.mission_votes.clear();

        let fails = next
            .mission_results
            .iter()
            .filter(|r| **r == crate::types::MissionResult::Fail)
            .count();
        let successes = next
            .mission_results
            .iter()
            .filter(|r| **r == crate::types::MissionResult::Success)
            .count();

        if fails >= config.fail_threshold {
            next.status = GameStatus::Finished;
            next.phase = Phase::Finished;
            next.winner = Some(Winner::Evil);
            events.push(EngineEvent::GameEnded { winner: Winner::Evil, mission_result: result });
        } else if successes >= config.success_threshold {
            next.status = GameStatus::Finished;
            next.phase = Phase::Finished;
            next.winner = Some(Winner::Good);
            events.push(EngineEvent::GameEnded { winner: Winner::Good, mission_result: result });
        } else {
            next.round_index += 1;
            next.leader_index = (next.leader_index + 1) % next.player_ids.len();
            next.reject_count = 0;
            next.phase = Phase::TeamSelection;
            let leader_id = next.leader_id().expect("player_ids non-empty");
            events.push(EngineEvent::MissionResolved {
                result,
                round_index: next.round_index,
                leader_id,
                phase: next.phase,
            });
        }
    } else {
        events.push(EngineEvent::VoteRecorded { player_id: actor });
    }

    Ok(MoveOutcome { next_state: next, events })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MissionResult;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn start(players: &[Uuid], seed: u64) -> EngineState {
        let lobby = EngineState::lobby(Uuid::new_v4());
        let outcome =
            apply_move(&lobby, &RulesConfig::default(), players, players[0], Move::Action(ActionMove::StartGame), seed)
                .unwrap();
        outcome.next_state
    }

    #[test]
    fn start_game_rejects_wrong_player_count() {
        let players = ids(4);
        let lobby = EngineState::lobby(Uuid::new_v4());
        let err = apply_move(
            &lobby,
            &RulesConfig::default(),
            &players,
            players[0],
            Move::Action(ActionMove::StartGame),
            1,
        )
        .unwrap_err();
        assert_eq!(err, EngineError::InvalidPlayerCount { min: 5, max: 10, got: 4 });
    }

    #[test]
    fn start_game_boundaries_succeed() {
        for n in [5usize, 10] {
            let players = ids(n);
            let lobby = EngineState::lobby(Uuid::new_v4());
            let outcome = apply_move(
                &lobby,
                &RulesConfig::default(),
                &players,
                players[0],
                Move::Action(ActionMove::StartGame),
                7,
            )
            .unwrap();
            assert_eq!(outcome.next_state.phase, Phase::TeamSelection);
            assert_eq!(outcome.next_state.round_index, 1);
            let evil = outcome.next_state.roles.values().filter(|r| **r == Role::Evil).count();
            assert_eq!(evil, RulesConfig::evil_count(n as u32));
        }
    }

    #[test]
    fn scenario_two_rounds_succeed_third_fails() {
        let players = ids(5);
        let state = start(&players, 42);
        assert_eq!(state.phase, Phase::TeamSelection);
        assert_eq!(state.round_index, 1);
        let leader = state.leader_id().unwrap();
        assert_eq!(leader, players[0]);

        // round 1: team size 2
        let team = vec![players[0], players[1]];
        let out = apply_move(
            &state,
            &RulesConfig::default(),
            &players,
            leader,
            Move::Action(ActionMove::ProposeTeam { team_ids: team.clone() }),
            0,
        )
        .unwrap();
        let mut state = out.next_state;
        assert_eq!(state.phase, Phase::TeamVote);

        for &p in &players {
            let out =
                apply_move(&state, &RulesConfig::default(), &players, p, Move::Vote(VoteMove { approved: Some(true), success: None }), 0)
                    .unwrap();
            state = out.next_state;
        }
        assert_eq!(state.phase, Phase::MissionVote);

        for &p in &team {
            let out = apply_move(
                &state,
                &RulesConfig::default(),
                &players,
                p,
                Move::Vote(VoteMove { approved: None, success: Some(true) }),
                0,
            )
            .unwrap();
            state = out.next_state;
        }
        assert_eq!(state.mission_results, vec![MissionResult::Success]);
        assert_eq!(state.round_index, 2);
        assert_eq!(state.leader_id().unwrap(), players[1]);

        // round 2: team size 3, all succeed
        let team = vec![players[1], players[2], players[3]];
        let out = apply_move(
            &state,
            &RulesConfig::default(),
            &players,
            players[1],
            Move::Action(ActionMove::ProposeTeam { team_ids: team.clone() }),
            0,
        )
        .unwrap();
        state = out.next_state;
        for &p in &players {
            let out =
                apply_move(&state, &RulesConfig::default(), &players, p, Move::Vote(VoteMove { approved: Some(true), success: None }), 0)
                    .unwrap();
            state = out.next_state;
        }
        for &p in &team {
            let out = apply_move(
                &state,
                &RulesConfig::default(),
                &players,
                p,
                Move::Vote(VoteMove { approved: None, success: Some(true) }),
                0,
            )
            .unwrap();
            state = out.next_state;
        }
        assert_eq!(state.mission_results, vec![MissionResult::Success, MissionResult::Success]);
        assert_eq!(state.round_index, 3);
        assert_eq!(state.leader_id().unwrap(), players[2]);

        // round 3: team size 2, one fail
        let team = vec![players[2], players[3]];
        let out = apply_move(
            &state,
            &RulesConfig::default(),
            &players,
            players[2],
            Move::Action(ActionMove::ProposeTeam { team_ids: team.clone() }),
            0,
        )
        .unwrap();
        state = out.next_state;
        for &p in &players {
            let out =
                apply_move(&state, &RulesConfig::default(), &players, p, Move::Vote(VoteMove { approved: Some(true), success: None }), 0)
                    .unwrap();
            state = out.next_state;
        }
        let out = apply_move(
            &state,
            &RulesConfig::default(),
            &players,
            players[2],
            Move::Vote(VoteMove { approved: None, success: Some(false) }),
            0,
        )
        .unwrap();
        state = out.next_state;
        let out = apply_move(
            &state,
            &RulesConfig::default(),
            &players,
            players[3],
            Move::Vote(VoteMove { approved: None, success: Some(true) }),
            0,
        )
        .unwrap();
        state = out.next_state;

        assert_eq!(
            state.mission_results,
            vec![MissionResult::Success, MissionResult::Success, MissionResult::Fail]
        );
        assert_eq!(state.round_index, 4);
    }

    #[test]
    fn non_leader_cannot_propose_team() {
        let players = ids(5);
        let state = start(&players, 1);
        let err = apply_move(
            &state,
            &RulesConfig::default(),
            &players,
            players[1],
            Move::Action(ActionMove::ProposeTeam { team_ids: vec![players[0], players[1]] }),
            0,
        )
        .unwrap_err();
        assert_eq!(err, EngineError::NotLeader);
    }

    #[test]
    fn wrong_team_size_is_rejected() {
        let players = ids(5);
        let state = start(&players, 1);
        let leader = state.leader_id().unwrap();
        let err = apply_move(
            &state,
            &RulesConfig::default(),
            &players,
            leader,
            Move::Action(ActionMove::ProposeTeam { team_ids: vec![players[0], players[1], players[2]] }),
            0,
        )
        .unwrap_err();
        assert_eq!(err, EngineError::InvalidTeamSize { expected: 2, got: 3 });
    }

    #[test]
    fn double_vote_is_rejected() {
        let players = ids(5);
        let state = start(&players, 1);
        let leader = state.leader_id().unwrap();
        let out = apply_move(
            &state,
            &RulesConfig::default(),
            &players,
            leader,
            Move::Action(ActionMove::ProposeTeam { team_ids: vec![players[0], players[1]] }),
            0,
        )
        .unwrap();
        let state = out.next_state;

        let out = apply_move(
            &state,
            &RulesConfig::default(),
            &players,
            players[0],
            Move::Vote(VoteMove { approved: Some(true), success: None }),
            0,
        )
        .unwrap();
        let state = out.next_state;

        let err = apply_move(
            &state,
            &RulesConfig::default(),
            &players,
            players[0],
            Move::Vote(VoteMove { approved: Some(false), success: None }),
            0,
        )
        .unwrap_err();
        assert_eq!(err, EngineError::AlreadyVoted);
        assert_eq!(state.team_votes.get(&players[0]), Some(&true));
    }

    #[test]
    fn rejection_rotates_leader() {
        let players = ids(5);
        let state = start(&players, 1);
        let leader = state.leader_id().unwrap();
        assert_eq!(leader, players[0]);

        let out = apply_move(
            &state,
            &RulesConfig::default(),
            &players,
            leader,
            Move::Action(ActionMove::ProposeTeam { team_ids: vec![players[0], players[1]] }),
            0,
        )
        .unwrap();
        let mut state = out.next_state;

        // P1,P2,P3 reject, P4,P5 approve
        let votes = [
            (players[0], false),
            (players[1], false),
            (players[2], false),
            (players[3], true),
            (players[4], true),
        ];
        let mut last_events = Vec::new();
        for (p, approved) in votes {
            let out = apply_move(
                &state,
                &RulesConfig::default(),
                &players,
                p,
                Move::Vote(VoteMove { approved: Some(approved), success: None }),
                0,
            )
            .unwrap();
            state = out.next_state;
            last_events = out.events;
        }

        assert_eq!(state.phase, Phase::TeamSelection);
        assert_eq!(state.reject_count, 1);
        assert_eq!(state.leader_index, 1);
        assert_eq!(state.leader_id().unwrap(), players[1]);
        assert!(matches!(last_events[0], EngineEvent::TeamRejected { reject_count: 1, .. }));
    }

    #[test]
    fn move_after_finished_errors_and_does_not_mutate() {
        let mut state = EngineState::lobby(Uuid::new_v4());
        state.status = GameStatus::Finished;
        state.phase = Phase::Finished;
        state.winner = Some(Winner::Good);
        let before = state.clone();

        let err = apply_move(
            &state,
            &RulesConfig::default(),
            &[],
            Uuid::new_v4(),
            Move::Vote(VoteMove { approved: Some(true), success: None }),
            0,
        )
        .unwrap_err();
        assert_eq!(err, EngineError::GameFinished);
        assert_eq!(state, before);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let players = ids(5);
        let state = start(&players, 3);
        let json = serde_json::to_string(&state).unwrap();
        let decoded: EngineState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, decoded);
    }

    #[test]
    fn success_threshold_triggers_good_win_with_rounds_remaining() {
        let players = ids(5);
        let mut state = start(&players, 9);
        for round in 0..3 {
            let leader = state.leader_id().unwrap();
            let size = RulesConfig::team_sizes(5).unwrap()[round];
            let team: Vec<Uuid> = players.iter().take(size).copied().collect();
            let out = apply_move(
                &state,
                &RulesConfig::default(),
                &players,
                leader,
                Move::Action(ActionMove::ProposeTeam { team_ids: team.clone() }),
                0,
            )
            .unwrap();
            state = out.next_state;
            for &p in &players {
                let out = apply_move(
                    &state,
                    &RulesConfig::default(),
                    &players,
                    p,
                    Move::Vote(VoteMove { approved: Some(true), success: None }),
                    0,
                )
                .unwrap();
                state = out.next_state;
            }
            for &p in &team {
                let out = apply_move(
                    &state,
                    &RulesConfig::default(),
                    &players,
                    p,
                    Move::Vote(VoteMove { approved: None, success: Some(true) }),
                    0,
                )
                .unwrap();
                state = out.next_state;
            }
        }
        assert_eq!(state.status, GameStatus::Finished);
        assert_eq!(state.winner, Some(Winner::Good));
        assert_eq!(state.mission_results.len(), 3);
    }
}
