//! Round progression: score entry, round completion and advancement per format.

use crate::logic::fixtures::knockout_pairings;
use crate::logic::rating;
use crate::logic::standings::{group_standings, points_table};
use crate::models::{
    GameMatch, MatchId, PlayerId, RoundSummary, TournamentError, TournamentFormat,
    TournamentState, TournamentStatus,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Players that qualify from each hybrid group.
pub const QUALIFIERS_PER_GROUP: usize = 2;

/// One played match, by name, for summaries and API responses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultLine {
    pub player_1: String,
    pub player_2: String,
    pub score_1: u32,
    pub score_2: u32,
    pub winner: Option<String>,
    pub group: Option<String>,
}

/// What happened when a round was completed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundDigest {
    pub tournament: String,
    pub format: TournamentFormat,
    pub round: u32,
    pub results: Vec<ResultLine>,
    /// Players moving on to the next round (empty when the tournament ended).
    pub advancing: Vec<String>,
    /// Player given a bye in the next round.
    pub bye: Option<String>,
    pub completed: bool,
    pub champion: Option<String>,
}

/// Is `round` played as a knockout round under the current format?
pub fn is_knockout_round(state: &TournamentState, round: u32) -> bool {
    match state.settings.format {
        TournamentFormat::Knockout => true,
        TournamentFormat::RoundRobin => false,
        TournamentFormat::Hybrid => round > 1,
    }
}

fn editable_match_index(state: &TournamentState, match_id: MatchId) -> Result<usize, TournamentError> {
    if state.status != TournamentStatus::InProgress {
        return Err(TournamentError::InvalidState);
    }
    let idx = state
        .matches
        .iter()
        .position(|m| m.id == match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    let round = state.matches[idx].round;
    if round < state.current_round {
        return Err(TournamentError::RoundLocked { round });
    }
    Ok(idx)
}

/// Enter (or correct) the score of a match in the current round.
///
/// A first score applies the rating change and the win/loss/draw record once.
/// A correction reverts the previously applied change before applying the new one.
pub fn record_score(
    state: &mut TournamentState,
    match_id: MatchId,
    score_1: u32,
    score_2: u32,
) -> Result<(), TournamentError> {
    let idx = editable_match_index(state, match_id)?;
    let mut m = state.matches[idx].clone();
    if score_1 == score_2 && is_knockout_round(state, m.round) {
        return Err(TournamentError::DrawInKnockout(match_id));
    }
    for id in [m.player_1, m.player_2] {
        if state.get_player(id).is_none() {
            return Err(TournamentError::PlayerNotFound(id));
        }
    }

    rating::revert_match(state, &m);
    m.set_scores(score_1, score_2);
    rating::apply_match(state, &mut m)?;
    state.matches[idx] = m;
    Ok(())
}

/// Remove the score of a current-round match, undoing its rating change.
pub fn clear_score(state: &mut TournamentState, match_id: MatchId) -> Result<(), TournamentError> {
    let idx = editable_match_index(state, match_id)?;
    let m = state.matches[idx].clone();
    rating::revert_match(state, &m);
    state.matches[idx].clear_scores();
    Ok(())
}

/// Add a match by hand to the current round (e.g. a replay or a late entrant).
pub fn add_match(
    state: &mut TournamentState,
    player_1: PlayerId,
    player_2: PlayerId,
) -> Result<MatchId, TournamentError> {
    if state.status != TournamentStatus::InProgress {
        return Err(TournamentError::InvalidState);
    }
    if player_1 == player_2 {
        return Err(TournamentError::SamePlayer(player_1));
    }
    for id in [player_1, player_2] {
        if state.get_player(id).is_none() {
            return Err(TournamentError::PlayerNotFound(id));
        }
    }
    let m = GameMatch::new(player_1, player_2, state.current_round);
    let id = m.id;
    state.matches.push(m);
    Ok(id)
}

/// Finish the current round and set up the next one (or end the tournament).
///
/// Fails without changing anything if a match of the round has no score, or if a
/// knockout match ended level.
pub fn complete_round(state: &mut TournamentState) -> Result<RoundDigest, TournamentError> {
    if state.status != TournamentStatus::InProgress {
        return Err(TournamentError::InvalidState);
    }
    let round = state.current_round;
    let pending = state.pending_in_round(round);
    if pending > 0 {
        return Err(TournamentError::IncompleteResults { round, pending });
    }
    if is_knockout_round(state, round) {
        if let Some(m) = state.matches_in_round(round).find(|m| m.is_draw()) {
            return Err(TournamentError::DrawInKnockout(m.id));
        }
    }

    let advancing = match state.settings.format {
        TournamentFormat::RoundRobin => None,
        TournamentFormat::Hybrid if round == 1 => Some(group_qualifiers(state, round)),
        _ => Some(knockout_survivors(state, round)),
    };

    match advancing {
        None => {
            let table = points_table(state, state.matches_in_round(round));
            finish(state, table.first().map(|row| row.player_id));
        }
        Some(players) if players.len() < 2 => finish(state, players.first().copied()),
        Some(players) => {
            let next = round + 1;
            let (pairs, bye) = knockout_pairings(&players);
            let category = state.settings.category.clone();
            state.matches.extend(
                pairs
                    .into_iter()
                    .map(|(a, b)| GameMatch::new(a, b, next).with_category(category.clone())),
            );
            if let Some(bye) = bye {
                state.byes.insert(next, vec![bye]);
            }
            state.current_round = next;
            log::info!("Round {} complete; {} player(s) advance", round, players.len());
        }
    }

    round_digest(state, round).ok_or(TournamentError::InvalidState)
}

/// Digest of a finished round, rebuilt from the state.
///
/// Returns `None` for rounds that are not finished yet.
pub fn round_digest(state: &TournamentState, round: u32) -> Option<RoundDigest> {
    let finished = round >= 1
        && (round < state.current_round
            || (round == state.current_round && state.status == TournamentStatus::Completed));
    if !finished {
        return None;
    }
    let completed = state.status == TournamentStatus::Completed && round == state.current_round;
    let name = |id: &PlayerId| state.player_name(*id).to_string();

    let mut advancing: Vec<String> = Vec::new();
    let mut bye = None;
    if !completed {
        let next = round + 1;
        for m in state.matches_in_round(next) {
            advancing.push(name(&m.player_1));
            advancing.push(name(&m.player_2));
        }
        if let Some(holders) = state.byes.get(&next) {
            advancing.extend(holders.iter().map(name));
            bye = holders.first().map(name);
        }
    }

    Some(RoundDigest {
        tournament: state.settings.name.clone(),
        format: state.settings.format,
        round,
        results: result_lines(state, round),
        advancing,
        bye,
        completed,
        champion: if completed { state.champion.as_ref().map(name) } else { None },
    })
}

fn finish(state: &mut TournamentState, champion: Option<PlayerId>) {
    state.status = TournamentStatus::Completed;
    state.champion = champion;
    log::info!(
        "Tournament '{}' completed after round {}",
        state.settings.name,
        state.current_round
    );
}

/// Winners of `round` in match order, followed by that round's bye holders.
fn knockout_survivors(state: &TournamentState, round: u32) -> Vec<PlayerId> {
    let mut survivors: Vec<PlayerId> = state
        .matches_in_round(round)
        .filter_map(|m| m.winner)
        .collect();
    if let Some(byes) = state.byes.get(&round) {
        survivors.extend(byes.iter().copied().filter(|id| state.get_player(*id).is_some()));
    }
    survivors
}

/// Qualifiers of the group stage in knockout seeding order.
///
/// Group winners come first, then the runners-up arranged so that first-vs-last
/// pairing sends the winner of group `i` against the runner-up of group `i + 1`
/// (wrapping). With a single group its two qualifiers meet in the final.
fn group_qualifiers(state: &TournamentState, round: u32) -> Vec<PlayerId> {
    let tables = group_standings(state, round);
    let winners: Vec<PlayerId> = tables
        .values()
        .filter_map(|table| table.first().map(|row| row.player_id))
        .collect();
    let runners_up: Vec<Option<PlayerId>> = tables
        .values()
        .map(|table| table.get(QUALIFIERS_PER_GROUP - 1).map(|row| row.player_id))
        .collect();
    let groups = runners_up.len();
    // Slot j pairs with winner groups-1-j, so it takes the runner-up of the group after that one.
    let seeded_runners_up = (0..groups).filter_map(|j| runners_up[(groups - j) % groups]);
    winners.into_iter().chain(seeded_runners_up).collect()
}

fn result_lines(state: &TournamentState, round: u32) -> Vec<ResultLine> {
    state
        .matches_in_round(round)
        .filter_map(|m| {
            Some(ResultLine {
                player_1: state.player_name(m.player_1).to_string(),
                player_2: state.player_name(m.player_2).to_string(),
                score_1: m.score_1?,
                score_2: m.score_2?,
                winner: m.winner.map(|w| state.player_name(w).to_string()),
                group: m.group.clone(),
            })
        })
        .collect()
}

/// Store summary text for a round, replacing any earlier one.
pub fn record_round_summary(state: &mut TournamentState, round: u32, text: impl Into<String>) {
    state.round_summaries.insert(
        round,
        RoundSummary {
            text: text.into(),
            generated_at: Utc::now(),
        },
    );
}
