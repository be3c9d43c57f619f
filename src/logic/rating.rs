//! Elo-style pairwise rating adjustment.

use crate::models::{GameMatch, Outcome, RatingDelta, TournamentError, TournamentState};

/// Maximum rating change per match.
pub const K_FACTOR: f64 = 32.0;

/// Expected score of a player rated `rating` against `opponent`.
pub fn expected_score(rating: f64, opponent: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent - rating) / 400.0))
}

/// Rating changes for both players given player 1's outcome.
pub fn elo_delta(rating_1: f64, rating_2: f64, outcome_1: Outcome) -> RatingDelta {
    let expected_1 = expected_score(rating_1, rating_2);
    let expected_2 = expected_score(rating_2, rating_1);
    RatingDelta {
        player_1: K_FACTOR * (outcome_1.actual_score() - expected_1),
        player_2: K_FACTOR * (outcome_1.reversed().actual_score() - expected_2),
    }
}

/// Apply a freshly completed match to both players: record and rating.
///
/// Stores the applied delta on the match so it can be reverted later.
pub(crate) fn apply_match(state: &mut TournamentState, m: &mut GameMatch) -> Result<(), TournamentError> {
    let outcome_1 = m.outcome_for_player_1().ok_or(TournamentError::InvalidState)?;
    let rating_1 = state
        .get_player(m.player_1)
        .ok_or(TournamentError::PlayerNotFound(m.player_1))?
        .rating;
    let rating_2 = state
        .get_player(m.player_2)
        .ok_or(TournamentError::PlayerNotFound(m.player_2))?
        .rating;
    let delta = elo_delta(rating_1, rating_2, outcome_1);

    if let Some(p) = state.get_player_mut(m.player_1) {
        p.rating += delta.player_1;
        p.record_result(outcome_1);
    }
    if let Some(p) = state.get_player_mut(m.player_2) {
        p.rating += delta.player_2;
        p.record_result(outcome_1.reversed());
    }
    m.rating_delta = Some(delta);
    Ok(())
}

/// Undo what `apply_match` did for this match, if anything.
pub(crate) fn revert_match(state: &mut TournamentState, m: &GameMatch) {
    let (Some(delta), Some(outcome_1)) = (m.rating_delta, m.outcome_for_player_1()) else {
        return;
    };
    if let Some(p) = state.get_player_mut(m.player_1) {
        p.rating -= delta.player_1;
        p.remove_result(outcome_1);
    }
    if let Some(p) = state.get_player_mut(m.player_2) {
        p.rating -= delta.player_2;
        p.remove_result(outcome_1.reversed());
    }
}
