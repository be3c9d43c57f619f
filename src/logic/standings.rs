//! Points tables and rankings.

use crate::models::{GameMatch, Outcome, Player, PlayerId, TournamentState};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const WIN_POINTS: u32 = 3;
pub const DRAW_POINTS: u32 = 1;

/// One line of a points table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandingRow {
    pub player_id: PlayerId,
    pub name: String,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub points: u32,
    pub score_for: u32,
    pub score_against: u32,
    pub rating: f64,
}

impl StandingRow {
    fn new(player: &Player) -> Self {
        Self {
            player_id: player.id,
            name: player.name.clone(),
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            points: 0,
            score_for: 0,
            score_against: 0,
            rating: player.rating,
        }
    }

    fn record(&mut self, outcome: Outcome, scored: u32, conceded: u32) {
        self.played += 1;
        self.score_for += scored;
        self.score_against += conceded;
        match outcome {
            Outcome::Win => {
                self.wins += 1;
                self.points += WIN_POINTS;
            }
            Outcome::Draw => {
                self.draws += 1;
                self.points += DRAW_POINTS;
            }
            Outcome::Loss => self.losses += 1,
        }
    }
}

/// Points table over the given complete matches.
///
/// Ordered by points, then rating, then name. Players that appear in a match but
/// are no longer registered are left out.
pub fn points_table<'a>(
    state: &TournamentState,
    matches: impl IntoIterator<Item = &'a GameMatch>,
) -> Vec<StandingRow> {
    let mut rows: HashMap<PlayerId, StandingRow> = HashMap::new();
    for m in matches {
        for id in [m.player_1, m.player_2] {
            if let Some(p) = state.get_player(id) {
                rows.entry(id).or_insert_with(|| StandingRow::new(p));
            }
        }
        let (Some(outcome_1), Some(s1), Some(s2)) = (m.outcome_for_player_1(), m.score_1, m.score_2) else {
            continue;
        };
        if let Some(row) = rows.get_mut(&m.player_1) {
            row.record(outcome_1, s1, s2);
        }
        if let Some(row) = rows.get_mut(&m.player_2) {
            row.record(outcome_1.reversed(), s2, s1);
        }
    }
    let mut table: Vec<StandingRow> = rows.into_values().collect();
    table.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.rating.total_cmp(&a.rating))
            .then_with(|| a.name.cmp(&b.name))
    });
    table
}

/// Points tables for each group of `round`, keyed by group label.
pub fn group_standings(state: &TournamentState, round: u32) -> BTreeMap<String, Vec<StandingRow>> {
    let mut by_group: BTreeMap<String, Vec<&GameMatch>> = BTreeMap::new();
    for m in state.matches_in_round(round) {
        if let Some(group) = &m.group {
            by_group.entry(group.clone()).or_default().push(m);
        }
    }
    by_group
        .into_iter()
        .map(|(group, matches)| (group, points_table(state, matches)))
        .collect()
}

/// Players ordered by rating (highest first), ties by name.
pub fn rating_leaderboard(state: &TournamentState) -> Vec<&Player> {
    let mut players: Vec<&Player> = state.players.iter().collect();
    players.sort_by(|a, b| b.rating.total_cmp(&a.rating).then_with(|| a.name.cmp(&b.name)));
    players
}
