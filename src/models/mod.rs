//! Data structures for the league: players, matches, tournament state.

mod game;
mod player;
mod tournament;

pub use game::{GameMatch, MatchId, RatingDelta};
pub use player::{Outcome, Player, PlayerId, DEFAULT_RATING};
pub use tournament::{
    FixturePairing, GroupSeeding, RoundSummary, TournamentError, TournamentFormat,
    TournamentSettings, TournamentState, TournamentStatus,
};
