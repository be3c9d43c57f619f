//! Tournament business logic: registry, setup, fixtures, ratings, progression.

pub mod fixtures;
pub mod progression;
pub mod rating;
pub mod registry;
mod setup;
pub mod standings;

pub use fixtures::{
    clear_fixtures, generate_all_category_fixtures, generate_category_fixtures,
    knockout_pairings, partition_groups, publish_custom_fixtures, publish_fixtures,
    round_robin_rounds, Group,
};
pub use progression::{
    add_match, clear_score, complete_round, is_knockout_round, record_round_summary,
    record_score, round_digest, ResultLine, RoundDigest,
};
pub use registry::{
    add_player, add_players_bulk, delete_player, update_player, ImportReport, NewPlayer,
    PlayerUpdate,
};
pub use setup::{participants, reset_tournament, start_tournament, update_settings};
pub use standings::{group_standings, points_table, rating_leaderboard, StandingRow};
