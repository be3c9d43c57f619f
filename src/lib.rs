//! Racquet league tournament manager: library with models, business logic, storage
//! and the round-summary client.

pub mod config;
pub mod csv_io;
pub mod logic;
pub mod models;
pub mod store;
pub mod summary;

pub use config::{AppConfig, SummaryConfig};
pub use logic::{
    add_match, add_player, add_players_bulk, clear_score, complete_round, delete_player,
    reset_tournament, record_round_summary, record_score, start_tournament, update_player,
    update_settings, ImportReport, NewPlayer, PlayerUpdate, RoundDigest,
};
pub use models::{
    FixturePairing, GameMatch, GroupSeeding, MatchId, Outcome, Player, PlayerId,
    RoundSummary, TournamentError, TournamentFormat, TournamentSettings, TournamentState,
    TournamentStatus, DEFAULT_RATING,
};
pub use store::{
    Action, ActionOutcome, JsonDirStorage, MemoryStorage, Section, StateStorage, Store, StoreError,
};
pub use summary::{HttpSummarizer, RoundSummarizer, SummaryError, SUMMARY_FAILURE_PLACEHOLDER};
