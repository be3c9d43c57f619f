//! Tournament settings, TournamentState aggregate and TournamentError.

use crate::models::game::{GameMatch, MatchId};
use crate::models::player::{Player, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors that can occur during tournament operations.
#[derive(Clone, Debug, PartialEq)]
pub enum TournamentError {
    /// A required field is empty.
    MissingField(&'static str),
    /// A player with this name already exists (names are unique, case-insensitive).
    DuplicatePlayerName(String),
    /// Player id not in the registry.
    PlayerNotFound(PlayerId),
    /// Match id not in the tournament.
    MatchNotFound(MatchId),
    /// Not enough players for the requested operation.
    NotEnoughPlayers { required: usize, available: usize },
    /// A match cannot pit a player against themselves.
    SamePlayer(PlayerId),
    /// Tournament is not in a state that allows this action.
    InvalidState,
    /// Settings are frozen once the tournament has started.
    AlreadyStarted,
    /// Not all matches of the round have both scores.
    IncompleteResults { round: u32, pending: usize },
    /// Knockout matches need a winner.
    DrawInKnockout(MatchId),
    /// Matches of finished rounds can no longer be re-scored.
    RoundLocked { round: u32 },
    /// No players registered in this category.
    UnknownCategory(String),
    /// No cached fixtures for this key.
    NoFixtures(String),
    /// Group size must be at least 2.
    InvalidGroupSize(usize),
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::MissingField(field) => write!(f, "Missing required field: {}", field),
            TournamentError::DuplicatePlayerName(name) => {
                write!(f, "A player named '{}' already exists", name)
            }
            TournamentError::PlayerNotFound(_) => write!(f, "Player not found"),
            TournamentError::MatchNotFound(_) => write!(f, "Match not found"),
            TournamentError::NotEnoughPlayers { required, available } => write!(
                f,
                "Need at least {} players (have {})",
                required, available
            ),
            TournamentError::SamePlayer(_) => write!(f, "A player cannot play against themselves"),
            TournamentError::InvalidState => write!(f, "Invalid state for this action"),
            TournamentError::AlreadyStarted => write!(f, "Tournament has already started"),
            TournamentError::IncompleteResults { round, pending } => write!(
                f,
                "Round {} still has {} match(es) without a score",
                round, pending
            ),
            TournamentError::DrawInKnockout(_) => {
                write!(f, "Knockout matches cannot end in a draw")
            }
            TournamentError::RoundLocked { round } => {
                write!(f, "Round {} is finished; its scores are locked", round)
            }
            TournamentError::UnknownCategory(category) => {
                write!(f, "No players registered in category '{}'", category)
            }
            TournamentError::NoFixtures(key) => write!(f, "No fixtures generated for '{}'", key),
            TournamentError::InvalidGroupSize(size) => {
                write!(f, "Group size must be at least 2 (got {})", size)
            }
        }
    }
}

impl std::error::Error for TournamentError {}

/// How the tournament is played.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    /// Single elimination.
    #[default]
    Knockout,
    /// Everyone plays everyone once (per category).
    RoundRobin,
    /// Group-stage round robin, then knockout among the top two of each group.
    Hybrid,
}

/// How players are spread over hybrid groups.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSeeding {
    /// Sorted by rating and dealt in snake order.
    #[default]
    Snake,
    /// Shuffled before dealing.
    Random,
}

/// Lifecycle of the tournament.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Round counter is 0; settings can be edited.
    #[default]
    NotStarted,
    /// A round is being played.
    InProgress,
    /// Champion decided (or the round robin is over).
    Completed,
}

/// Settings chosen before the tournament starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentSettings {
    #[serde(default)]
    pub name: String,
    /// Planned number of rounds; filled in at start when left at 0.
    #[serde(default)]
    pub total_rounds: u32,
    /// Participants. Empty means every registered player (after category filter).
    #[serde(default)]
    pub selected_players: Vec<PlayerId>,
    #[serde(default)]
    pub format: TournamentFormat,
    /// Free tag, e.g. "singles" or "doubles".
    #[serde(default = "default_tournament_type")]
    pub tournament_type: String,
    /// Minimum players per hybrid group.
    #[serde(default)]
    pub hybrid_min_group_size: Option<usize>,
    #[serde(default)]
    pub group_seeding: GroupSeeding,
    /// Restrict participants to one category.
    #[serde(default)]
    pub category: Option<String>,
}

fn default_tournament_type() -> String {
    "singles".to_string()
}

impl Default for TournamentSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            total_rounds: 0,
            selected_players: Vec::new(),
            format: TournamentFormat::default(),
            tournament_type: default_tournament_type(),
            hybrid_min_group_size: None,
            group_seeding: GroupSeeding::default(),
            category: None,
        }
    }
}

/// Text produced for a finished round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub text: String,
    pub generated_at: DateTime<Utc>,
}

/// A pairing held in a fixture cache before it is published as a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixturePairing {
    pub player_1: PlayerId,
    pub player_2: PlayerId,
    /// Circle-method round the pairing belongs to (1-based).
    pub slot: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

impl FixturePairing {
    pub fn involves(&self, player: PlayerId) -> bool {
        self.player_1 == player || self.player_2 == player
    }
}

/// Aggregate root: registry, matches, progression and caches.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TournamentState {
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub matches: Vec<GameMatch>,
    /// 0 before the tournament starts.
    #[serde(default)]
    pub current_round: u32,
    #[serde(default)]
    pub status: TournamentStatus,
    #[serde(default)]
    pub settings: TournamentSettings,
    #[serde(default)]
    pub round_summaries: BTreeMap<u32, RoundSummary>,
    /// Players that advance without playing, per round.
    #[serde(default)]
    pub byes: BTreeMap<u32, Vec<PlayerId>>,
    #[serde(default)]
    pub champion: Option<PlayerId>,
    /// Generated round-robin fixtures keyed by category.
    #[serde(default)]
    pub generated_fixtures: BTreeMap<String, Vec<FixturePairing>>,
    /// Fixtures already turned into matches, keyed by category.
    #[serde(default)]
    pub published_fixtures: BTreeMap<String, Vec<FixturePairing>>,
}

impl TournamentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn get_player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn find_player_by_name(&self, name: &str) -> Option<&Player> {
        let name = name.trim();
        self.players.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Display name for a player id, or a marker for deleted players.
    pub fn player_name(&self, id: PlayerId) -> &str {
        self.get_player(id).map(|p| p.name.as_str()).unwrap_or("(unknown)")
    }

    pub fn get_match(&self, id: MatchId) -> Option<&GameMatch> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn matches_in_round(&self, round: u32) -> impl Iterator<Item = &GameMatch> {
        self.matches.iter().filter(move |m| m.round == round)
    }

    /// Number of matches in `round` still missing a score.
    pub fn pending_in_round(&self, round: u32) -> usize {
        self.matches_in_round(round).filter(|m| !m.is_complete).count()
    }

    pub fn is_started(&self) -> bool {
        self.status != TournamentStatus::NotStarted
    }

    /// Sorted list of categories present in the registry.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self.players.iter().map(|p| p.category.clone()).collect();
        categories.sort();
        categories.dedup();
        categories
    }
}
