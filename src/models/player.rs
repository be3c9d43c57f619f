//! Player data and match outcomes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player (used in matches and lookups).
pub type PlayerId = Uuid;

/// Rating given to players registered without one.
pub const DEFAULT_RATING: f64 = 1500.0;

/// A registered player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Contact handle (mobile number).
    pub mobile: String,
    #[serde(default = "default_rating")]
    pub rating: f64,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub draws: u32,
    /// Category tag, e.g. "30+" or "Open".
    #[serde(default)]
    pub category: String,
    /// Opaque image reference (URL or file name).
    #[serde(default)]
    pub image: Option<String>,
}

fn default_rating() -> f64 {
    DEFAULT_RATING
}

impl Player {
    /// Create a new player with a fresh record at the default rating.
    pub fn new(name: impl Into<String>, mobile: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            mobile: mobile.into(),
            rating: DEFAULT_RATING,
            wins: 0,
            losses: 0,
            draws: 0,
            category: category.into(),
            image: None,
        }
    }

    /// Same player with a given starting rating.
    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    pub fn matches_played(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    pub fn add_win(&mut self) {
        self.wins += 1;
    }

    pub fn add_loss(&mut self) {
        self.losses += 1;
    }

    pub fn add_draw(&mut self) {
        self.draws += 1;
    }

    /// Undo a previously recorded result (used when a score is corrected).
    pub fn remove_result(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins = self.wins.saturating_sub(1),
            Outcome::Loss => self.losses = self.losses.saturating_sub(1),
            Outcome::Draw => self.draws = self.draws.saturating_sub(1),
        }
    }

    /// Record a result from this player's point of view.
    pub fn record_result(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.add_win(),
            Outcome::Loss => self.add_loss(),
            Outcome::Draw => self.add_draw(),
        }
    }
}

/// Result of a match from one player's point of view.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// Actual score used by the rating formula.
    pub fn actual_score(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Draw => 0.5,
            Outcome::Loss => 0.0,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Outcome::Win => Outcome::Loss,
            Outcome::Loss => Outcome::Win,
            Outcome::Draw => Outcome::Draw,
        }
    }
}
