//! Match (game) between two players, with scores and the rating change it caused.

use crate::models::player::{Outcome, PlayerId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Rating change applied to both players when the match was scored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingDelta {
    pub player_1: f64,
    pub player_2: f64,
}

/// A single match between two players.
///
/// `is_complete` is true iff both scores are set; `winner` is set iff the match
/// is complete and the scores differ.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    pub player_1: PlayerId,
    pub player_2: PlayerId,
    #[serde(default)]
    pub score_1: Option<u32>,
    #[serde(default)]
    pub score_2: Option<u32>,
    #[serde(default)]
    pub winner: Option<PlayerId>,
    pub round: u32,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    /// Present once the match has been scored and ratings were adjusted.
    #[serde(default)]
    pub rating_delta: Option<RatingDelta>,
}

impl GameMatch {
    pub fn new(player_1: PlayerId, player_2: PlayerId, round: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_1,
            player_2,
            score_1: None,
            score_2: None,
            winner: None,
            round,
            is_complete: false,
            category: None,
            group: None,
            rating_delta: None,
        }
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    pub fn with_group(mut self, group: Option<String>) -> Self {
        self.group = group;
        self
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.player_1 == player || self.player_2 == player
    }

    /// The other player in this match, if `player` takes part.
    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        if self.player_1 == player {
            Some(self.player_2)
        } else if self.player_2 == player {
            Some(self.player_1)
        } else {
            None
        }
    }

    /// Set both scores and derive completion and winner.
    pub fn set_scores(&mut self, score_1: u32, score_2: u32) {
        self.score_1 = Some(score_1);
        self.score_2 = Some(score_2);
        self.is_complete = true;
        self.winner = if score_1 > score_2 {
            Some(self.player_1)
        } else if score_2 > score_1 {
            Some(self.player_2)
        } else {
            None
        };
    }

    /// Remove scores; the match becomes unplayed again.
    pub fn clear_scores(&mut self) {
        self.score_1 = None;
        self.score_2 = None;
        self.is_complete = false;
        self.winner = None;
        self.rating_delta = None;
    }

    /// Outcome for player 1, once complete.
    pub fn outcome_for_player_1(&self) -> Option<Outcome> {
        match (self.score_1, self.score_2) {
            (Some(a), Some(b)) if a > b => Some(Outcome::Win),
            (Some(a), Some(b)) if a < b => Some(Outcome::Loss),
            (Some(_), Some(_)) => Some(Outcome::Draw),
            _ => None,
        }
    }

    pub fn is_draw(&self) -> bool {
        self.is_complete && self.winner.is_none()
    }
}
