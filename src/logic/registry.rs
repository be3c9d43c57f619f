//! Player registry: add, edit, delete (with cascade) and bulk import.

use crate::logic::progression::is_knockout_round;
use crate::models::{Player, PlayerId, TournamentError, TournamentState, TournamentStatus};
use serde::{Deserialize, Serialize};

/// Registration form for a single player.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewPlayer {
    pub name: String,
    pub mobile: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Partial edit of a player; `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    /// Empty string clears the image.
    #[serde(default)]
    pub image: Option<String>,
}

/// Outcome of a bulk operation: what was added, what was skipped and why.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub added: usize,
    pub warnings: Vec<String>,
}

impl ImportReport {
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.warnings.push(message);
    }
}

fn ensure_unique_name(
    state: &TournamentState,
    name: &str,
    except: Option<PlayerId>,
) -> Result<(), TournamentError> {
    let taken = state
        .players
        .iter()
        .any(|p| Some(p.id) != except && p.name.eq_ignore_ascii_case(name));
    if taken {
        return Err(TournamentError::DuplicatePlayerName(name.to_string()));
    }
    Ok(())
}

/// Register a player. Name and mobile number are required; names are unique (case-insensitive).
pub fn add_player(state: &mut TournamentState, new: NewPlayer) -> Result<PlayerId, TournamentError> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(TournamentError::MissingField("name"));
    }
    let mobile = new.mobile.trim();
    if mobile.is_empty() {
        return Err(TournamentError::MissingField("mobile number"));
    }
    ensure_unique_name(state, name, None)?;

    let mut player = Player::new(name, mobile, new.category.trim());
    if let Some(rating) = new.rating {
        player.rating = rating;
    }
    player.image = new.image.filter(|i| !i.trim().is_empty());
    let id = player.id;
    state.players.push(player);
    Ok(id)
}

/// Edit a player's details or rating by hand.
pub fn update_player(
    state: &mut TournamentState,
    id: PlayerId,
    update: PlayerUpdate,
) -> Result<(), TournamentError> {
    if state.get_player(id).is_none() {
        return Err(TournamentError::PlayerNotFound(id));
    }
    let name = match update.name.as_deref().map(str::trim) {
        Some("") => return Err(TournamentError::MissingField("name")),
        Some(name) => {
            ensure_unique_name(state, name, Some(id))?;
            Some(name.to_string())
        }
        None => None,
    };
    if let Some("") = update.mobile.as_deref().map(str::trim) {
        return Err(TournamentError::MissingField("mobile number"));
    }

    let p = state
        .get_player_mut(id)
        .ok_or(TournamentError::PlayerNotFound(id))?;
    if let Some(name) = name {
        p.name = name;
    }
    if let Some(mobile) = update.mobile {
        p.mobile = mobile.trim().to_string();
    }
    if let Some(rating) = update.rating {
        p.rating = rating;
    }
    if let Some(category) = update.category {
        p.category = category.trim().to_string();
    }
    if let Some(image) = update.image {
        p.image = Some(image).filter(|i| !i.trim().is_empty());
    }
    Ok(())
}

/// Delete a player and everything that references them.
///
/// Drops their matches, cached fixtures, selection entry and byes. An opponent
/// in the current knockout round who has not lost to them gets a bye instead.
/// Returns the number of matches removed.
pub fn delete_player(state: &mut TournamentState, id: PlayerId) -> Result<usize, TournamentError> {
    let idx = state
        .players
        .iter()
        .position(|p| p.id == id)
        .ok_or(TournamentError::PlayerNotFound(id))?;
    state.players.remove(idx);

    // In a live knockout round the opponent advances unless they already lost.
    let round = state.current_round;
    if state.status == TournamentStatus::InProgress && is_knockout_round(state, round) {
        let walkovers: Vec<PlayerId> = state
            .matches_in_round(round)
            .filter(|m| m.involves(id) && m.winner != Some(id))
            .filter_map(|m| m.opponent_of(id))
            .collect();
        for opponent in walkovers {
            log::info!("Player {} advances from round {} on a walkover", opponent, round);
            state.byes.entry(round).or_default().push(opponent);
        }
    }

    let before = state.matches.len();
    state.matches.retain(|m| !m.involves(id));
    let removed = before - state.matches.len();

    for cache in [&mut state.generated_fixtures, &mut state.published_fixtures] {
        for pairings in cache.values_mut() {
            pairings.retain(|f| !f.involves(id));
        }
        cache.retain(|_, pairings| !pairings.is_empty());
    }
    state.settings.selected_players.retain(|p| *p != id);
    for holders in state.byes.values_mut() {
        holders.retain(|p| *p != id);
    }
    if state.champion == Some(id) {
        state.champion = None;
    }
    log::info!("Deleted player {} and {} match(es)", id, removed);
    Ok(removed)
}

/// Add many players; invalid or duplicate entries are skipped with a warning.
pub fn add_players_bulk(state: &mut TournamentState, players: Vec<NewPlayer>) -> ImportReport {
    let mut report = ImportReport::default();
    for new in players {
        let label = new.name.clone();
        match add_player(state, new) {
            Ok(_) => report.added += 1,
            Err(e) => report.warn(format!("Skipped '{}': {}", label, e)),
        }
    }
    report
}
