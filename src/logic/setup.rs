//! Setup phase: settings, starting the tournament (round 0 -> round 1) and resetting it.

use crate::logic::fixtures::{knockout_pairings, knockout_round_count, partition_groups, round_robin_pairings};
use crate::logic::rating;
use crate::models::{
    FixturePairing, GameMatch, Player, PlayerId, TournamentError, TournamentFormat,
    TournamentSettings, TournamentState, TournamentStatus,
};
use std::collections::BTreeMap;

/// Minimum group size for hybrid tournaments when none is configured.
pub const DEFAULT_MIN_GROUP_SIZE: usize = 3;

/// Published-cache key prefix for hybrid group schedules.
const GROUP_KEY_PREFIX: &str = "Group ";

/// Replace the settings (only before the tournament starts).
pub fn update_settings(
    state: &mut TournamentState,
    settings: TournamentSettings,
) -> Result<(), TournamentError> {
    if state.is_started() {
        return Err(TournamentError::AlreadyStarted);
    }
    if let Some(&missing) = settings
        .selected_players
        .iter()
        .find(|id| state.get_player(**id).is_none())
    {
        return Err(TournamentError::PlayerNotFound(missing));
    }
    if let Some(size) = settings.hybrid_min_group_size {
        if size < 2 {
            return Err(TournamentError::InvalidGroupSize(size));
        }
    }
    state.settings = settings;
    Ok(())
}

/// Participants in selection order. An empty selection means every registered
/// player, restricted to the settings' category when one is set.
pub fn participants(state: &TournamentState) -> Result<Vec<PlayerId>, TournamentError> {
    let settings = &state.settings;
    if settings.selected_players.is_empty() {
        return Ok(state
            .players
            .iter()
            .filter(|p| settings.category.as_ref().map_or(true, |c| &p.category == c))
            .map(|p| p.id)
            .collect());
    }
    let mut ids = Vec::with_capacity(settings.selected_players.len());
    for &id in &settings.selected_players {
        if state.get_player(id).is_none() {
            return Err(TournamentError::PlayerNotFound(id));
        }
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Start the tournament: build round 1 for the chosen format.
pub fn start_tournament(state: &mut TournamentState) -> Result<(), TournamentError> {
    if state.status != TournamentStatus::NotStarted {
        return Err(TournamentError::AlreadyStarted);
    }
    let ids = participants(state)?;
    if ids.len() < 2 {
        return Err(TournamentError::NotEnoughPlayers {
            required: 2,
            available: ids.len(),
        });
    }

    let (matches, planned_rounds) = match state.settings.format {
        TournamentFormat::Knockout => {
            let (pairs, bye) = knockout_pairings(&ids);
            state.byes.clear();
            if let Some(bye) = bye {
                state.byes.insert(1, vec![bye]);
            }
            let category = state.settings.category.clone();
            let matches = pairs
                .into_iter()
                .map(|(a, b)| GameMatch::new(a, b, 1).with_category(category.clone()))
                .collect();
            (matches, knockout_round_count(ids.len()))
        }
        TournamentFormat::RoundRobin => (round_robin_matches(state, &ids)?, 1),
        TournamentFormat::Hybrid => hybrid_group_matches(state, &ids)?,
    };

    state.matches = matches;
    state.current_round = 1;
    state.status = TournamentStatus::InProgress;
    state.champion = None;
    state.round_summaries.clear();
    if state.settings.total_rounds == 0 {
        state.settings.total_rounds = planned_rounds;
    }
    log::info!(
        "Started {:?} tournament '{}' with {} players, {} match(es) in round 1",
        state.settings.format,
        state.settings.name,
        ids.len(),
        state.matches.len()
    );
    Ok(())
}

/// Round-robin matches per category.
///
/// A category's published fixtures are its schedule when they give every
/// participant of the category a match; otherwise a fresh schedule is generated
/// for this start only. Generated schedules are not written to the caches.
fn round_robin_matches(
    state: &TournamentState,
    ids: &[PlayerId],
) -> Result<Vec<GameMatch>, TournamentError> {
    let mut by_category: BTreeMap<String, Vec<PlayerId>> = BTreeMap::new();
    for &id in ids {
        if let Some(p) = state.get_player(id) {
            by_category.entry(p.category.clone()).or_default().push(id);
        }
    }

    let mut matches = Vec::new();
    for (category, members) in by_category {
        if members.len() < 2 {
            log::warn!("Category '{}' has a single participant; no fixtures", category);
            continue;
        }
        let published: Vec<FixturePairing> = state
            .published_fixtures
            .get(&category)
            .map(|fixtures| {
                fixtures
                    .iter()
                    .filter(|f| members.contains(&f.player_1) && members.contains(&f.player_2))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let covered = members
            .iter()
            .all(|id| published.iter().any(|f| f.involves(*id)));

        let pairings = if covered {
            published
        } else {
            if state.published_fixtures.contains_key(&category) {
                log::warn!(
                    "Published fixtures for '{}' miss some participants; generating a new schedule",
                    category
                );
            }
            let label = (!category.is_empty()).then_some(category.as_str());
            round_robin_pairings(&members, label, None)
        };
        matches.extend(pairings_to_matches(pairings, 1));
    }
    if matches.is_empty() {
        return Err(TournamentError::NotEnoughPlayers {
            required: 2,
            available: ids.len(),
        });
    }
    Ok(matches)
}

/// Group-stage matches for a hybrid tournament, plus the planned round count.
fn hybrid_group_matches(
    state: &mut TournamentState,
    ids: &[PlayerId],
) -> Result<(Vec<GameMatch>, u32), TournamentError> {
    let min_size = state
        .settings
        .hybrid_min_group_size
        .unwrap_or(DEFAULT_MIN_GROUP_SIZE);
    let players: Vec<Player> = ids
        .iter()
        .filter_map(|id| state.get_player(*id).cloned())
        .collect();
    let groups = partition_groups(&players, min_size, state.settings.group_seeding)?;
    let category = state.settings.category.clone();

    // Group schedules of an earlier start are replaced.
    state
        .published_fixtures
        .retain(|key, _| !key.starts_with(GROUP_KEY_PREFIX));
    let mut matches = Vec::new();
    let mut qualifiers = 0;
    for group in &groups {
        let pairings = round_robin_pairings(&group.players, category.as_deref(), Some(&group.label));
        state
            .published_fixtures
            .insert(format!("{}{}", GROUP_KEY_PREFIX, group.label), pairings.clone());
        matches.extend(pairings_to_matches(pairings, 1));
        qualifiers += group.players.len().min(2);
    }
    log::info!("Split {} players into {} group(s)", players.len(), groups.len());
    Ok((matches, 1 + knockout_round_count(qualifiers)))
}

fn pairings_to_matches(pairings: Vec<FixturePairing>, round: u32) -> impl Iterator<Item = GameMatch> {
    pairings.into_iter().map(move |f| {
        GameMatch::new(f.player_1, f.player_2, round)
            .with_category(f.category)
            .with_group(f.group)
    })
}

/// Return to "not started": drop matches, byes, summaries and the champion.
///
/// With `revert_results`, every scored match is undone on the players' records and
/// ratings first; otherwise the league keeps the rating changes already earned.
pub fn reset_tournament(state: &mut TournamentState, revert_results: bool) {
    if revert_results {
        let matches = std::mem::take(&mut state.matches);
        for m in matches.iter().rev() {
            rating::revert_match(state, m);
        }
    }
    state.matches.clear();
    state.current_round = 0;
    state.status = TournamentStatus::NotStarted;
    state.byes.clear();
    state.round_summaries.clear();
    state.champion = None;
    state.settings.total_rounds = 0;
    log::info!("Tournament reset (results reverted: {})", revert_results);
}
