//! Fixture generation: round robin (circle method), group partition, knockout pairing,
//! and the per-category fixture caches.

use crate::models::{
    FixturePairing, GroupSeeding, Player, PlayerId, TournamentError, TournamentState,
};
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

/// One group of a hybrid tournament.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub label: String,
    pub players: Vec<PlayerId>,
}

/// Round-robin schedule using the circle method.
///
/// Returns one inner list per round. With an odd player count each round has one
/// player resting. Every unordered pair appears exactly once.
pub fn round_robin_rounds(ids: &[PlayerId]) -> Vec<Vec<(PlayerId, PlayerId)>> {
    if ids.len() < 2 {
        return Vec::new();
    }
    let mut circle: Vec<Option<PlayerId>> = ids.iter().copied().map(Some).collect();
    if circle.len() % 2 == 1 {
        circle.push(None);
    }
    let n = circle.len();
    let mut rounds = Vec::with_capacity(n - 1);
    for round in 0..n - 1 {
        let mut pairs = Vec::with_capacity(n / 2);
        for i in 0..n / 2 {
            if let (Some(a), Some(b)) = (circle[i], circle[n - 1 - i]) {
                // Alternate sides for the fixed player.
                if i == 0 && round % 2 == 1 {
                    pairs.push((b, a));
                } else {
                    pairs.push((a, b));
                }
            }
        }
        rounds.push(pairs);
        // First position stays fixed; the rest rotate by one.
        if let Some(last) = circle.pop() {
            circle.insert(1, last);
        }
    }
    rounds
}

/// Flattened round-robin pairings tagged with their slot.
pub fn round_robin_pairings(
    ids: &[PlayerId],
    category: Option<&str>,
    group: Option<&str>,
) -> Vec<FixturePairing> {
    round_robin_rounds(ids)
        .into_iter()
        .enumerate()
        .flat_map(|(slot, pairs)| {
            pairs.into_iter().map(move |(player_1, player_2)| FixturePairing {
                player_1,
                player_2,
                slot: slot as u32 + 1,
                category: category.map(str::to_string),
                group: group.map(str::to_string),
            })
        })
        .collect()
}

/// Label for the group at `index`: A, B, ..., Z, then G27, G28, ...
pub fn group_label(index: usize) -> String {
    if index < 26 {
        char::from(b'A' + index as u8).to_string()
    } else {
        format!("G{}", index + 1)
    }
}

/// Split players into balanced groups of at least `min_size` (where possible).
///
/// Group count is `max(1, n / min_size)`, so sizes differ by at most one.
pub fn partition_groups(
    players: &[Player],
    min_size: usize,
    seeding: GroupSeeding,
) -> Result<Vec<Group>, TournamentError> {
    if min_size < 2 {
        return Err(TournamentError::InvalidGroupSize(min_size));
    }
    if players.len() < 2 {
        return Err(TournamentError::NotEnoughPlayers {
            required: 2,
            available: players.len(),
        });
    }
    let group_count = (players.len() / min_size).max(1);

    let mut ordered: Vec<&Player> = players.iter().collect();
    match seeding {
        GroupSeeding::Snake => ordered.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then_with(|| a.name.cmp(&b.name))
        }),
        GroupSeeding::Random => ordered.shuffle(&mut rand::thread_rng()),
    }

    let mut groups: Vec<Group> = (0..group_count)
        .map(|i| Group {
            label: group_label(i),
            players: Vec::new(),
        })
        .collect();
    for (i, p) in ordered.iter().enumerate() {
        let pass = i / group_count;
        let pos = i % group_count;
        let target = match seeding {
            GroupSeeding::Snake if pass % 2 == 1 => group_count - 1 - pos,
            _ => pos,
        };
        groups[target].players.push(p.id);
    }
    Ok(groups)
}

/// Knockout pairing: first vs last, second vs second-last, ...
///
/// With an odd count the middle entrant gets a bye.
pub fn knockout_pairings(ids: &[PlayerId]) -> (Vec<(PlayerId, PlayerId)>, Option<PlayerId>) {
    let n = ids.len();
    let pairs = (0..n / 2).map(|i| (ids[i], ids[n - 1 - i])).collect();
    let bye = if n % 2 == 1 { Some(ids[n / 2]) } else { None };
    (pairs, bye)
}

/// Number of knockout rounds needed to reduce `entrants` to one.
pub fn knockout_round_count(entrants: usize) -> u32 {
    let mut rounds = 0;
    let mut remaining = entrants;
    while remaining > 1 {
        remaining = remaining.div_ceil(2);
        rounds += 1;
    }
    rounds
}

fn players_in_category(state: &TournamentState, category: &str) -> Vec<PlayerId> {
    state
        .players
        .iter()
        .filter(|p| p.category == category)
        .map(|p| p.id)
        .collect()
}

/// Generate the round-robin fixtures for one category into the generated cache.
/// Replaces whatever was cached for that category. Returns the number of pairings.
pub fn generate_category_fixtures(
    state: &mut TournamentState,
    category: &str,
) -> Result<usize, TournamentError> {
    let ids = players_in_category(state, category);
    if ids.is_empty() {
        return Err(TournamentError::UnknownCategory(category.to_string()));
    }
    if ids.len() < 2 {
        return Err(TournamentError::NotEnoughPlayers {
            required: 2,
            available: ids.len(),
        });
    }
    let pairings = round_robin_pairings(&ids, Some(category), None);
    let count = pairings.len();
    state.generated_fixtures.insert(category.to_string(), pairings);
    log::info!("Generated {} fixture(s) for category '{}'", count, category);
    Ok(count)
}

/// Generate fixtures for every category with at least two players.
pub fn generate_all_category_fixtures(state: &mut TournamentState) -> Vec<(String, usize)> {
    let mut generated = Vec::new();
    for category in state.categories() {
        if let Ok(count) = generate_category_fixtures(state, &category) {
            generated.push((category, count));
        }
    }
    generated
}

/// Move a category's generated fixtures into the published cache.
/// Published fixtures are used as the round-robin schedule when the tournament starts.
pub fn publish_fixtures(state: &mut TournamentState, category: &str) -> Result<usize, TournamentError> {
    if state.is_started() {
        return Err(TournamentError::AlreadyStarted);
    }
    let pairings = state
        .generated_fixtures
        .remove(category)
        .ok_or_else(|| TournamentError::NoFixtures(category.to_string()))?;
    let count = pairings.len();
    state.published_fixtures.insert(category.to_string(), pairings);
    Ok(count)
}

/// Store imported pairings as the published schedule of their categories.
///
/// Each category named in the import has its published schedule replaced.
/// Pairings without a category are filed under the empty category. A pair that
/// already appears in its category is dropped. Returns the number kept.
pub fn publish_custom_fixtures(
    state: &mut TournamentState,
    pairings: Vec<FixturePairing>,
) -> Result<usize, TournamentError> {
    if state.is_started() {
        return Err(TournamentError::AlreadyStarted);
    }
    let mut schedules: BTreeMap<String, Vec<FixturePairing>> = BTreeMap::new();
    for pairing in pairings {
        let schedule = schedules
            .entry(pairing.category.clone().unwrap_or_default())
            .or_default();
        if schedule.iter().any(|f| same_pair(f, &pairing)) {
            log::warn!(
                "Dropped repeated pairing {} vs {}",
                pairing.player_1,
                pairing.player_2
            );
            continue;
        }
        schedule.push(pairing);
    }
    let count = schedules.values().map(Vec::len).sum();
    state.published_fixtures.extend(schedules);
    Ok(count)
}

/// Same two players, in either order.
pub fn same_pair(a: &FixturePairing, b: &FixturePairing) -> bool {
    (a.player_1 == b.player_1 && a.player_2 == b.player_2)
        || (a.player_1 == b.player_2 && a.player_2 == b.player_1)
}

/// Drop both caches for a category.
pub fn clear_fixtures(state: &mut TournamentState, category: &str) -> Result<(), TournamentError> {
    let generated = state.generated_fixtures.remove(category);
    let published = state.published_fixtures.remove(category);
    if generated.is_none() && published.is_none() {
        return Err(TournamentError::NoFixtures(category.to_string()));
    }
    Ok(())
}
