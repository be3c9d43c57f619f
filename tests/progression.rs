//! Integration tests for the round progression state machine.

use racquet_league_web::logic::{group_standings, round_digest, NewPlayer};
use racquet_league_web::{
    add_match, add_player, clear_score, delete_player, complete_round, record_score, reset_tournament,
    start_tournament, update_settings, MatchId, PlayerId, TournamentError, TournamentFormat,
    TournamentSettings, TournamentState, TournamentStatus,
};
use std::collections::HashSet;

/// Registry with players P0.. at descending ratings (P0 strongest).
fn league(n: usize) -> (TournamentState, Vec<PlayerId>) {
    let mut s = TournamentState::new();
    let ids = (0..n)
        .map(|i| {
            add_player(
                &mut s,
                NewPlayer {
                    name: format!("P{i}"),
                    mobile: format!("07{i:03}"),
                    rating: Some(1600.0 - i as f64 * 10.0),
                    category: "Open".to_string(),
                    image: None,
                },
            )
            .unwrap()
        })
        .collect();
    (s, ids)
}

fn start(s: &mut TournamentState, format: TournamentFormat, selected: Vec<PlayerId>) {
    update_settings(
        s,
        TournamentSettings {
            name: "Club Night".to_string(),
            format,
            selected_players: selected,
            hybrid_min_group_size: Some(3),
            ..TournamentSettings::default()
        },
    )
    .unwrap();
    start_tournament(s).unwrap();
}

fn round_matches(s: &TournamentState, round: u32) -> Vec<MatchId> {
    s.matches_in_round(round).map(|m| m.id).collect()
}

/// Score every match of the current round so that `prefer` picks the winner.
fn play_round(s: &mut TournamentState, prefer: impl Fn(PlayerId, PlayerId) -> PlayerId) {
    let round = s.current_round;
    let matches: Vec<_> = s
        .matches_in_round(round)
        .map(|m| (m.id, m.player_1, m.player_2))
        .collect();
    for (id, p1, p2) in matches {
        let (a, b) = if prefer(p1, p2) == p1 { (11, 5) } else { (5, 11) };
        record_score(s, id, a, b).unwrap();
    }
}

fn lower_index_wins(ids: &[PlayerId]) -> impl Fn(PlayerId, PlayerId) -> PlayerId + '_ {
    move |a, b| {
        let ia = ids.iter().position(|x| *x == a).unwrap();
        let ib = ids.iter().position(|x| *x == b).unwrap();
        if ia < ib {
            a
        } else {
            b
        }
    }
}

#[test]
fn two_player_knockout_end_to_end() {
    let mut s = TournamentState::new();
    let a = add_player(
        &mut s,
        NewPlayer {
            name: "A".into(),
            mobile: "0711".into(),
            rating: Some(1500.0),
            category: "30+".into(),
            image: None,
        },
    )
    .unwrap();
    let b = add_player(
        &mut s,
        NewPlayer {
            name: "B".into(),
            mobile: "0722".into(),
            rating: Some(1500.0),
            category: "30+".into(),
            image: None,
        },
    )
    .unwrap();
    start(&mut s, TournamentFormat::Knockout, vec![a, b]);
    assert_eq!(s.current_round, 1);
    assert_eq!(s.status, TournamentStatus::InProgress);

    let m = s.matches[0].clone();
    assert_eq!((m.player_1, m.player_2), (a, b));
    record_score(&mut s, m.id, 11, 5).unwrap();

    let digest = complete_round(&mut s).unwrap();
    let pa = s.get_player(a).unwrap();
    let pb = s.get_player(b).unwrap();
    assert_eq!(pa.wins, 1);
    assert_eq!(pb.losses, 1);
    assert!(pa.rating > 1500.0);
    assert!(pb.rating < 1500.0);
    assert_eq!(s.status, TournamentStatus::Completed);
    assert_eq!(s.champion, Some(a));
    assert!(digest.completed);
    assert_eq!(digest.champion.as_deref(), Some("A"));
    assert_eq!(digest.results.len(), 1);
    assert_eq!(digest.results[0].winner.as_deref(), Some("A"));
}

#[test]
fn winner_matches_scores() {
    let (mut s, ids) = league(4);
    start(&mut s, TournamentFormat::RoundRobin, ids.clone());
    let matches = round_matches(&s, 1);
    record_score(&mut s, matches[0], 7, 11).unwrap();
    record_score(&mut s, matches[1], 9, 9).unwrap();

    let m0 = s.get_match(matches[0]).unwrap();
    assert!(m0.is_complete);
    assert_eq!(m0.winner, Some(m0.player_2));
    let m1 = s.get_match(matches[1]).unwrap();
    assert!(m1.is_complete);
    assert_eq!(m1.winner, None);
    let m2 = s.get_match(matches[2]).unwrap();
    assert!(!m2.is_complete);
    assert_eq!(m2.winner, None);
}

#[test]
fn each_completed_match_adds_exactly_one_result() {
    let (mut s, ids) = league(4);
    start(&mut s, TournamentFormat::RoundRobin, ids.clone());
    for id in round_matches(&s, 1) {
        let m = s.get_match(id).unwrap().clone();
        let before: Vec<u32> = [m.player_1, m.player_2]
            .iter()
            .map(|p| s.get_player(*p).unwrap().matches_played())
            .collect();
        record_score(&mut s, id, 6, 6).unwrap();
        let after: Vec<u32> = [m.player_1, m.player_2]
            .iter()
            .map(|p| s.get_player(*p).unwrap().matches_played())
            .collect();
        assert_eq!(after[0], before[0] + 1);
        assert_eq!(after[1], before[1] + 1);
    }
}

#[test]
fn round_cannot_complete_with_unscored_matches() {
    let (mut s, ids) = league(4);
    start(&mut s, TournamentFormat::Knockout, ids.clone());
    let matches = round_matches(&s, 1);
    record_score(&mut s, matches[0], 11, 3).unwrap();
    let snapshot = s.clone();

    assert_eq!(
        complete_round(&mut s),
        Err(TournamentError::IncompleteResults { round: 1, pending: 1 })
    );
    assert_eq!(s, snapshot);
}

#[test]
fn correcting_a_score_reverts_the_first_result() {
    let (mut s, ids) = league(2);
    start(&mut s, TournamentFormat::Knockout, ids.clone());
    let m = s.matches[0].clone();
    let (r1, r2) = (
        s.get_player(m.player_1).unwrap().rating,
        s.get_player(m.player_2).unwrap().rating,
    );

    record_score(&mut s, m.id, 11, 5).unwrap();
    record_score(&mut s, m.id, 5, 11).unwrap();

    let p1 = s.get_player(m.player_1).unwrap();
    let p2 = s.get_player(m.player_2).unwrap();
    assert_eq!((p1.wins, p1.losses, p1.draws), (0, 1, 0));
    assert_eq!((p2.wins, p2.losses, p2.draws), (1, 0, 0));
    assert!(p1.rating < r1);
    assert!(p2.rating > r2);
    // Zero-sum: total rating preserved.
    assert!((p1.rating + p2.rating - (r1 + r2)).abs() < 1e-9);
}

#[test]
fn clearing_a_score_restores_ratings() {
    let (mut s, ids) = league(2);
    start(&mut s, TournamentFormat::Knockout, ids.clone());
    let m = s.matches[0].clone();
    let before = s.players.clone();
    record_score(&mut s, m.id, 11, 5).unwrap();
    clear_score(&mut s, m.id).unwrap();
    for (old, new) in before.iter().zip(&s.players) {
        assert!((old.rating - new.rating).abs() < 1e-9);
        assert_eq!(new.matches_played(), 0);
    }
    assert!(!s.get_match(m.id).unwrap().is_complete);
}

#[test]
fn knockout_rejects_draws() {
    let (mut s, ids) = league(2);
    start(&mut s, TournamentFormat::Knockout, ids);
    let id = s.matches[0].id;
    assert_eq!(
        record_score(&mut s, id, 8, 8),
        Err(TournamentError::DrawInKnockout(id))
    );
    assert!(!s.matches[0].is_complete);
}

#[test]
fn finished_rounds_are_locked() {
    let (mut s, ids) = league(4);
    start(&mut s, TournamentFormat::Knockout, ids.clone());
    play_round(&mut s, lower_index_wins(&ids));
    complete_round(&mut s).unwrap();
    assert_eq!(s.current_round, 2);

    let first = round_matches(&s, 1)[0];
    assert_eq!(
        record_score(&mut s, first, 0, 11),
        Err(TournamentError::RoundLocked { round: 1 })
    );
}

#[test]
fn four_player_knockout_runs_to_a_champion() {
    let (mut s, ids) = league(4);
    start(&mut s, TournamentFormat::Knockout, ids.clone());
    assert_eq!(s.settings.total_rounds, 2);
    let pairs: Vec<_> = s.matches.iter().map(|m| (m.player_1, m.player_2)).collect();
    assert_eq!(pairs, vec![(ids[0], ids[3]), (ids[1], ids[2])]);

    play_round(&mut s, lower_index_wins(&ids));
    let digest = complete_round(&mut s).unwrap();
    assert!(!digest.completed);
    assert_eq!(digest.advancing, vec!["P0".to_string(), "P1".to_string()]);
    let final_match = s.matches_in_round(2).next().unwrap().clone();
    assert_eq!((final_match.player_1, final_match.player_2), (ids[0], ids[1]));

    play_round(&mut s, lower_index_wins(&ids));
    let digest = complete_round(&mut s).unwrap();
    assert!(digest.completed);
    assert_eq!(s.champion, Some(ids[0]));
    assert_eq!(s.status, TournamentStatus::Completed);
    assert_eq!(complete_round(&mut s), Err(TournamentError::InvalidState));
}

#[test]
fn odd_knockout_gives_byes_that_advance() {
    let (mut s, ids) = league(5);
    start(&mut s, TournamentFormat::Knockout, ids.clone());
    assert_eq!(s.byes.get(&1), Some(&vec![ids[2]]));
    assert_eq!(s.matches_in_round(1).count(), 2);

    play_round(&mut s, lower_index_wins(&ids));
    let digest = complete_round(&mut s).unwrap();
    // Winners P0, P1 then bye holder P2 -> P0 vs P2, P1 gets a bye.
    assert_eq!(digest.bye.as_deref(), Some("P1"));
    assert_eq!(s.byes.get(&2), Some(&vec![ids[1]]));
    let r2: Vec<_> = s.matches_in_round(2).map(|m| (m.player_1, m.player_2)).collect();
    assert_eq!(r2, vec![(ids[0], ids[2])]);

    play_round(&mut s, lower_index_wins(&ids));
    complete_round(&mut s).unwrap();
    let r3: Vec<_> = s.matches_in_round(3).map(|m| (m.player_1, m.player_2)).collect();
    assert_eq!(r3, vec![(ids[0], ids[1])]);

    play_round(&mut s, lower_index_wins(&ids));
    complete_round(&mut s).unwrap();
    assert_eq!(s.champion, Some(ids[0]));
    // Byes are not results.
    assert_eq!(s.get_player(ids[1]).unwrap().matches_played(), 2);
}

#[test]
fn round_robin_completes_after_round_one() {
    let (mut s, ids) = league(3);
    start(&mut s, TournamentFormat::RoundRobin, ids.clone());
    assert_eq!(s.matches.len(), 3);
    assert!(s.matches.iter().all(|m| m.round == 1));

    let draw_pair: HashSet<_> = [ids[1], ids[2]].into_iter().collect();
    for id in round_matches(&s, 1) {
        let m = s.get_match(id).unwrap().clone();
        let pair: HashSet<_> = [m.player_1, m.player_2].into_iter().collect();
        if pair == draw_pair {
            record_score(&mut s, id, 4, 4).unwrap();
        } else if m.player_1 == ids[0] {
            record_score(&mut s, id, 11, 2).unwrap();
        } else {
            record_score(&mut s, id, 2, 11).unwrap();
        }
    }
    let digest = complete_round(&mut s).unwrap();
    assert!(digest.completed);
    assert_eq!(s.status, TournamentStatus::Completed);
    assert_eq!(s.champion, Some(ids[0]));
    assert_eq!(s.get_player(ids[1]).unwrap().draws, 1);
}

#[test]
fn hybrid_groups_feed_a_knockout() {
    let (mut s, ids) = league(6);
    start(&mut s, TournamentFormat::Hybrid, ids.clone());
    let groups: HashSet<_> = s.matches.iter().filter_map(|m| m.group.clone()).collect();
    assert_eq!(groups.len(), 2);
    assert_eq!(s.matches_in_round(1).count(), 6);
    assert_eq!(s.settings.total_rounds, 3);

    // Draws are fine in the group stage.
    let first = round_matches(&s, 1)[0];
    record_score(&mut s, first, 3, 3).unwrap();
    play_round(&mut s, lower_index_wins(&ids));

    let tables = group_standings(&s, 1);
    assert_eq!(tables.len(), 2);
    assert!(tables.values().all(|t| t.len() == 3));

    let digest = complete_round(&mut s).unwrap();
    assert_eq!(digest.advancing.len(), 4);
    assert_eq!(s.current_round, 2);
    // Group winners meet the other group's runner-up.
    let r2: Vec<HashSet<PlayerId>> = s
        .matches_in_round(2)
        .map(|m| [m.player_1, m.player_2].into_iter().collect())
        .collect();
    let winners: Vec<PlayerId> = tables.values().map(|t| t[0].player_id).collect();
    let runners_up: Vec<PlayerId> = tables.values().map(|t| t[1].player_id).collect();
    assert!(r2.contains(&[winners[0], runners_up[1]].into_iter().collect()));
    assert!(r2.contains(&[winners[1], runners_up[0]].into_iter().collect()));

    // Knockout from round 2 on: no draws.
    let semi = round_matches(&s, 2)[0];
    assert_eq!(
        record_score(&mut s, semi, 2, 2),
        Err(TournamentError::DrawInKnockout(semi))
    );
    play_round(&mut s, lower_index_wins(&ids));
    complete_round(&mut s).unwrap();
    play_round(&mut s, lower_index_wins(&ids));
    let digest = complete_round(&mut s).unwrap();
    assert!(digest.completed);
    assert_eq!(s.champion, Some(ids[0]));
}

#[test]
fn start_needs_two_players_and_freezes_settings() {
    let (mut s, _) = league(1);
    assert!(matches!(
        start_tournament(&mut s),
        Err(TournamentError::NotEnoughPlayers { required: 2, available: 1 })
    ));

    let (mut s, ids) = league(2);
    start(&mut s, TournamentFormat::Knockout, ids);
    assert_eq!(
        update_settings(&mut s, TournamentSettings::default()),
        Err(TournamentError::AlreadyStarted)
    );
    assert_eq!(start_tournament(&mut s), Err(TournamentError::AlreadyStarted));
}

#[test]
fn added_match_joins_the_current_round() {
    let (mut s, ids) = league(4);
    start(&mut s, TournamentFormat::RoundRobin, vec![ids[0], ids[1]]);
    let extra = add_match(&mut s, ids[2], ids[3]).unwrap();
    assert_eq!(s.get_match(extra).unwrap().round, 1);
    assert_eq!(
        add_match(&mut s, ids[2], ids[2]),
        Err(TournamentError::SamePlayer(ids[2]))
    );
    assert_eq!(s.pending_in_round(1), 2);
}

#[test]
fn reset_with_revert_restores_the_league() {
    let (mut s, ids) = league(4);
    let before = s.players.clone();
    start(&mut s, TournamentFormat::Knockout, ids.clone());
    play_round(&mut s, lower_index_wins(&ids));
    complete_round(&mut s).unwrap();
    play_round(&mut s, lower_index_wins(&ids));

    reset_tournament(&mut s, true);
    assert_eq!(s.status, TournamentStatus::NotStarted);
    assert_eq!(s.current_round, 0);
    assert!(s.matches.is_empty());
    for (old, new) in before.iter().zip(&s.players) {
        assert!((old.rating - new.rating).abs() < 1e-9);
        assert_eq!(new.matches_played(), 0);
    }
}

#[test]
fn digest_is_only_available_for_finished_rounds() {
    let (mut s, ids) = league(4);
    start(&mut s, TournamentFormat::Knockout, ids.clone());
    assert!(round_digest(&s, 1).is_none());
    play_round(&mut s, lower_index_wins(&ids));
    complete_round(&mut s).unwrap();
    let digest = round_digest(&s, 1).unwrap();
    assert_eq!(digest.round, 1);
    assert_eq!(digest.results.len(), 2);
    assert!(round_digest(&s, 2).is_none());
}

#[test]
fn restart_after_reset_schedules_newly_registered_players() {
    let (mut s, _) = league(3);
    start(&mut s, TournamentFormat::RoundRobin, Vec::new());
    assert_eq!(s.matches.len(), 3);

    reset_tournament(&mut s, false);
    let late = add_player(
        &mut s,
        NewPlayer {
            name: "Late".into(),
            mobile: "0799".into(),
            category: "Open".into(),
            ..NewPlayer::default()
        },
    )
    .unwrap();
    start(&mut s, TournamentFormat::RoundRobin, Vec::new());

    assert_eq!(s.matches.len(), 6);
    assert_eq!(s.matches.iter().filter(|m| m.involves(late)).count(), 3);
}

#[test]
fn round_robin_without_any_pairable_category_reports_participants() {
    let mut s = TournamentState::new();
    for (name, category) in [("A", "30+"), ("B", "Open")] {
        add_player(
            &mut s,
            NewPlayer {
                name: name.into(),
                mobile: "0700".into(),
                category: category.into(),
                ..NewPlayer::default()
            },
        )
        .unwrap();
    }
    s.settings.format = TournamentFormat::RoundRobin;
    assert_eq!(
        start_tournament(&mut s),
        Err(TournamentError::NotEnoughPlayers {
            required: 2,
            available: 2
        })
    );
}

#[test]
fn three_group_hybrid_has_no_group_rematch() {
    let (mut s, ids) = league(9);
    start(&mut s, TournamentFormat::Hybrid, ids.clone());
    let group_of: std::collections::HashMap<PlayerId, String> = s
        .matches_in_round(1)
        .flat_map(|m| {
            let group = m.group.clone().unwrap();
            [(m.player_1, group.clone()), (m.player_2, group)]
        })
        .collect();
    let groups: HashSet<&String> = group_of.values().collect();
    assert_eq!(groups.len(), 3);

    play_round(&mut s, lower_index_wins(&ids));
    let digest = complete_round(&mut s).unwrap();
    assert_eq!(digest.advancing.len(), 6);

    let round_2: Vec<_> = s.matches_in_round(2).collect();
    assert_eq!(round_2.len(), 3);
    for m in round_2 {
        assert_ne!(group_of[&m.player_1], group_of[&m.player_2]);
    }
}

#[test]
fn deleting_a_player_mid_knockout_keeps_the_opponent_in() {
    let (mut s, ids) = league(4);
    start(&mut s, TournamentFormat::Knockout, ids.clone());
    // Round 1: P0 vs P3, P1 vs P2.
    let decided = s.matches_in_round(1).find(|m| m.involves(ids[0])).unwrap().id;
    record_score(&mut s, decided, 11, 4).unwrap();

    // P3 already lost; P2 never played.
    delete_player(&mut s, ids[3]).unwrap();
    delete_player(&mut s, ids[2]).unwrap();
    assert_eq!(s.byes.get(&1), Some(&vec![ids[0], ids[1]]));

    complete_round(&mut s).unwrap();
    let r2: Vec<_> = s.matches_in_round(2).map(|m| (m.player_1, m.player_2)).collect();
    assert_eq!(r2, vec![(ids[0], ids[1])]);
}
