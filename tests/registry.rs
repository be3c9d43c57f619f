//! Integration tests for the player registry.

use racquet_league_web::logic::{
    add_players_bulk, generate_category_fixtures, start_tournament, NewPlayer, PlayerUpdate,
};
use racquet_league_web::{
    add_player, delete_player, update_player, TournamentError, TournamentFormat, TournamentState,
    DEFAULT_RATING,
};

fn new_player(name: &str, category: &str) -> NewPlayer {
    NewPlayer {
        name: name.to_string(),
        mobile: format!("555-{}", name.len()),
        category: category.to_string(),
        ..NewPlayer::default()
    }
}

#[test]
fn add_player_fills_defaults() {
    let mut s = TournamentState::new();
    let id = add_player(&mut s, new_player("Alice", "30+")).unwrap();
    let p = s.get_player(id).unwrap();
    assert_eq!(p.name, "Alice");
    assert_eq!(p.category, "30+");
    assert_eq!(p.rating, DEFAULT_RATING);
    assert_eq!(p.matches_played(), 0);
}

#[test]
fn add_player_requires_name_and_mobile() {
    let mut s = TournamentState::new();
    let mut missing_mobile = new_player("Bob", "");
    missing_mobile.mobile = "  ".to_string();
    assert_eq!(
        add_player(&mut s, missing_mobile),
        Err(TournamentError::MissingField("mobile number"))
    );
    assert_eq!(
        add_player(&mut s, new_player("   ", "")),
        Err(TournamentError::MissingField("name"))
    );
    assert!(s.players.is_empty());
}

#[test]
fn names_are_unique_ignoring_case() {
    let mut s = TournamentState::new();
    add_player(&mut s, new_player("Alice", "")).unwrap();
    assert!(matches!(
        add_player(&mut s, new_player("alice", "")),
        Err(TournamentError::DuplicatePlayerName(_))
    ));
    assert_eq!(s.players.len(), 1);
}

#[test]
fn update_player_changes_only_given_fields() {
    let mut s = TournamentState::new();
    let id = add_player(&mut s, new_player("Alice", "Open")).unwrap();
    update_player(
        &mut s,
        id,
        PlayerUpdate {
            rating: Some(1620.0),
            image: Some("alice.png".to_string()),
            ..PlayerUpdate::default()
        },
    )
    .unwrap();
    let p = s.get_player(id).unwrap();
    assert_eq!(p.rating, 1620.0);
    assert_eq!(p.image.as_deref(), Some("alice.png"));
    assert_eq!(p.category, "Open");
}

#[test]
fn update_player_rejects_taken_name() {
    let mut s = TournamentState::new();
    add_player(&mut s, new_player("Alice", "")).unwrap();
    let bob = add_player(&mut s, new_player("Bob", "")).unwrap();
    let rename = PlayerUpdate {
        name: Some("ALICE".to_string()),
        ..PlayerUpdate::default()
    };
    assert!(matches!(
        update_player(&mut s, bob, rename),
        Err(TournamentError::DuplicatePlayerName(_))
    ));
    assert_eq!(s.get_player(bob).unwrap().name, "Bob");
}

#[test]
fn delete_cascades_to_matches_and_fixtures() {
    let mut s = TournamentState::new();
    let a = add_player(&mut s, new_player("A", "30+")).unwrap();
    let b = add_player(&mut s, new_player("B", "30+")).unwrap();
    let c = add_player(&mut s, new_player("C", "30+")).unwrap();
    generate_category_fixtures(&mut s, "30+").unwrap();
    s.settings.format = TournamentFormat::RoundRobin;
    start_tournament(&mut s).unwrap();
    assert_eq!(s.matches.len(), 3);

    let removed = delete_player(&mut s, a).unwrap();
    assert_eq!(removed, 2);
    assert!(s.matches.iter().all(|m| !m.involves(a)));
    assert!(s.get_player(a).is_none());
    for cache in [&s.generated_fixtures, &s.published_fixtures] {
        for pairings in cache.values() {
            assert!(pairings.iter().all(|f| !f.involves(a)));
        }
    }
    assert_eq!(s.matches.len(), 1);
    assert!(s.matches[0].involves(b) && s.matches[0].involves(c));
}

#[test]
fn delete_unknown_player_fails() {
    let mut s = TournamentState::new();
    let id = uuid::Uuid::new_v4();
    assert_eq!(delete_player(&mut s, id), Err(TournamentError::PlayerNotFound(id)));
}

#[test]
fn bulk_add_skips_invalid_entries_with_warnings() {
    let mut s = TournamentState::new();
    let mut no_mobile = new_player("Carl", "");
    no_mobile.mobile.clear();
    let report = add_players_bulk(
        &mut s,
        vec![
            new_player("Alice", ""),
            no_mobile,
            new_player("alice", ""),
            new_player("Dora", ""),
        ],
    );
    assert_eq!(report.added, 2);
    assert_eq!(report.warnings.len(), 2);
    assert_eq!(s.players.len(), 2);
}
