/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fs, time::Duration};

use clap::Parser;
use dropchess::*;
use tempfile::TempDir;

fn sq(s: &str) -> Square {
    s.parse().unwrap()
}

/// A game a few moves in, with something in every reserve list.
fn busy_game() -> Game {
    let game = Game::from_placements(
        "r3k3/p7/8/8/R3N3/8/8/4K3",
        Color::White,
        RuleConfig::default(),
    )
    .unwrap();

    [
        // White's rook takes its own knight
        Event::Move { from: sq("a4"), to: sq("e4") },
        // Black's rook takes its own pawn
        Event::Move { from: sq("a8"), to: sq("a7") },
        Event::Move { from: sq("e4"), to: sq("a4") },
        // Black thinks, then takes White's rook
        Event::Tick(Duration::from_millis(2_500)),
        Event::Move { from: sq("a7"), to: sq("a4") },
    ]
    .into_iter()
    .fold(game, |game, event| game.apply_event(event).0)
}

#[test]
fn test_record_preserves_every_reserve() {
    let game = busy_game();
    let reserves = game.reserves();
    assert_eq!(reserves.self_captured(Color::White).len(), 1);
    assert_eq!(reserves.self_captured(Color::Black).len(), 1);
    assert_eq!(reserves.captured_by(Color::Black).len(), 1);

    let json = game.to_record().to_json().unwrap();
    let record = GameRecord::from_json(&json).unwrap();
    let restored = Game::from_record(&record, RuleConfig::default(), DEFAULT_CLOCK_TIME).unwrap();

    assert_eq!(restored.reserves(), game.reserves());
    assert_eq!(restored.board(), game.board());
    assert_eq!(restored.side_to_move(), game.side_to_move());
    assert_eq!(
        restored.clock().remaining(Color::Black),
        DEFAULT_CLOCK_TIME - Duration::from_millis(2_500)
    );
}

#[test]
fn test_dir_store_lifecycle() {
    let dir = TempDir::new().unwrap();
    let mut store = JsonDirStore::open(dir.path()).unwrap();
    let record = busy_game().to_record();

    let first = store.create("alice", record.clone()).unwrap();
    let second = store.create("alice", Game::default().to_record()).unwrap();
    let other = store.create("bob", record.clone()).unwrap();
    assert!(dir.path().join(format!("{first}.json")).exists());

    let ids = |store: &JsonDirStore| {
        store
            .list("alice")
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(&store), [second, first]);

    store.update(first, record.clone()).unwrap();
    assert_eq!(ids(&store), [first, second]);
    assert_eq!(store.read(first).unwrap().record, record);

    store.delete(second).unwrap();
    assert_eq!(ids(&store), [first]);
    assert!(store.read(second).is_err());
    assert_eq!(store.read(other).unwrap().user_id, "bob");
}

#[test]
fn test_dir_store_skips_corrupt_files() {
    let dir = TempDir::new().unwrap();
    let mut store = JsonDirStore::open(dir.path()).unwrap();
    let id = store.create("alice", Game::default().to_record()).unwrap();

    fs::write(dir.path().join("99.json"), "{ not json").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    assert!(store.read(99).is_err());
    let listed = store.list("alice").unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].0, id);
}

#[test]
fn test_stats_file_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(STATS_FILE_NAME);

    let mut stats = MemoryStats::with_file(&path).unwrap();
    stats
        .report(OutcomeEvent {
            user_id: String::from("alice"),
            result: GameResult::Loss,
        })
        .unwrap();

    let reopened = MemoryStats::with_file(&path).unwrap();
    let alice = reopened.stats("alice").unwrap();
    assert_eq!(alice.games_played, 1);
    assert_eq!(alice.games_lost, 1);
}

#[test]
fn test_engine_saves_to_directory() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().to_str().unwrap();
    let cli = Cli::try_parse_from(["dropchess", "--store", store, "--user", "alice"]).unwrap();

    let mut engine = Engine::from_cli(&cli).unwrap();
    assert_eq!(engine.session().user(), Some("alice"));
    engine
        .execute(EngineCommand::Move {
            from: sq("d2"),
            to: sq("d4"),
        })
        .unwrap();
    let id = engine.save(false).unwrap();
    let saved = engine.game().to_record();

    // A second session over the same directory sees the save
    let mut engine = Engine::from_cli(&cli).unwrap();
    engine.execute(EngineCommand::Load { id }).unwrap();
    assert_eq!(engine.game().to_record(), saved);
    assert_eq!(engine.game().side_to_move(), Color::Black);

    // Signed out, nothing can be saved or loaded
    engine.execute(EngineCommand::Logout).unwrap();
    assert!(engine.save(false).is_err());
    assert!(engine.load(id).is_err());
}

#[test]
fn test_engine_rejects_corrupt_save() {
    let dir = TempDir::new().unwrap();
    let mut store = JsonDirStore::open(dir.path()).unwrap();

    let mut record = Game::default().to_record();
    record.board.truncate(7);
    let id = store.create("alice", record).unwrap();

    let cli = Cli::try_parse_from([
        "dropchess",
        "--store",
        dir.path().to_str().unwrap(),
        "--user",
        "alice",
    ])
    .unwrap();
    let mut engine = Engine::from_cli(&cli).unwrap();
    let before = engine.game().clone();

    assert!(engine.load(id).is_err());
    assert_eq!(engine.game(), &before);
}
