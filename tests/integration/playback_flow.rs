//! Integration tests for playing recordings into a workspace
//!
//! Each test loads a recording into a `Player`, drives it through a headless
//! `BufferSurface` and checks what ends up on disk and in the state store.

use super::common::workspace::{evolution, step, TestWorkspace};
use live_demo::playback::{PlaybackState, PlayerPhase, Tick};
use live_demo::{
    BufferSurface, Driver, Pacing, PlaybackMode, PlaybackTiming, Player, PlayerError, Recording,
};

fn player(ws: &TestWorkspace, recording: Recording) -> Player {
    Player::new(
        recording,
        ws.path.clone(),
        ws.store.clone(),
        PlaybackTiming::default(),
    )
    .unwrap()
}

fn driver(ws: &TestWorkspace) -> Driver<BufferSurface> {
    Driver::new(BufferSurface::new(ws.path.clone()), Pacing::Immediate)
}

const VERSIONS: [&str; 4] = [
    "fn main() {\n}\n",
    "fn main() {\n    println!(\"hello\");\n}\n",
    "fn main() {\n    let name = \"world\";\n    println!(\"hello {name}\");\n}\n",
    "fn main() {\n    greet(\"world\");\n}\n\nfn greet(name: &str) {\n    println!(\"hello {name}\");\n}\n",
];

/// Playing every step reproduces every recorded version exactly
#[tokio::test]
async fn test_typed_recording_reproduces_each_version() {
    let ws = TestWorkspace::new();
    ws.write("src/main.rs", VERSIONS[0]);
    let mut player = player(&ws, evolution("src/main.rs", &VERSIONS, PlaybackMode::Type));
    let mut driver = driver(&ws);

    for expected in &VERSIONS[1..] {
        player.advance_step().unwrap();
        let outcome = driver.play_step(&mut player).await.unwrap();
        assert_eq!(outcome, Tick::StepFinished);
        assert_eq!(ws.read("src/main.rs"), *expected);
    }

    assert_eq!(player.phase(), PlayerPhase::Finished);
    assert!(matches!(
        player.advance_step(),
        Err(PlayerError::NoSuchStep { index: 3, total: 3 })
    ));
}

/// Pasted steps land in one insert per edit and give the same result
#[tokio::test]
async fn test_pasted_recording_matches_typed_result() {
    let ws = TestWorkspace::new();
    ws.write("src/main.rs", VERSIONS[0]);
    let mut player = player(&ws, evolution("src/main.rs", &VERSIONS, PlaybackMode::Paste));
    let mut driver = driver(&ws);

    while player.has_more_steps() {
        player.advance_step().unwrap();
        driver.play_step(&mut player).await.unwrap();
    }

    assert_eq!(ws.read("src/main.rs"), VERSIONS[3]);
}

/// A start-empty step creates missing directories and types the whole file
#[tokio::test]
async fn test_start_empty_step_creates_and_fills_file() {
    let ws = TestWorkspace::new();
    ws.write("notes/todo.md", "stale content\n");
    let recording = Recording::from_steps(vec![
        step("notes/todo.md", "", "# Todo\n\n- demo\n", PlaybackMode::Type, true),
        step("docs/new/readme.md", "", "hello\n", PlaybackMode::Paste, true),
    ]);
    let mut player = player(&ws, recording);
    let mut driver = driver(&ws);

    player.advance_step().unwrap();
    assert_eq!(ws.read("notes/todo.md"), "", "start-empty truncates up front");
    driver.play_step(&mut player).await.unwrap();
    assert_eq!(ws.read("notes/todo.md"), "# Todo\n\n- demo\n");

    player.advance_step().unwrap();
    assert!(ws.exists("docs/new/readme.md"));
    driver.play_step(&mut player).await.unwrap();
    assert_eq!(ws.read("docs/new/readme.md"), "hello\n");
}

/// A step recorded against slightly different surroundings still applies
#[tokio::test]
async fn test_step_applies_to_drifted_file() {
    let ws = TestWorkspace::new();
    let recorded_before = "a\nb\nc\nd\ne\n";
    let recorded_after = "a\nb\nC\nd\ne\n";
    ws.write("drift.txt", "header\nheader\na\nb\nc\nd\ne\n");
    let recording = Recording::from_steps(vec![step(
        "drift.txt",
        recorded_before,
        recorded_after,
        PlaybackMode::Type,
        false,
    )]);
    let mut player = player(&ws, recording);

    player.advance_step().unwrap();
    driver(&ws).play_step(&mut player).await.unwrap();

    assert_eq!(ws.read("drift.txt"), "header\nheader\na\nb\nC\nd\ne\n");
}

/// A session reloaded mid-step continues where it left off
#[tokio::test]
async fn test_resume_after_restart_mid_step() {
    let ws = TestWorkspace::new();
    ws.write("src/main.rs", VERSIONS[0]);
    let recording = evolution("src/main.rs", &VERSIONS[..2], PlaybackMode::Type);
    let mut player = player(&ws, recording);
    let mut driver = driver(&ws);

    player.advance_step().unwrap();
    for _ in 0..5 {
        assert!(matches!(
            driver.tick(&mut player).unwrap(),
            Tick::Dispatched { .. }
        ));
    }
    let remaining = player.pending().len();
    assert_eq!(player.step_completed(), 5);

    // The host restarts; the editor keeps its unsaved buffer.
    let surface = driver.into_surface();
    drop(player);

    let mut player =
        Player::load(ws.store.clone(), &ws.path, PlaybackTiming::default()).unwrap();
    assert_eq!(player.phase(), PlayerPhase::InStep);
    assert_eq!(player.pending().len(), remaining);
    assert_eq!(player.step_completed(), 5);

    let mut driver = Driver::new(surface, Pacing::Immediate);
    driver.play_step(&mut player).await.unwrap();
    assert_eq!(ws.read("src/main.rs"), VERSIONS[1]);
}

/// A new process with a new editor picks an interrupted step back up
#[tokio::test]
async fn test_resume_with_fresh_persisted_surface() {
    for cut in 1..=5 {
        let ws = TestWorkspace::new();
        ws.write("abc.txt", "abc");
        let recording = Recording::from_steps(vec![step(
            "abc.txt",
            "abc",
            "axc",
            PlaybackMode::Type,
            false,
        )]);
        let mut player = player(&ws, recording);
        let mut driver = Driver::new(
            BufferSurface::with_store(ws.path.clone(), ws.store.clone()),
            Pacing::Immediate,
        );

        player.advance_step().unwrap();
        for _ in 0..cut {
            driver.tick(&mut player).unwrap();
        }
        drop(driver);
        drop(player);

        let mut player =
            Player::load(ws.store.clone(), &ws.path, PlaybackTiming::default()).unwrap();
        let mut driver = Driver::new(
            BufferSurface::with_store(ws.path.clone(), ws.store.clone()),
            Pacing::Immediate,
        );
        assert_eq!(
            driver.play_step(&mut player).await.unwrap(),
            Tick::StepFinished
        );
        assert_eq!(ws.read("abc.txt"), "axc", "interrupted after {cut} instructions");
    }
}

/// Stopping the session from elsewhere halts a driver on its next tick
#[tokio::test]
async fn test_stop_from_another_handle_halts_driver() {
    let ws = TestWorkspace::new();
    ws.write("src/main.rs", VERSIONS[0]);
    let mut player = player(&ws, evolution("src/main.rs", &VERSIONS[..2], PlaybackMode::Type));
    let mut driver = driver(&ws);

    player.advance_step().unwrap();
    driver.tick(&mut player).unwrap();

    Player::load(ws.store.clone(), &ws.path, PlaybackTiming::default())
        .unwrap()
        .stop()
        .unwrap();

    assert_eq!(driver.tick(&mut player).unwrap(), Tick::Stopped);
    assert_eq!(ws.read("src/main.rs"), VERSIONS[0], "nothing was saved");
    assert!(!ws.store.exists::<PlaybackState>(&ws.path));
}

/// A step whose patch cannot be placed leaves the session untouched
#[tokio::test]
async fn test_unapplicable_step_keeps_previous_state() {
    let ws = TestWorkspace::new();
    ws.write("src/main.rs", VERSIONS[0]);
    let mut player = player(&ws, evolution("src/main.rs", &VERSIONS[..3], PlaybackMode::Type));
    let mut driver = driver(&ws);

    player.advance_step().unwrap();
    driver.play_step(&mut player).await.unwrap();

    ws.write("src/main.rs", "something else entirely\n");
    let err = player.advance_step().unwrap_err();
    assert!(matches!(err, PlayerError::Patch { step: 1, .. }));
    assert_eq!(player.current_step_index(), Some(0));

    let reloaded = Player::load(ws.store.clone(), &ws.path, PlaybackTiming::default()).unwrap();
    assert_eq!(reloaded.current_step_index(), Some(0));
    assert!(reloaded.pending().is_empty());
}

/// Reset rewinds to the first step
#[tokio::test]
async fn test_reset_replays_from_the_start() {
    let ws = TestWorkspace::new();
    ws.write("src/main.rs", VERSIONS[0]);
    let mut player = player(&ws, evolution("src/main.rs", &VERSIONS[..2], PlaybackMode::Type));
    let mut driver = driver(&ws);

    player.advance_step().unwrap();
    driver.play_step(&mut player).await.unwrap();
    assert_eq!(player.phase(), PlayerPhase::Finished);

    player.reset().unwrap();
    ws.write("src/main.rs", VERSIONS[0]);
    assert_eq!(player.phase(), PlayerPhase::Unstarted);

    player.advance_step().unwrap();
    driver.play_step(&mut player).await.unwrap();
    assert_eq!(ws.read("src/main.rs"), VERSIONS[1]);
}

/// State written by another schema version is ignored
#[test]
fn test_state_from_other_version_is_ignored() {
    let ws = TestWorkspace::new();
    ws.write("src/main.rs", VERSIONS[0]);
    let _player = player(&ws, evolution("src/main.rs", &VERSIONS[..2], PlaybackMode::Type));

    let path = ws.store.path_for::<PlaybackState>(&ws.path);
    let mut envelope: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    envelope["version"] = serde_json::json!(99);
    std::fs::write(&path, envelope.to_string()).unwrap();

    assert!(Player::load(ws.store.clone(), &ws.path, PlaybackTiming::default()).is_none());
}

/// Sessions in different workspaces do not see each other
#[test]
fn test_sessions_are_scoped_to_workspace() {
    let a = TestWorkspace::new();
    let b = TestWorkspace::new();
    a.write("f.txt", "one\n");
    let store = a.store.clone();
    let _player = Player::new(
        evolution("f.txt", &["one\n", "two\n"], PlaybackMode::Type),
        a.path.clone(),
        store.clone(),
        PlaybackTiming::default(),
    )
    .unwrap();

    assert!(Player::load(store.clone(), &a.path, PlaybackTiming::default()).is_some());
    assert!(Player::load(store, &b.path, PlaybackTiming::default()).is_none());
}
