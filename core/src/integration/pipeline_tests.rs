//! End-to-end record → store → load → play tests

use glam::Vec2;
use tempfile::TempDir;

use super::sim::{scene, step};
use crate::replay::{
    Archetype, FileStorage, HeaderEvent, MemoryStorage, Player, PlayerConfig, Recorder,
    RecorderConfig, RecordingStats, RecordingStorage, Rgba, ShapeKind,
};
use crate::test_utils::{CountingScene, TestEntity};

const DT: f64 = 0.125;

/// Record `scene()` for one second, pressing space on the third tick
fn record_one_second(storage: &dyn RecordingStorage, target: &str) -> RecordingStats {
    let mut recorder = Recorder::new(RecorderConfig::default());
    recorder.start(storage, target, 800, 600).unwrap();

    let mut entities = scene();
    for tick in 1..=8 {
        step(&mut entities, DT as f32);
        let keys: &[i32] = if tick == 3 { &[32] } else { &[] };
        recorder.update(DT, &entities, keys);
    }

    recorder.stop().unwrap()
}

fn assert_plays_back(player: &mut Player<CountingScene>) {
    player.advance(0.75);
    let entities = player.entities();
    assert_eq!(entities.len(), 3);

    assert_eq!(entities[0].archetype, Archetype::PlayerAvatar);
    assert_eq!(entities[0].position, Vec2::new(400.0, 300.0));

    assert!(matches!(entities[1].archetype, Archetype::Enemy { .. }));
    // Keyframe at 0.5 had x=5; 0.25s later at 10/s
    assert_eq!(entities[1].position, Vec2::new(7.5, 0.0));

    assert_eq!(
        entities[2].archetype,
        Archetype::Generic {
            kind: ShapeKind::Circle,
            size: Vec2::splat(5.0),
            color: Rgba::new(0.5, 0.5, 1.0, 0.8),
        }
    );
    assert_eq!(entities[2].position, Vec2::new(50.0, 60.0));
    assert_eq!(player.scene().live(), 3);

    player.advance(10.0);
    assert_eq!(player.clock(), 1.0);
    assert_eq!(player.entities()[1].position, Vec2::new(10.0, 0.0));
}

#[test]
fn test_record_and_play_back_in_memory() {
    let storage = MemoryStorage::new();
    let stats = record_one_second(&storage, "session");

    // Periodic keyframes at 0.5 and 1.0, plus the final one
    assert_eq!(stats.keyframes_emitted, 3);
    assert_eq!(stats.inputs_emitted, 1);
    assert_eq!(stats.lines_written, 5);
    assert_eq!(stats.lines_dropped, 0);

    let mut player = Player::new(CountingScene::default(), PlayerConfig::default());
    let summary = player.load(&storage, "session").unwrap();
    assert_eq!(summary.header, Some(HeaderEvent::new(800, 600)));
    assert_eq!(summary.keyframes, 3);
    assert_eq!(summary.inputs, 1);
    assert_eq!(summary.skipped_lines, 0);
    assert_eq!(summary.duration, 1.0);
    assert_eq!(player.inputs()[0].keys, vec![32]);

    assert_plays_back(&mut player);
}

#[test]
fn test_record_and_play_back_from_files() {
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::new(dir.path().join("recordings"));
    let stats = record_one_second(&storage, "session");
    assert_eq!(stats.lines_written, 5);

    let file = dir.path().join("recordings").join("session.jsonl");
    let content = std::fs::read_to_string(&file).unwrap();
    assert_eq!(content.lines().count(), 5);
    assert!(content.starts_with(r#"{"type":"header","version":1,"w":800,"h":600}"#));

    let listed = storage.list_available();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "session");
    assert_eq!(listed[0].path.as_deref(), Some(file.as_path()));

    let mut player = Player::new(CountingScene::default(), PlayerConfig::default());
    player.load(&storage, "session").unwrap();
    assert_plays_back(&mut player);
}

#[test]
fn test_every_queued_line_is_durable_after_stop() {
    let storage = MemoryStorage::new();
    let mut recorder = Recorder::new(RecorderConfig {
        keyframe_interval_secs: 0.0,
        warmup_secs: 0.0,
        ..Default::default()
    });
    recorder.start(&storage, "dense", 320, 240).unwrap();

    let mut entities = scene();
    for _ in 0..500 {
        step(&mut entities, 0.01);
        recorder.update(0.01, &entities, &[65]);
    }
    let stats = recorder.stop().unwrap();

    assert_eq!(stats.lines_dropped, 0);
    assert_eq!(stats.lines_written, stats.lines_enqueued);
    // Header, 500 inputs, 500 keyframes and the final one
    assert_eq!(stats.lines_written, 1002);
    assert_eq!(storage.lines("dense").unwrap().len(), 1002);
}

#[test]
fn test_keyed_entities_match_by_identity_across_despawn() {
    let storage = MemoryStorage::new();
    let mut recorder = Recorder::default();
    recorder.start(&storage, "keyed", 800, 600).unwrap();

    let mut entities: Vec<TestEntity> = (0..3u64)
        .map(|i| {
            TestEntity::new("Enemy", Vec2::new(100.0 * i as f32, 0.0))
                .with_velocity(Vec2::new(10.0, 0.0))
                .with_key(i + 1)
        })
        .collect();

    for tick in 1..=8 {
        if tick == 5 {
            // The first enemy is destroyed after the 0.5s keyframe
            entities.remove(0);
        }
        step(&mut entities, DT as f32);
        recorder.update(DT, &entities, &[]);
    }
    recorder.stop().unwrap();

    let mut player = Player::new(CountingScene::default(), PlayerConfig::default());
    player.load(&storage, "keyed").unwrap();
    player.advance(0.75);

    let positions: Vec<Vec2> = player.entities().iter().map(|e| e.position).collect();
    assert_eq!(
        positions,
        vec![
            // Gone from the next keyframe, so it holds still
            Vec2::new(5.0, 0.0),
            Vec2::new(107.5, 0.0),
            Vec2::new(207.5, 0.0),
        ]
    );
}

#[test]
fn test_unkeyed_entities_match_by_index() {
    let storage = MemoryStorage::new();
    let mut recorder = Recorder::default();
    recorder.start(&storage, "indexed", 800, 600).unwrap();

    let mut entities: Vec<TestEntity> = (0..3)
        .map(|i| {
            TestEntity::new("Enemy", Vec2::new(100.0 * i as f32, 0.0))
                .with_velocity(Vec2::new(10.0, 0.0))
        })
        .collect();

    for tick in 1..=8 {
        if tick == 5 {
            entities.remove(0);
        }
        step(&mut entities, DT as f32);
        recorder.update(DT, &entities, &[]);
    }
    recorder.stop().unwrap();

    let mut player = Player::new(CountingScene::default(), PlayerConfig::default());
    player.load(&storage, "indexed").unwrap();
    player.advance(0.75);

    let positions: Vec<Vec2> = player.entities().iter().map(|e| e.position).collect();
    // Only the first two indices exist in both keyframes
    assert_eq!(
        positions,
        vec![
            Vec2::new(7.5, 0.0),
            Vec2::new(107.5, 0.0),
            Vec2::new(205.0, 0.0),
        ]
    );
}
