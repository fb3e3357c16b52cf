//! Performance benchmarks for critical client systems

use client::game::{PhysicsTuning, World};
use client::input::InputState;
use client::reconciler::Reconciler;
use client::throttle::UpdateThrottler;
use shared::{builtin_levels, PeerId, PeerState, Rect, RosterSnapshot, ServerMessage};
use std::time::{Duration, Instant};

fn roster(count: u64, offset: u64, frame: f32) -> RosterSnapshot {
    RosterSnapshot::from_states((offset..offset + count).map(|i| {
        (
            PeerId::from(i),
            PeerState {
                x: i as f32 * 3.0 + frame,
                y: 100.0 + frame,
                username: format!("player{}", i),
                score: i as i64,
            },
        )
    }))
}

/// Benchmarks rectangle intersection used by platform collision and stomps
#[test]
fn benchmark_rect_intersection() {
    let a = Rect::new(100.0, 100.0, 50.0, 50.0);
    let b = Rect::new(120.0, 140.0, 50.0, 50.0);

    let iterations = 100_000;
    let start = Instant::now();

    let mut hits = 0;
    for _ in 0..iterations {
        if a.intersects(&b) {
            hits += 1;
        }
    }

    let duration = start.elapsed();
    println!(
        "Rect intersection: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert_eq!(hits, iterations);
    // Should complete in under 100ms for 100k iterations
    assert!(duration.as_millis() < 100);
}

/// Benchmarks the local simulation across the built-in levels
#[test]
fn benchmark_local_simulation() {
    let mut world = World::new(builtin_levels(), PhysicsTuning::default());

    let iterations = 10_000;
    let start = Instant::now();

    for i in 0..iterations {
        let input = InputState {
            left: i % 90 < 20,
            right: i % 60 > 25,
            jump: i % 40 == 0,
        };
        world.tick(&input);
    }

    let duration = start.elapsed();
    println!(
        "Local simulation: {} ticks in {:?} ({:.2} μs/tick)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Well under one frame budget per tick
    assert!(duration.as_millis() < 500);
}

/// Benchmarks snapshot application with a large, changing roster
#[test]
fn benchmark_snapshot_churn() {
    let snapshots: Vec<RosterSnapshot> = (0..100)
        .map(|frame| roster(200, frame as u64 * 2, frame as f32))
        .collect();

    let mut reconciler = Reconciler::new();
    reconciler.set_local_id(PeerId::from(0));

    let start = Instant::now();

    for snapshot in &snapshots {
        reconciler.apply_snapshot(snapshot);
    }

    let duration = start.elapsed();
    println!(
        "Snapshot churn: {} snapshots of {} peers in {:?} ({:.2} μs/snapshot)",
        snapshots.len(),
        200,
        duration,
        duration.as_micros() as f64 / snapshots.len() as f64
    );

    assert_eq!(reconciler.len(), 200);
    // Should handle 100 snapshots of 200 peers in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks per-tick smoothing of remote entities
#[test]
fn benchmark_smoothing_advance() {
    let mut reconciler = Reconciler::new();
    reconciler.apply_snapshot(&roster(100, 0, 0.0));
    reconciler.apply_snapshot(&roster(100, 0, 250.0));

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        reconciler.advance(0.1);
    }

    let duration = start.elapsed();
    println!(
        "Smoothing: {} advances of {} entities in {:?} ({:.2} μs/advance)",
        iterations,
        reconciler.len(),
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    for entity in reconciler.entities() {
        assert!((entity.current.y - entity.target.y).abs() < 0.01);
    }
    assert!(duration.as_millis() < 500);
}

/// Benchmarks decoding of full roster broadcasts
#[test]
fn benchmark_roster_decoding() {
    let frame = ServerMessage::PlayerUpdate(roster(50, 0, 0.0))
        .encode()
        .unwrap();

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let ServerMessage::PlayerUpdate(snapshot) = ServerMessage::decode(&frame).unwrap() else {
            panic!("Expected a roster snapshot");
        };
        assert_eq!(snapshot.entries().filter(|(_, state)| state.is_ok()).count(), 50);
    }

    let duration = start.elapsed();
    println!(
        "Roster decoding: {} frames of {} bytes in {:?} ({:.2} μs/frame)",
        iterations,
        frame.len(),
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Stress tests the throttler at a high frame rate
#[test]
fn stress_test_throttler() {
    let mut throttler = UpdateThrottler::new(Duration::from_millis(50));
    let base = Instant::now();

    let start = Instant::now();
    // One simulated second at 1000 frames per second
    let emitted = (0..1000)
        .filter(|ms| throttler.poll(base + Duration::from_millis(*ms)))
        .count();

    let duration = start.elapsed();
    println!("Throttler: 1000 polls in {:?}, {} emissions", duration, emitted);

    assert_eq!(emitted, 20);
    assert!(duration.as_millis() < 100);
}
