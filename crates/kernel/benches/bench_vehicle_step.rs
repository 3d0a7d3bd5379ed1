use std::hint::black_box;
use std::time::Instant;

use toydrive_kernel::{DriveControls, DriveWorld, VehicleSpec};

fn make_world(vehicle_count: usize, spacing: f32) -> DriveWorld {
    let mut world = DriveWorld::new();
    let side = (vehicle_count as f32).sqrt().ceil() as usize;
    for i in 0..vehicle_count {
        let x = (i % side) as f32 * spacing;
        let z = (i / side) as f32 * spacing;
        world.spawn(VehicleSpec {
            position: [x, z],
            ..VehicleSpec::default()
        });
    }
    world
}

fn bench_step(vehicle_count: usize, iterations: usize) {
    let mut world = make_world(vehicle_count, 6.0);
    let controls = DriveControls {
        forward: true,
        turn_left: true,
        ..DriveControls::IDLE
    };

    let start = Instant::now();
    for _ in 0..iterations {
        world.step(black_box(controls));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  step ({vehicle_count} vehicles, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn bench_replay(frames: usize) {
    let mut world = make_world(4, 6.0);
    for i in 0..frames {
        world.step(DriveControls {
            forward: true,
            turn_right: i % 3 == 0,
            ..DriveControls::IDLE
        });
    }
    let events = world.events().to_vec();

    let start = Instant::now();
    let replayed = DriveWorld::replay(*world.tuning(), black_box(&events));
    let elapsed = start.elapsed();
    assert_eq!(replayed.state_hash(), world.state_hash());
    println!("  replay ({frames} frames): {elapsed:?}");
}

fn main() {
    println!("vehicle step benchmarks");
    bench_step(1, 100_000);
    bench_step(64, 10_000);
    bench_step(1024, 1_000);
    bench_replay(10_000);
}
