use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use phys2d::{
    core::{BroadPhaseKind, GravityType, SimulationConfig},
    shapes::{Circle, Polygon},
    AxleJoint, PhysicsWorld, RigidBody, Vector2,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

const DT: f32 = 1.0 / 60.0;

fn world_with(broad_phase: BroadPhaseKind) -> PhysicsWorld {
    let config = SimulationConfig {
        gravity: GravityType::Constant(Vector2::new(0.0, -1000.0)),
        broad_phase,
        ..SimulationConfig::default()
    };
    let mut world = PhysicsWorld::with_config(config);
    let floor = Polygon::rectangle(4000.0, 50.0).unwrap();
    world.add_body(RigidBody::new_static(floor.into(), Vector2::new(0.0, -25.0)));
    world
}

// Scatter balls over a box above the floor
fn scatter_balls(world: &mut PhysicsWorld, count: usize) {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..count {
        let radius = rng.gen_range(5.0..15.0);
        let position = Vector2::new(rng.gen_range(-1500.0..1500.0), rng.gen_range(50.0..2000.0));
        world.add_body(RigidBody::new(Circle::new(radius).unwrap().into(), position));
    }
}

fn bench_broad_phases(c: &mut Criterion) {
    let mut group = c.benchmark_group("falling_balls");
    group.sample_size(20);

    let kinds = [
        ("sweep_and_prune", BroadPhaseKind::SweepAndPrune),
        ("spatial_hash", BroadPhaseKind::SpatialHash { cell_size: 40.0 }),
        ("brute_force", BroadPhaseKind::BruteForce),
    ];

    for count in [50, 200] {
        for (name, kind) in kinds {
            group.bench_with_input(BenchmarkId::new(name, count), &count, |b, &n| {
                b.iter(|| {
                    let mut world = world_with(kind);
                    scatter_balls(&mut world, n);
                    for _ in 0..30 {
                        world.step(black_box(DT));
                    }
                });
            });
        }
    }
    group.finish();
}

// A chain of balls hanging from a static anchor by axle joints
fn bench_axle_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("axle_chain");

    for links in [10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(links), &links, |b, &n| {
            b.iter(|| {
                let mut world = world_with(BroadPhaseKind::default());
                let anchor = Vector2::new(0.0, 1000.0);
                let mut previous = world.add_body(RigidBody::new_static(Circle::new(5.0).unwrap().into(), anchor));

                for i in 1..=n {
                    let position = anchor + Vector2::new(i as f32 * 20.0, 0.0);
                    let link = world.add_body(RigidBody::new(Circle::new(5.0).unwrap().into(), position));
                    let pivot = position - Vector2::new(10.0, 0.0);
                    world.add_joint(AxleJoint::new(previous, link, pivot)).unwrap();
                    previous = link;
                }

                for _ in 0..30 {
                    world.step(black_box(DT));
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_broad_phases, bench_axle_chain);
criterion_main!(benches);
