use phys2d::{
    PhysicsWorld, RigidBody, Coefficients, AxleJoint,
    shapes::{Circle, Polygon, ShapeKind},
    math::Vector2,
    core::{CollisionEventType, GravityType},
    error::PhysicsError,
};
use approx::assert_relative_eq;
use std::cell::RefCell;
use std::rc::Rc;

const DT: f32 = 1.0 / 60.0;

fn circle(radius: f32, position: Vector2) -> RigidBody {
    RigidBody::new(Circle::new(radius).unwrap().into(), position)
}

fn floor(width: f32, restitution: f32) -> RigidBody {
    // Top face at y = 0
    let mut floor = RigidBody::new_static(Polygon::rectangle(width, 50.0).unwrap().into(), Vector2::new(0.0, -25.0));
    floor.set_restitution(restitution);
    floor
}

#[test]
fn test_rigid_body_creation() {
    let body = circle(1.0, Vector2::new(0.0, 10.0));

    assert_eq!(body.get_position(), Vector2::new(0.0, 10.0));
    assert!(body.get_linear_velocity().is_zero());
    assert_eq!(body.get_angular_velocity(), 0.0);
    assert!(body.get_mass() > 0.0);

    // A circle's inertia is m·r²/2
    assert_relative_eq!(body.get_moment_of_inertia(), 0.5 * body.get_mass(), epsilon = 1e-5);

    let sized = RigidBody::from_dimensions(40.0, 20.0, ShapeKind::Rectangle).unwrap();
    let bounds = sized.get_bounds();
    assert_relative_eq!(bounds.extents(), Vector2::new(40.0, 20.0), epsilon = 1e-4);
}

#[test]
fn test_mass_inverse_invariant() {
    let mut body = circle(2.0, Vector2::zero());

    for mass in [0.001, 0.5, 1.0, 12.0, 1.0e6] {
        body.set_mass(mass).unwrap();
        assert_relative_eq!(body.get_mass() * body.get_inverse_mass(), 1.0, epsilon = 1e-5);
    }

    body.set_mass(f32::INFINITY).unwrap();
    assert_eq!(body.get_inverse_mass(), 0.0);

    body.make_static();
    assert_eq!(body.get_inverse_mass(), 0.0);
    assert_eq!(body.get_inverse_inertia(), 0.0);

    assert!(matches!(body.set_mass(0.0), Err(PhysicsError::InvalidParameter(_))));
    assert!(matches!(body.set_mass(-1.0), Err(PhysicsError::InvalidParameter(_))));
}

#[test]
fn test_gravity_simulation() {
    let mut world = PhysicsWorld::new();
    world.set_gravity(GravityType::Constant(Vector2::new(0.0, -9.81)));
    let handle = world.add_body(circle(1.0, Vector2::new(0.0, 10.0)));

    let mut expected_position = Vector2::new(0.0, 10.0);
    let mut expected_velocity = Vector2::zero();

    for _ in 0..60 {
        world.step(DT);

        // Semi-implicit Euler: velocity first, then position
        expected_velocity.y -= 9.81 * DT;
        expected_position.y += expected_velocity.y * DT;

        let body = world.get_body(handle).unwrap();
        assert_relative_eq!(body.get_position().y, expected_position.y, epsilon = 1e-3);
        assert_relative_eq!(body.get_linear_velocity().y, expected_velocity.y, epsilon = 1e-3);
    }
}

#[test]
fn test_ignores_gravity_flag() {
    let mut world = PhysicsWorld::new();
    world.set_gravity(GravityType::Constant(Vector2::new(0.0, -10.0)));

    let mut floating = circle(1.0, Vector2::zero());
    floating.set_ignores_gravity(true);
    let floating = world.add_body(floating);

    for _ in 0..30 {
        world.step(DT);
    }
    assert_eq!(world.get_body(floating).unwrap().get_position(), Vector2::zero());
}

#[test]
fn test_momentum_conservation() {
    let mut world = PhysicsWorld::new();

    let mut a = circle(1.0, Vector2::new(-3.0, 0.0));
    let mut b = circle(1.0, Vector2::new(3.0, 0.0));
    for body in [&mut a, &mut b] {
        body.set_coefficients(Coefficients::frictionless(1.0));
        body.set_mass(2.0).unwrap();
    }
    a.set_linear_velocity(Vector2::new(10.0, 0.0));
    b.set_linear_velocity(Vector2::new(-10.0, 0.0));
    let a = world.add_body(a);
    let b = world.add_body(b);

    let momentum = |world: &PhysicsWorld| {
        let a = world.get_body(a).unwrap();
        let b = world.get_body(b).unwrap();
        a.get_linear_velocity() * a.get_mass() + b.get_linear_velocity() * b.get_mass()
    };

    for _ in 0..60 {
        world.step(DT);
        assert_relative_eq!(momentum(&world), Vector2::zero(), epsilon = 1e-3);
    }

    // Equal masses with restitution 1 swap velocities
    assert_relative_eq!(world.get_body(a).unwrap().get_linear_velocity().x, -10.0, epsilon = 1e-2);
    assert_relative_eq!(world.get_body(b).unwrap().get_linear_velocity().x, 10.0, epsilon = 1e-2);
}

#[test]
fn test_elastic_bounce_keeps_speed() {
    let mut world = PhysicsWorld::new();
    world.add_body(floor(100.0, 1.0));

    let mut ball = circle(1.0, Vector2::new(0.0, 3.0));
    ball.set_coefficients(Coefficients::frictionless(1.0));
    ball.set_linear_velocity(Vector2::new(0.0, -20.0));
    let ball = world.add_body(ball);

    for _ in 0..30 {
        world.step(DT);
    }

    assert_relative_eq!(world.get_body(ball).unwrap().get_linear_velocity().y, 20.0, epsilon = 1e-2);
}

#[test]
fn test_restitution_above_one_adds_energy() {
    let mut world = PhysicsWorld::new();
    world.add_body(floor(100.0, 1.5));

    let mut ball = circle(1.0, Vector2::new(0.0, 3.0));
    ball.set_coefficients(Coefficients::frictionless(1.5));
    ball.set_linear_velocity(Vector2::new(0.0, -20.0));
    let ball = world.add_body(ball);

    for _ in 0..30 {
        world.step(DT);
    }

    let speed = world.get_body(ball).unwrap().get_linear_velocity().y;
    assert!(speed > 20.0, "restitution 1.5 should speed the ball up, got {}", speed);
    assert_relative_eq!(speed, 30.0, epsilon = 1e-2);
}

#[test]
fn test_inelastic_ball_comes_to_rest() {
    let mut world = PhysicsWorld::new();
    world.set_gravity(GravityType::Constant(Vector2::new(0.0, -10.0)));
    world.add_body(floor(100.0, 0.0));

    let mut ball = circle(1.0, Vector2::new(0.0, 5.0));
    ball.set_restitution(0.0);
    let ball = world.add_body(ball);

    for _ in 0..300 {
        world.step(DT);
    }

    let body = world.get_body(ball).unwrap();
    assert!(body.get_linear_velocity().length() < 0.05);
    // Resting on the floor, within the allowed penetration
    assert_relative_eq!(body.get_position().y, 1.0, epsilon = 0.05);
}

#[test]
fn test_static_body_immovability() {
    let mut world = PhysicsWorld::new();
    world.set_gravity(GravityType::Constant(Vector2::new(0.0, -100.0)));
    let wall = world.add_body(floor(20.0, 0.5));

    {
        let wall = world.get_body_mut(wall).unwrap();
        wall.hit(Vector2::new(1.0e6, 1.0e6));
        wall.push(Vector2::new(0.0, 1.0e9));
    }

    let mut ball = circle(1.0, Vector2::new(0.0, 2.0));
    ball.set_linear_velocity(Vector2::new(5.0, -50.0));
    world.add_body(ball);

    for _ in 0..120 {
        world.step(DT);
        let wall = world.get_body(wall).unwrap();
        assert_eq!(wall.get_linear_velocity(), Vector2::zero());
        assert_eq!(wall.get_angular_velocity(), 0.0);
        assert_eq!(wall.get_position(), Vector2::new(0.0, -25.0));
    }
}

#[test]
fn test_group_ignorer() {
    let mut world = PhysicsWorld::new();

    let spawn = |world: &mut PhysicsWorld, group: i32, x: f32, vx: f32| {
        let mut body = circle(1.0, Vector2::new(x, 0.0));
        body.set_collision_ignore_group(group);
        body.set_linear_velocity(Vector2::new(vx, 0.0));
        world.add_body(body)
    };

    // Same nonzero group: they pass through each other
    let a = spawn(&mut world, 1, -0.5, 1.0);
    let b = spawn(&mut world, 1, 0.5, -1.0);
    // Group 0 never ignores
    let c = spawn(&mut world, 0, -0.5, 1.0);
    let d = spawn(&mut world, 0, 0.5, -1.0);
    // Keep the two experiments apart
    for handle in [c, d] {
        let body = world.get_body_mut(handle).unwrap();
        body.set_position(body.get_position() + Vector2::new(0.0, 100.0));
    }

    world.step(DT);

    assert_eq!(world.get_body(a).unwrap().get_linear_velocity(), Vector2::new(1.0, 0.0));
    assert_eq!(world.get_body(b).unwrap().get_linear_velocity(), Vector2::new(-1.0, 0.0));
    assert!(world.get_body(c).unwrap().get_linear_velocity().x < 1.0);
    assert!(world.get_body(d).unwrap().get_linear_velocity().x > -1.0);
}

#[test]
fn test_collision_events() {
    let mut world = PhysicsWorld::new();
    let ground = world.add_body(floor(100.0, 0.0));
    let mut ball = circle(1.0, Vector2::new(0.0, 0.9));
    ball.set_linear_velocity(Vector2::new(0.0, -12.0));
    let ball = world.add_body(ball);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    world.add_collision_listener(move |_, event| log.borrow_mut().push(event.event_type));

    world.step(DT);
    world.step(DT);
    assert_eq!(*seen.borrow(), vec![CollisionEventType::Begin, CollisionEventType::Persist]);
    assert!(world.are_colliding(ball, ground));

    // Lift the ball away: the pair ends
    {
        let body = world.get_body_mut(ball).unwrap();
        body.set_position(Vector2::new(0.0, 50.0));
        body.stop();
    }
    world.step(DT);
    assert_eq!(seen.borrow().last(), Some(&CollisionEventType::End));
    assert!(!world.are_colliding(ball, ground));
}

#[test]
fn test_deferred_removal_in_callback() {
    let mut world = PhysicsWorld::new();
    world.add_body(floor(100.0, 0.0));
    let ball = world.add_body(circle(1.0, Vector2::new(0.0, 0.9)));

    world.add_collision_listener(move |world, event| {
        if let Some(other) = event.other(ball) {
            world.remove_body(ball).unwrap();
            world.remove_body(other).unwrap();
            // Already flagged bodies can be flagged again
            world.remove_body(ball).unwrap();
        }
    });

    world.step(DT);
    assert_eq!(world.body_count(), 2);

    world.step(DT);
    assert_eq!(world.body_count(), 0);
    assert!(world.get_body(ball).is_err());
}

#[test]
fn test_structure_mass_and_inertia() {
    let mut world = PhysicsWorld::new();
    let structure = world.create_structure(Vector2::new(5.0, 5.0));

    let offsets = [
        Vector2::new(1.0, 0.0),
        Vector2::new(-1.0, 0.0),
        Vector2::new(0.0, 2.0),
        Vector2::new(0.0, -2.0),
    ];
    for offset in offsets {
        let mut member = circle(0.5, Vector2::new(5.0, 5.0) + offset);
        member.set_mass(2.0).unwrap();
        let member = world.add_body(member);
        world.add_to_structure(structure, member).unwrap();
    }

    let view = world.structure(structure).unwrap();
    assert_eq!(view.get().object_count(), 4);
    assert_relative_eq!(view.get_mass(), 8.0);
    assert_relative_eq!(view.get_moment_of_inertia(), 2.0 * (1.0 + 1.0 + 4.0 + 4.0), epsilon = 1e-4);
    assert!(view.is_inside(Vector2::new(6.0, 5.0)));
    assert!(!view.is_inside(Vector2::new(5.0, 5.0)));

    let bounds = view.bounding_rectangle().unwrap();
    assert_relative_eq!(bounds.min, Vector2::new(3.5, 2.5), epsilon = 1e-5);
    assert_relative_eq!(bounds.max, Vector2::new(6.5, 7.5), epsilon = 1e-5);
}

#[test]
fn test_structure_moves_as_one() {
    let mut world = PhysicsWorld::new();
    let structure = world.create_structure(Vector2::zero());
    let left = world.add_body(circle(0.5, Vector2::new(-1.0, 0.0)));
    let right = world.add_body(circle(0.5, Vector2::new(1.0, 0.0)));
    world.add_to_structure(structure, left).unwrap();
    world.add_to_structure(structure, right).unwrap();

    {
        let mut aggregate = world.structure_mut(structure).unwrap();
        aggregate.set_restitution(0.9);
        aggregate.set_velocity(Vector2::new(3.0, 0.0));
    }
    assert_relative_eq!(world.get_body(left).unwrap().get_restitution(), 0.9);

    for _ in 0..60 {
        world.step(DT);
    }

    let left = world.get_body(left).unwrap().get_position();
    let right = world.get_body(right).unwrap().get_position();
    assert_relative_eq!(left, Vector2::new(2.0, 0.0), epsilon = 1e-3);
    assert_relative_eq!(right, Vector2::new(4.0, 0.0), epsilon = 1e-3);
    assert_relative_eq!(world.structure(structure).unwrap().get_position(), Vector2::new(3.0, 0.0), epsilon = 1e-3);
}

#[test]
fn test_pushing_a_member_moves_the_structure() {
    let mut world = PhysicsWorld::new();
    let structure = world.create_structure(Vector2::zero());
    let left = world.add_body(circle(0.5, Vector2::new(-1.0, 0.0)));
    let right = world.add_body(circle(0.5, Vector2::new(1.0, 0.0)));
    world.add_to_structure(structure, left).unwrap();
    world.add_to_structure(structure, right).unwrap();

    for _ in 0..60 {
        world.get_body_mut(left).unwrap().push(Vector2::new(1000.0, 0.0));
        world.step(DT);
        // Queued forces never pile up on a member
        assert!(world.get_body(left).unwrap().get_pending_forces().is_empty());
    }

    // Two unit masses pushed along the line through the center: no spin
    let aggregate = world.structure(structure).unwrap();
    assert_relative_eq!(aggregate.get_velocity(), Vector2::new(500.0, 0.0), epsilon = 1e-2);
    assert_relative_eq!(aggregate.get_angular_velocity(), 0.0, epsilon = 1e-5);
    assert_relative_eq!(world.get_body(right).unwrap().get_linear_velocity(), Vector2::new(500.0, 0.0), epsilon = 1e-2);
}

#[test]
fn test_bounce_peaks_decrease() {
    let mut world = PhysicsWorld::new();
    world.set_gravity(GravityType::Constant(Vector2::new(0.0, -1000.0)));
    world.add_body(floor(2000.0, 0.6));

    let mut ball = circle(25.0, Vector2::new(0.0, 525.0));
    ball.set_mass(12.0).unwrap();
    ball.set_restitution(0.8);
    let ball = world.add_body(ball);

    let mut peaks = Vec::new();
    let mut previous_velocity = 0.0;
    let mut lowest = f32::MAX;

    for _ in 0..300 {
        world.step(DT);
        let body = world.get_body(ball).unwrap();
        let velocity = body.get_linear_velocity().y;
        lowest = lowest.min(body.get_position().y);

        if previous_velocity > 0.0 && velocity <= 0.0 {
            peaks.push(body.get_position().y);
        }
        previous_velocity = velocity;
    }

    // The ball reached the floor without passing through it
    assert!(lowest < 30.0);
    assert!(lowest > 0.0);

    let peaks: Vec<f32> = peaks.into_iter().take(4).collect();
    assert_eq!(peaks.len(), 4, "expected four bounces, got peaks {:?}", peaks);
    assert!(peaks[0] < 525.0);
    for pair in peaks.windows(2) {
        assert!(pair[1] < pair[0], "bounce peaks should decrease: {:?}", peaks);
    }
}

#[test]
fn test_axle_joint_holds_distance() {
    let mut world = PhysicsWorld::new();
    world.set_gravity(GravityType::Constant(Vector2::new(0.0, -100.0)));

    let anchor = world.add_body(RigidBody::new_static(Circle::new(1.0).unwrap().into(), Vector2::zero()));
    let bob = world.add_body(circle(1.0, Vector2::new(10.0, 0.0)));
    world.add_joint(AxleJoint::new(anchor, bob, Vector2::zero())).unwrap();

    for _ in 0..100 {
        world.step(DT);
        let distance = world.get_body(bob).unwrap().get_position().length();
        assert!((distance - 10.0).abs() < 0.5, "pendulum length drifted to {}", distance);
    }

    // It did swing
    assert!(world.get_body(bob).unwrap().get_position().y < -1.0);
}

#[test]
fn test_joint_setup_errors() {
    let mut world = PhysicsWorld::new();
    let a = world.add_body(circle(1.0, Vector2::zero()));
    let b = world.add_body(circle(1.0, Vector2::new(4.0, 0.0)));

    world.remove_body(b).unwrap();
    let result = world.add_joint(AxleJoint::new(a, b, Vector2::new(2.0, 0.0)));
    assert!(matches!(result, Err(PhysicsError::JointSetup(_))));
}
