use crate::bodies::RigidBody;
use crate::collision::{
    broad_phase::{create_broad_phase, BroadPhase},
    collision_pair::CollisionPair,
    contact_manifold::ContactManifold,
    narrow_phase::{NarrowPhase, SatNarrowPhase},
};
use crate::core::{
    BodyHandle, BodyStorage, BroadPhaseKind, CollisionEvent, CollisionEventType, EventQueue,
    SimulationConfig, Storage,
};
use crate::math::Aabb;
use std::collections::{HashMap, HashSet};

/// Runs broad and narrow phase each step and tracks which pairs touch
/// across steps
pub struct CollisionDetector {
    /// The broad-phase algorithm to use
    broad_phase: Box<dyn BroadPhase>,

    /// Which algorithm `broad_phase` is, to rebuild it when the config changes
    broad_phase_kind: BroadPhaseKind,

    /// The narrow-phase algorithm to use
    narrow_phase: Box<dyn NarrowPhase>,

    /// This step's manifolds, sorted by pair
    contact_manifolds: Vec<ContactManifold>,

    /// Index of each pair in `contact_manifolds`
    pair_index: HashMap<CollisionPair, usize>,

    /// Pairs that stopped touching, with the number of steps they have
    /// been apart; kept up to `SimulationConfig::contact_retention_steps`
    retained: HashMap<CollisionPair, (ContactManifold, u32)>,
}

impl std::fmt::Debug for CollisionDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionDetector")
            .field("broad_phase", &self.broad_phase.name())
            .field("narrow_phase", &self.narrow_phase.name())
            .field("contact_manifolds", &self.contact_manifolds.len())
            .field("retained", &self.retained.len())
            .finish()
    }
}

impl CollisionDetector {
    /// Creates a detector with the given broad phase and the SAT narrow phase
    pub fn new(broad_phase: BroadPhaseKind) -> Self {
        Self {
            broad_phase: create_broad_phase(broad_phase),
            broad_phase_kind: broad_phase,
            narrow_phase: Box::new(SatNarrowPhase::new()),
            contact_manifolds: Vec::new(),
            pair_index: HashMap::new(),
            retained: HashMap::new(),
        }
    }

    /// Returns the name of the active broad phase
    pub fn broad_phase_name(&self) -> &'static str {
        self.broad_phase.name()
    }

    /// Detects this step's contacts and queues Begin, Persist and End events.
    ///
    /// Bodies that are members of a structure are skipped: the structure's
    /// center body collides on their behalf.
    pub fn update(&mut self, bodies: &BodyStorage<RigidBody>, dt: f32, config: &SimulationConfig, events: &mut EventQueue) {
        if self.broad_phase_kind != config.broad_phase {
            self.broad_phase = create_broad_phase(config.broad_phase);
            self.broad_phase_kind = config.broad_phase;
        }

        let proxies: Vec<(BodyHandle, Aabb)> = bodies
            .iter()
            .filter(|(_, body)| !body.is_expired() && !body.is_structure_member())
            .map(|(handle, body)| {
                let sweep = body.get_linear_velocity() * (dt * config.velocity_margin);
                (handle, body.get_bounds().swept(sweep))
            })
            .collect();

        self.broad_phase.update(&proxies);
        let pairs = self.broad_phase.get_collision_pairs();

        let mut manifolds = self.narrow_phase.detect_collisions(&pairs, bodies);
        manifolds.sort_by_key(|m| m.pair);

        log::trace!(
            "collision pass: {} proxies, {} candidate pairs, {} manifolds",
            proxies.len(),
            pairs.len(),
            manifolds.len()
        );

        let previous = std::mem::take(&mut self.contact_manifolds);
        let previous_index = std::mem::take(&mut self.pair_index);

        for manifold in &mut manifolds {
            let old = previous_index
                .get(&manifold.pair)
                .map(|&i| &previous[i])
                .or_else(|| self.retained.get(&manifold.pair).map(|(old, _)| old));

            if let Some(old) = old {
                if config.warm_starting && !manifold.is_sensor {
                    manifold.warm_start_from(old);
                }
            }

            let event_type = if old.is_some() { CollisionEventType::Persist } else { CollisionEventType::Begin };
            Self::queue_event(bodies, manifold, event_type, events);
        }

        let current: HashSet<CollisionPair> = manifolds.iter().map(|m| m.pair).collect();
        for old in previous.into_iter().filter(|m| !current.contains(&m.pair)) {
            self.retained.insert(old.pair, (old, 0));
        }

        // A pair ends once it has been apart for longer than the retention
        let retention = config.contact_retention_steps;
        let mut ended = Vec::new();
        self.retained.retain(|pair, (old, missed)| {
            if current.contains(pair) {
                return false;
            }
            // Pairs whose body left the world end silently
            if !bodies.contains(pair.body_a) || !bodies.contains(pair.body_b) {
                return false;
            }
            *missed += 1;
            if *missed > retention {
                let mut end = ContactManifold::new(*pair);
                end.is_sensor = old.is_sensor;
                ended.push(end);
                return false;
            }
            true
        });
        ended.sort_by_key(|m| m.pair);
        for end in &ended {
            Self::queue_event(bodies, end, CollisionEventType::End, events);
        }

        self.pair_index = manifolds.iter().enumerate().map(|(i, m)| (m.pair, i)).collect();
        self.contact_manifolds = manifolds;
    }

    fn queue_event(
        bodies: &BodyStorage<RigidBody>,
        manifold: &ContactManifold,
        event_type: CollisionEventType,
        events: &mut EventQueue,
    ) {
        let wants_events = |handle| bodies.get(handle).map_or(false, RigidBody::generates_collision_events);
        if !wants_events(manifold.pair.body_a) && !wants_events(manifold.pair.body_b) {
            return;
        }

        events.add_collision_event(CollisionEvent {
            event_type,
            body_a: manifold.pair.body_a,
            body_b: manifold.pair.body_b,
            contacts: manifold.contacts.clone(),
            is_sensor: manifold.is_sensor,
        });
    }

    /// Forgets all contacts involving `body`, without End events
    pub fn remove_body(&mut self, body: BodyHandle) {
        self.retained.retain(|pair, _| !pair.contains(body));
        let before = self.contact_manifolds.len();
        self.contact_manifolds.retain(|m| !m.pair.contains(body));
        if self.contact_manifolds.len() != before {
            self.pair_index = self.contact_manifolds.iter().enumerate().map(|(i, m)| (m.pair, i)).collect();
        }
    }

    /// Forgets all contacts
    pub fn clear(&mut self) {
        self.contact_manifolds.clear();
        self.pair_index.clear();
        self.retained.clear();
    }

    /// Returns the current contact manifolds
    pub fn get_contact_manifolds(&self) -> &[ContactManifold] {
        &self.contact_manifolds
    }

    /// Returns the current contact manifolds mutably, for the solver
    pub fn get_contact_manifolds_mut(&mut self) -> &mut [ContactManifold] {
        &mut self.contact_manifolds
    }

    /// Returns whether two bodies are touching
    pub fn are_colliding(&self, body_a: BodyHandle, body_b: BodyHandle) -> bool {
        self.pair_index.contains_key(&CollisionPair::new(body_a, body_b))
    }

    /// Returns the contact manifold between two bodies, if any
    pub fn get_contact_manifold(&self, body_a: BodyHandle, body_b: BodyHandle) -> Option<&ContactManifold> {
        self.pair_index
            .get(&CollisionPair::new(body_a, body_b))
            .map(|&i| &self.contact_manifolds[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector2;
    use crate::shapes::Circle;

    fn event_types(events: &EventQueue) -> Vec<CollisionEventType> {
        events.collision_events().map(|e| e.event_type).collect()
    }

    fn setup() -> (CollisionDetector, BodyStorage<RigidBody>, BodyHandle, BodyHandle) {
        let mut bodies: BodyStorage<RigidBody> = Storage::new();
        let still = bodies.add(RigidBody::new(Circle::new(1.0).unwrap().into(), Vector2::zero()));
        let moving = bodies.add(RigidBody::new(Circle::new(1.0).unwrap().into(), Vector2::new(1.5, 0.0)));
        (CollisionDetector::new(BroadPhaseKind::default()), bodies, still, moving)
    }

    fn step(detector: &mut CollisionDetector, bodies: &BodyStorage<RigidBody>, config: &SimulationConfig) -> Vec<CollisionEventType> {
        let mut events = EventQueue::new();
        detector.update(bodies, 1.0 / 60.0, config, &mut events);
        event_types(&events)
    }

    #[test]
    fn pairs_begin_persist_and_end() {
        let (mut detector, mut bodies, _, moving) = setup();
        let config = SimulationConfig::default();

        assert_eq!(step(&mut detector, &bodies, &config), vec![CollisionEventType::Begin]);
        assert_eq!(step(&mut detector, &bodies, &config), vec![CollisionEventType::Persist]);

        bodies.get_mut(moving).unwrap().set_position(Vector2::new(5.0, 0.0));
        assert_eq!(step(&mut detector, &bodies, &config), vec![CollisionEventType::End]);
        assert!(detector.get_contact_manifolds().is_empty());
    }

    #[test]
    fn retained_pairs_survive_short_gaps() {
        let (mut detector, mut bodies, still, moving) = setup();
        let config = SimulationConfig { contact_retention_steps: 2, ..SimulationConfig::default() };

        assert_eq!(step(&mut detector, &bodies, &config), vec![CollisionEventType::Begin]);

        // Apart for two steps, then touching again: still the same contact
        bodies.get_mut(moving).unwrap().set_position(Vector2::new(5.0, 0.0));
        assert!(step(&mut detector, &bodies, &config).is_empty());
        assert!(step(&mut detector, &bodies, &config).is_empty());
        assert!(!detector.are_colliding(moving, still));
        bodies.get_mut(moving).unwrap().set_position(Vector2::new(1.5, 0.0));
        assert_eq!(step(&mut detector, &bodies, &config), vec![CollisionEventType::Persist]);

        // A third step apart ends it
        bodies.get_mut(moving).unwrap().set_position(Vector2::new(5.0, 0.0));
        for _ in 0..2 {
            assert!(step(&mut detector, &bodies, &config).is_empty());
        }
        assert_eq!(step(&mut detector, &bodies, &config), vec![CollisionEventType::End]);
        assert!(step(&mut detector, &bodies, &config).is_empty());
    }

    #[test]
    fn removed_bodies_end_silently() {
        let (mut detector, mut bodies, _, moving) = setup();
        let config = SimulationConfig { contact_retention_steps: 3, ..SimulationConfig::default() };

        step(&mut detector, &bodies, &config);
        bodies.remove(moving);
        detector.remove_body(moving);
        for _ in 0..5 {
            assert!(step(&mut detector, &bodies, &config).is_empty());
        }
    }
}
