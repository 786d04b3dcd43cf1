use crate::collision::collision_pair::CollisionPair;
use crate::core::{BodyHandle, BroadPhaseKind};
use crate::math::Aabb;
use std::collections::{HashMap, HashSet};

/// Trait for broad-phase collision detection algorithms.
///
/// Implementations may return pairs whose boxes do not overlap, but must
/// never miss a pair whose boxes do. Touching boxes count as overlapping.
pub trait BroadPhase: Send + Sync {
    /// Returns the name of the algorithm
    fn name(&self) -> &'static str;

    /// Rebuilds the broad-phase from the current proxies
    fn update(&mut self, proxies: &[(BodyHandle, Aabb)]);

    /// Gets all potential collision pairs, sorted
    fn get_collision_pairs(&self) -> Vec<CollisionPair>;
}

/// Creates the broad-phase selected by `kind`
pub fn create_broad_phase(kind: BroadPhaseKind) -> Box<dyn BroadPhase> {
    match kind {
        BroadPhaseKind::SweepAndPrune => Box::new(SweepAndPrune::new()),
        BroadPhaseKind::SpatialHash { cell_size } => Box::new(SpatialHashing::new(cell_size)),
        BroadPhaseKind::BruteForce => Box::new(BruteForceBroadPhase::new()),
    }
}

/// Simple brute-force broad-phase algorithm
#[derive(Debug, Default)]
pub struct BruteForceBroadPhase {
    /// The proxies in the broad-phase
    proxies: Vec<(BodyHandle, Aabb)>,
}

impl BruteForceBroadPhase {
    /// Creates a new brute-force broad-phase
    pub fn new() -> Self {
        Self::default()
    }
}

impl BroadPhase for BruteForceBroadPhase {
    fn name(&self) -> &'static str {
        "BruteForce"
    }

    fn update(&mut self, proxies: &[(BodyHandle, Aabb)]) {
        self.proxies.clear();
        self.proxies.extend_from_slice(proxies);
    }

    fn get_collision_pairs(&self) -> Vec<CollisionPair> {
        let mut pairs = Vec::new();

        for (i, (handle_a, aabb_a)) in self.proxies.iter().enumerate() {
            for (handle_b, aabb_b) in &self.proxies[i + 1..] {
                if aabb_a.intersects(aabb_b) {
                    pairs.push(CollisionPair::new(*handle_a, *handle_b));
                }
            }
        }

        pairs.sort();
        pairs
    }
}

/// Sort-and-sweep along the x axis.
///
/// Proxies are sorted by their lower x bound; each proxy is only tested
/// against the proxies whose x interval is still open.
#[derive(Debug, Default)]
pub struct SweepAndPrune {
    /// Proxies sorted by `min.x`, kept between updates so re-sorting a mostly
    /// sorted list stays cheap
    sorted: Vec<(BodyHandle, Aabb)>,

    /// Pairs found by the last update
    collision_pairs: Vec<CollisionPair>,
}

impl SweepAndPrune {
    /// Creates a new sweep-and-prune broad-phase
    pub fn new() -> Self {
        Self::default()
    }
}

impl BroadPhase for SweepAndPrune {
    fn name(&self) -> &'static str {
        "SweepAndPrune"
    }

    fn update(&mut self, proxies: &[(BodyHandle, Aabb)]) {
        self.sorted.clear();
        self.sorted.extend_from_slice(proxies);
        self.sorted.sort_by(|(_, a), (_, b)| a.min.x.total_cmp(&b.min.x));

        self.collision_pairs.clear();
        let mut active: Vec<usize> = Vec::new();

        for (i, (handle, aabb)) in self.sorted.iter().enumerate() {
            let sorted = &self.sorted;
            active.retain(|&j| sorted[j].1.max.x >= aabb.min.x);

            for &j in &active {
                let (other, other_aabb) = &self.sorted[j];
                if aabb.intersects(other_aabb) {
                    self.collision_pairs.push(CollisionPair::new(*handle, *other));
                }
            }

            active.push(i);
        }

        self.collision_pairs.sort();
    }

    fn get_collision_pairs(&self) -> Vec<CollisionPair> {
        self.collision_pairs.clone()
    }
}

/// Uniform-grid spatial hashing
#[derive(Debug)]
pub struct SpatialHashing {
    /// The cell size (all dimensions)
    cell_size: f32,

    /// The cells containing proxies, by index into `proxies`
    cells: HashMap<(i32, i32), Vec<usize>>,

    /// The proxies in the broad-phase
    proxies: Vec<(BodyHandle, Aabb)>,

    /// Cached collision pairs
    collision_pairs: Vec<CollisionPair>,
}

impl SpatialHashing {
    /// Proxies spanning more cells than this are tested against everything
    const MAX_CELLS_PER_PROXY: i64 = 1024;

    /// Creates a new spatial hashing broad-phase. Non-positive cell sizes
    /// fall back to 1.
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size > 0.0 && cell_size.is_finite() { cell_size } else { 1.0 };
        Self {
            cell_size,
            cells: HashMap::new(),
            proxies: Vec::new(),
            collision_pairs: Vec::new(),
        }
    }

    /// Returns the cell size
    pub fn get_cell_size(&self) -> f32 {
        self.cell_size
    }

    fn cell_coord(&self, value: f32) -> i32 {
        (value / self.cell_size).floor() as i32
    }
}

impl BroadPhase for SpatialHashing {
    fn name(&self) -> &'static str {
        "SpatialHash"
    }

    fn update(&mut self, proxies: &[(BodyHandle, Aabb)]) {
        self.cells.clear();
        self.collision_pairs.clear();
        self.proxies.clear();
        self.proxies.extend_from_slice(proxies);

        let mut oversized = Vec::new();

        for (index, (_, aabb)) in self.proxies.iter().enumerate() {
            let (x0, y0) = (self.cell_coord(aabb.min.x), self.cell_coord(aabb.min.y));
            let (x1, y1) = (self.cell_coord(aabb.max.x), self.cell_coord(aabb.max.y));

            let span = (i64::from(x1) - i64::from(x0) + 1) * (i64::from(y1) - i64::from(y0) + 1);
            if span > Self::MAX_CELLS_PER_PROXY {
                oversized.push(index);
                continue;
            }

            for x in x0..=x1 {
                for y in y0..=y1 {
                    self.cells.entry((x, y)).or_default().push(index);
                }
            }
        }

        let mut candidates = HashSet::new();

        for members in self.cells.values() {
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    candidates.insert((a.min(b), a.max(b)));
                }
            }
        }

        for &a in &oversized {
            for b in 0..self.proxies.len() {
                if a != b {
                    candidates.insert((a.min(b), a.max(b)));
                }
            }
        }

        self.collision_pairs = candidates
            .into_iter()
            .filter(|&(a, b)| self.proxies[a].1.intersects(&self.proxies[b].1))
            .map(|(a, b)| CollisionPair::new(self.proxies[a].0, self.proxies[b].0))
            .collect();

        // Sort the pairs for deterministic behavior
        self.collision_pairs.sort();
    }

    fn get_collision_pairs(&self) -> Vec<CollisionPair> {
        self.collision_pairs.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BodyStorage, Storage};
    use crate::math::Vector2;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    fn proxies(boxes: &[Aabb]) -> Vec<(BodyHandle, Aabb)> {
        let mut storage: BodyStorage<()> = Storage::new();
        boxes.iter().map(|aabb| (storage.add(()), *aabb)).collect()
    }

    fn random_boxes(count: usize, seed: u64) -> Vec<Aabb> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                let center = Vector2::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
                let half = Vector2::new(rng.gen_range(0.5..6.0), rng.gen_range(0.5..6.0));
                Aabb::from_center_half_extents(center, half)
            })
            .collect()
    }

    #[test]
    fn all_algorithms_agree_with_brute_force() {
        let proxies = proxies(&random_boxes(150, 7));

        let mut reference = BruteForceBroadPhase::new();
        reference.update(&proxies);
        let expected = reference.get_collision_pairs();
        assert!(!expected.is_empty());

        let mut others: Vec<Box<dyn BroadPhase>> = vec![
            Box::new(SweepAndPrune::new()),
            Box::new(SpatialHashing::new(8.0)),
            Box::new(SpatialHashing::new(0.25)),
        ];
        for broad_phase in &mut others {
            broad_phase.update(&proxies);
            assert_eq!(broad_phase.get_collision_pairs(), expected, "{}", broad_phase.name());
        }
    }

    #[test]
    fn touching_boxes_are_paired() {
        let proxies = proxies(&[
            Aabb::new(Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0)),
            Aabb::new(Vector2::new(1.0, 0.0), Vector2::new(2.0, 1.0)),
            Aabb::new(Vector2::new(5.0, 5.0), Vector2::new(6.0, 6.0)),
        ]);

        let mut sap = SweepAndPrune::new();
        sap.update(&proxies);
        assert_eq!(sap.get_collision_pairs(), vec![CollisionPair::new(proxies[0].0, proxies[1].0)]);
    }
}
