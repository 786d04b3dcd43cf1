use bitflags::bitflags;
use crate::bodies::RigidBody;
use crate::error::PhysicsError;
use crate::math::{Aabb, Vector2};
use crate::Result;
use std::any::Any;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

bitflags! {
    /// The 32 collision ignore groups of a [`GroupIgnorer`], group `n` being bit `n - 1`
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
    pub struct CollisionGroup: u32 {
        const GROUP1  = 1 << 0;
        const GROUP2  = 1 << 1;
        const GROUP3  = 1 << 2;
        const GROUP4  = 1 << 3;
        const GROUP5  = 1 << 4;
        const GROUP6  = 1 << 5;
        const GROUP7  = 1 << 6;
        const GROUP8  = 1 << 7;
        const GROUP9  = 1 << 8;
        const GROUP10 = 1 << 9;
        const GROUP11 = 1 << 10;
        const GROUP12 = 1 << 11;
        const GROUP13 = 1 << 12;
        const GROUP14 = 1 << 13;
        const GROUP15 = 1 << 14;
        const GROUP16 = 1 << 15;
        const GROUP17 = 1 << 16;
        const GROUP18 = 1 << 17;
        const GROUP19 = 1 << 18;
        const GROUP20 = 1 << 19;
        const GROUP21 = 1 << 20;
        const GROUP22 = 1 << 21;
        const GROUP23 = 1 << 22;
        const GROUP24 = 1 << 23;
        const GROUP25 = 1 << 24;
        const GROUP26 = 1 << 25;
        const GROUP27 = 1 << 26;
        const GROUP28 = 1 << 27;
        const GROUP29 = 1 << 28;
        const GROUP30 = 1 << 29;
        const GROUP31 = 1 << 30;
        const GROUP32 = 1 << 31;
    }
}

impl CollisionGroup {
    /// Highest supported group index
    pub const MAX_INDEX: i32 = 32;

    /// Returns the flag for a 1-based group index.
    ///
    /// Fails for indices outside `1..=32`.
    pub fn from_index(index: i32) -> Result<Self> {
        if index > Self::MAX_INDEX {
            return Err(PhysicsError::InvalidParameter(format!(
                "a maximum of {} collision groups is supported, got group {}",
                Self::MAX_INDEX,
                index
            )));
        }
        if index <= 0 {
            return Err(PhysicsError::InvalidParameter(format!(
                "collision group indexes start from 1, got group {}",
                index
            )));
        }
        Ok(Self::from_bits_retain(1u32 << (index - 1)))
    }
}

/// A collision filter policy attached to a body.
///
/// `can_collide` answers for the body that owns the ignorer (`this`). See
/// [`can_collide`] for how the two sides of a pair are combined.
pub trait Ignorer: Send + Sync + Debug + 'static {
    /// Returns the type name of the ignorer
    fn ignorer_type(&self) -> &'static str;

    /// Whether this ignorer must also be consulted when its body is the
    /// second body of a pair. Symmetric policies return true; one-sided
    /// policies such as one-way platforms return false.
    fn both_needed(&self) -> bool;

    /// Returns whether `this` may collide with `other`, given the other
    /// body's ignorer
    fn can_collide(&self, this: &RigidBody, other: &RigidBody, other_ignorer: Option<&dyn Ignorer>) -> bool;

    /// Returns a dynamic reference to any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Returns a dynamic mutable reference to any for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Clone the ignorer to create a new box
    fn clone_ignorer(&self) -> Box<dyn Ignorer>;
}

/// An [`Ignorer`] as attached to a body, with an optional inversion of its answer
#[derive(Debug)]
pub struct CollisionIgnorer {
    ignorer: Box<dyn Ignorer>,
    inverted: bool,
}

impl Clone for CollisionIgnorer {
    fn clone(&self) -> Self {
        Self {
            ignorer: self.ignorer.clone_ignorer(),
            inverted: self.inverted,
        }
    }
}

impl CollisionIgnorer {
    /// Wraps an ignorer
    pub fn new(ignorer: impl Ignorer) -> Self {
        Self {
            ignorer: Box::new(ignorer),
            inverted: false,
        }
    }

    /// Wraps an ignorer with its answer flipped
    pub fn inverted(ignorer: impl Ignorer) -> Self {
        Self {
            ignorer: Box::new(ignorer),
            inverted: true,
        }
    }

    /// Returns the wrapped ignorer
    pub fn get(&self) -> &dyn Ignorer {
        self.ignorer.as_ref()
    }

    /// Returns the wrapped ignorer mutably
    pub fn get_mut(&mut self) -> &mut dyn Ignorer {
        self.ignorer.as_mut()
    }

    /// Returns whether the answer is flipped
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Sets whether the answer is flipped
    pub fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    /// Returns whether the wrapped ignorer must be consulted from both sides
    pub fn both_needed(&self) -> bool {
        self.ignorer.both_needed()
    }

    /// The wrapped ignorer's answer for `this`, flipped when inverted
    pub fn check(&self, this: &RigidBody, other: &RigidBody, other_ignorer: Option<&CollisionIgnorer>) -> bool {
        self.inverted ^ self.ignorer.can_collide(this, other, other_ignorer.map(CollisionIgnorer::get))
    }
}

/// Decides whether two bodies may collide.
///
/// The first body's ignorer is always consulted. The second body's ignorer
/// is consulted only if it is [`Ignorer::both_needed`]. Each ignorer's
/// inversion flips only its own answer.
pub fn can_collide(a: &RigidBody, b: &RigidBody) -> bool {
    let a_ignorer = a.get_ignorer();
    let b_ignorer = b.get_ignorer();

    let a_allows = a_ignorer.map_or(true, |i| i.check(a, b, b_ignorer));
    let b_allows = b_ignorer.map_or(true, |i| !i.both_needed() || i.check(b, a, a_ignorer));

    a_allows && b_allows
}

/// Like [`can_collide`], but independent of pair order: a body whose
/// ignorer is one-sided is always treated as the first body, so its veto
/// is never skipped.
pub fn pair_can_collide(a: &RigidBody, b: &RigidBody) -> bool {
    let one_sided = |body: &RigidBody| body.get_ignorer().map_or(false, |i| !i.both_needed());
    if one_sided(b) && !one_sided(a) {
        can_collide(b, a)
    } else {
        can_collide(a, b)
    }
}

/// Group-based filtering.
///
/// Two bodies with group ignorers never collide when they share a non-zero
/// legacy group, or when their ignore masks share any group. Bodies whose
/// other side has no group ignorer always pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupIgnorer {
    legacy_group: i32,
    ignore_mask: CollisionGroup,
}

impl GroupIgnorer {
    /// Creates an ignorer in no groups
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an ignorer in the given groups
    pub fn with_groups(groups: &[i32]) -> Result<Self> {
        let mut ignorer = Self::new();
        for &group in groups {
            ignorer.add_group(group)?;
        }
        Ok(ignorer)
    }

    /// Returns the legacy group (0 = none)
    pub fn get_legacy_group(&self) -> i32 {
        self.legacy_group
    }

    /// Sets the legacy group (0 = none)
    pub fn set_legacy_group(&mut self, group: i32) {
        self.legacy_group = group;
    }

    /// Returns the ignore mask
    pub fn get_ignore_mask(&self) -> CollisionGroup {
        self.ignore_mask
    }

    /// Adds a group (1..=32) to the ignore mask
    pub fn add_group(&mut self, group: i32) -> Result<()> {
        self.ignore_mask |= CollisionGroup::from_index(group)?;
        Ok(())
    }

    /// Removes a group (1..=32) from the ignore mask
    pub fn remove_group(&mut self, group: i32) -> Result<()> {
        self.ignore_mask &= !CollisionGroup::from_index(group)?;
        Ok(())
    }

    /// Returns whether the ignorer is in `group`, either as its legacy group
    /// or in its mask
    pub fn test_group_ignore(&self, group: i32) -> Result<bool> {
        if self.legacy_group != 0 && self.legacy_group == group {
            return Ok(true);
        }
        Ok(self.ignore_mask.contains(CollisionGroup::from_index(group)?))
    }
}

impl Ignorer for GroupIgnorer {
    fn ignorer_type(&self) -> &'static str {
        "GroupIgnorer"
    }

    fn both_needed(&self) -> bool {
        true
    }

    fn can_collide(&self, _this: &RigidBody, _other: &RigidBody, other_ignorer: Option<&dyn Ignorer>) -> bool {
        let other = match other_ignorer.and_then(|i| i.as_any().downcast_ref::<GroupIgnorer>()) {
            Some(other) => other,
            None => return true,
        };

        let legacy_allows = self.legacy_group == 0
            || other.legacy_group == 0
            || self.legacy_group != other.legacy_group;

        legacy_allows && !self.ignore_mask.intersects(other.ignore_mask)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_ignorer(&self) -> Box<dyn Ignorer> {
        Box::new(self.clone())
    }
}

static NEXT_OBJECT_IGNORER_ID: AtomicU64 = AtomicU64::new(1);

/// Bodies carrying clones of the same `ObjectIgnorer` never collide with
/// each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectIgnorer {
    id: u64,
}

impl ObjectIgnorer {
    /// Creates a new, distinct ignorer instance
    pub fn new() -> Self {
        Self {
            id: NEXT_OBJECT_IGNORER_ID.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl Default for ObjectIgnorer {
    fn default() -> Self {
        Self::new()
    }
}

impl Ignorer for ObjectIgnorer {
    fn ignorer_type(&self) -> &'static str {
        "ObjectIgnorer"
    }

    fn both_needed(&self) -> bool {
        true
    }

    fn can_collide(&self, _this: &RigidBody, _other: &RigidBody, other_ignorer: Option<&dyn Ignorer>) -> bool {
        other_ignorer
            .and_then(|i| i.as_any().downcast_ref::<ObjectIgnorer>())
            .map_or(true, |other| other.id != self.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_ignorer(&self) -> Box<dyn Ignorer> {
        Box::new(self.clone())
    }
}

/// A platform that can be passed through in one direction.
///
/// Attach it to the platform. Bodies moving along `allowed_direction`
/// (up by default) pass through it; the platform only collides with bodies
/// that are entirely on its far side, within `depth_allowed` of tolerance.
/// Bodies that ignore physics logics always collide.
#[derive(Debug, Clone, PartialEq)]
pub struct OneWayPlatformIgnorer {
    allowed_direction: Vector2,
    depth_allowed: f32,
}

impl OneWayPlatformIgnorer {
    /// A platform passable from below, with the given tolerance
    pub fn new(depth_allowed: f32) -> Self {
        Self::with_direction(Vector2::unit_y(), depth_allowed)
    }

    /// A platform passable along `allowed_direction`
    pub fn with_direction(allowed_direction: Vector2, depth_allowed: f32) -> Self {
        Self {
            allowed_direction: allowed_direction.try_normalize().unwrap_or_else(Vector2::unit_y),
            depth_allowed,
        }
    }

    /// Returns the direction bodies may pass in
    pub fn get_allowed_direction(&self) -> Vector2 {
        self.allowed_direction
    }

    /// Returns the penetration tolerance
    pub fn get_depth_allowed(&self) -> f32 {
        self.depth_allowed
    }

    fn project(&self, aabb: &Aabb) -> (f32, f32) {
        let corners = [
            aabb.min,
            aabb.max,
            Vector2::new(aabb.min.x, aabb.max.y),
            Vector2::new(aabb.max.x, aabb.min.y),
        ];
        corners.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), c| {
            let d = c.dot(&self.allowed_direction);
            (lo.min(d), hi.max(d))
        })
    }
}

impl Ignorer for OneWayPlatformIgnorer {
    fn ignorer_type(&self) -> &'static str {
        "OneWayPlatformIgnorer"
    }

    fn both_needed(&self) -> bool {
        false
    }

    fn can_collide(&self, this: &RigidBody, other: &RigidBody, _other_ignorer: Option<&dyn Ignorer>) -> bool {
        if other.ignores_physics_logics() {
            return true;
        }

        let (_, platform_far) = self.project(&this.get_bounds());
        let (other_near, _) = self.project(&other.get_bounds());

        other_near + self.depth_allowed >= platform_far
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_ignorer(&self) -> Box<dyn Ignorer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Polygon;

    fn boxed(y: f32) -> RigidBody {
        RigidBody::new(Polygon::rectangle(2.0, 2.0).unwrap().into(), Vector2::new(0.0, y))
    }

    fn with_group(y: f32, legacy: i32, groups: &[i32]) -> RigidBody {
        let mut body = boxed(y);
        let mut ignorer = GroupIgnorer::with_groups(groups).unwrap();
        ignorer.set_legacy_group(legacy);
        body.set_ignorer(Some(CollisionIgnorer::new(ignorer)));
        body
    }

    #[test]
    fn group_index_range_is_checked() {
        let mut ignorer = GroupIgnorer::new();
        assert!(ignorer.add_group(0).is_err());
        assert!(ignorer.add_group(33).is_err());
        assert!(ignorer.remove_group(-1).is_err());
        assert!(ignorer.test_group_ignore(40).is_err());
        assert!(ignorer.add_group(32).is_ok());
        assert_eq!(ignorer.test_group_ignore(32).ok(), Some(true));
    }

    #[test]
    fn shared_legacy_group_blocks_collision() {
        let a = with_group(0.0, 2, &[]);
        let b = with_group(0.0, 2, &[]);
        let c = with_group(0.0, 3, &[]);
        let zero = with_group(0.0, 0, &[]);

        assert!(!can_collide(&a, &b));
        assert!(can_collide(&a, &c));
        assert!(can_collide(&zero, &zero.clone()));
    }

    #[test]
    fn overlapping_masks_block_collision() {
        let a = with_group(0.0, 0, &[1, 5]);
        let b = with_group(0.0, 0, &[5]);
        let c = with_group(0.0, 0, &[2]);

        assert!(!can_collide(&a, &b));
        assert!(!can_collide(&b, &a));
        assert!(can_collide(&a, &c));
    }

    #[test]
    fn inversion_flips_only_its_own_side() {
        let mut a = with_group(0.0, 0, &[1]);
        let b = with_group(0.0, 0, &[2]);
        a.get_ignorer_mut().unwrap().set_inverted(true);

        // a's inverted answer vetoes; b's own answer still allows
        assert!(!can_collide(&a, &b));
        assert!(!can_collide(&b, &a));
    }

    #[test]
    fn object_ignorer_clones_ignore_each_other() {
        let shared = ObjectIgnorer::new();
        let mut a = boxed(0.0);
        let mut b = boxed(0.0);
        let mut c = boxed(0.0);
        a.set_ignorer(Some(CollisionIgnorer::new(shared.clone())));
        b.set_ignorer(Some(CollisionIgnorer::new(shared)));
        c.set_ignorer(Some(CollisionIgnorer::new(ObjectIgnorer::new())));

        assert!(!can_collide(&a, &b));
        assert!(can_collide(&a, &c));
    }

    #[test]
    fn one_way_platform_is_only_consulted_from_its_own_side() {
        let mut platform = boxed(0.0);
        platform.set_ignorer(Some(CollisionIgnorer::new(OneWayPlatformIgnorer::new(0.1))));
        let below = boxed(-1.5);
        let above = boxed(2.05);

        assert!(!can_collide(&platform, &below));
        assert!(can_collide(&platform, &above));
        // Not both-needed: as the second body its veto is skipped
        assert!(can_collide(&below, &platform));
        assert!(!pair_can_collide(&below, &platform));
        assert!(pair_can_collide(&above, &platform));
    }
}
