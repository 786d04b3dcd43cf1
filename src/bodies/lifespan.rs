#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Age tracking for anything the world removes on expiry: bodies, joints
/// and physics logics.
///
/// An expired object stays in its collection until the start of the next
/// step, when the world sweeps it out.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Lifespan {
    age: f32,
    max_age: Option<f32>,
    expired: bool,
}

impl Lifespan {
    /// A lifespan that never expires on its own
    pub fn immortal() -> Self {
        Self::default()
    }

    /// A lifespan that expires once `max_age` seconds have been simulated
    pub fn with_max_age(max_age: f32) -> Self {
        Self {
            age: 0.0,
            max_age: Some(max_age),
            expired: false,
        }
    }

    /// Seconds simulated so far
    pub fn get_age(&self) -> f32 {
        self.age
    }

    /// The maximum age, if any
    pub fn get_max_age(&self) -> Option<f32> {
        self.max_age
    }

    /// Whether the object is marked for removal
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Marks the object for removal at the start of the next step
    pub fn expire(&mut self) {
        self.expired = true;
    }

    /// Advances the age by `dt`, expiring once the maximum age is reached
    pub fn update(&mut self, dt: f32) {
        self.age += dt;
        if let Some(max_age) = self.max_age {
            if self.age >= max_age {
                self.expired = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_after_max_age() {
        let mut life = Lifespan::with_max_age(0.1);
        life.update(0.05);
        assert!(!life.is_expired());
        life.update(0.05);
        assert!(life.is_expired());
    }

    #[test]
    fn immortal_only_expires_explicitly() {
        let mut life = Lifespan::immortal();
        life.update(1.0e6);
        assert!(!life.is_expired());
        life.expire();
        assert!(life.is_expired());
    }
}
