use crate::core::GravityType;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Broad-phase algorithm used to find candidate pairs
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum BroadPhaseKind {
    /// Sort-and-sweep along the x axis
    SweepAndPrune,

    /// Uniform grid with the given cell size
    SpatialHash {
        /// Edge length of a grid cell
        cell_size: f32,
    },

    /// Test every pair; reference implementation for small scenes
    BruteForce,
}

impl Default for BroadPhaseKind {
    fn default() -> Self {
        Self::SweepAndPrune
    }
}

/// Configuration parameters for the physics simulation
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// The fixed time step for the simulation
    pub time_step: f32,

    /// The maximum number of substeps for variable time step simulation
    pub max_substeps: u32,

    /// The gravity applied to every body that doesn't ignore it
    pub gravity: GravityType,

    /// Solver iterations over all contacts and joints per step
    pub solver_iterations: u32,

    /// Fraction of the penetration resolved per step
    pub bias_factor: f32,

    /// Penetration tolerated without correction
    pub allowed_penetration: f32,

    /// Keep position correction out of the real velocity
    pub split_impulse: bool,

    /// Seed each step's contact impulses from the previous step
    pub warm_starting: bool,

    /// Closing speed below which contacts do not bounce
    pub restitution_velocity_threshold: f32,

    /// Sliding speed below which static friction applies
    pub static_friction_threshold: f32,

    /// Broad-phase algorithm
    pub broad_phase: BroadPhaseKind,

    /// Bounding boxes are swept by `velocity * dt * velocity_margin`
    pub velocity_margin: f32,

    /// Steps a pair may spend apart and still continue as the same contact,
    /// keeping its warm-start impulses and reporting Persist instead of
    /// End and Begin. Zero ends a pair on the first step apart.
    pub contact_retention_steps: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_step: 1.0 / 60.0,
            max_substeps: 10,
            gravity: GravityType::default(),
            solver_iterations: 12,
            bias_factor: 0.7,
            allowed_penetration: 0.01,
            split_impulse: true,
            warm_starting: true,
            restitution_velocity_threshold: 1.0,
            static_friction_threshold: 1.0,
            broad_phase: BroadPhaseKind::default(),
            velocity_margin: 1.0,
            contact_retention_steps: 0,
        }
    }
}
