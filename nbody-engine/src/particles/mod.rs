// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Particle state container
//!
//! [`ParticleSystem`] owns every per-particle quantity as a parallel array
//! (structure-of-arrays) rather than a vector of particle structs. The force
//! and integration passes each touch one or two arrays at a time, so the
//! layout keeps their working sets contiguous and lets a backend hand out
//! disjoint mutable slices of a single array to its workers.
//!
//! A particle's index is its identity: it fixes the order of force
//! accumulation and the order of every serialized record. The particle count
//! never changes once a run has started.

mod components;
mod init;

pub use components::{Force, Mass, Position, Velocity};
pub use init::{RandomInit, ValueRange, AU, PRESET_NAMES};

use crate::error::{Error, Result};

/// Parallel-array storage for N point masses
///
/// # Examples
///
/// ```
/// use nbody_engine::particles::{Mass, ParticleSystem, Position, Velocity};
///
/// let mut system = ParticleSystem::new();
/// system.push(Mass::new(1.0), Position::new(0.0, 0.0, 0.0), Velocity::zero());
/// system.push(Mass::new(2.0), Position::new(1.0, 0.0, 0.0), Velocity::zero());
/// assert_eq!(system.len(), 2);
/// assert_eq!(system.mass(1).value(), 2.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleSystem {
    mass: Vec<f64>,
    position: Vec<[f64; 3]>,
    velocity: Vec<[f64; 3]>,
    force: Vec<[f64; 3]>,
}

/// Simultaneous borrows of every array, used by the step passes
///
/// Masses and positions are shared while forces are written, and forces and
/// masses are shared while velocities are written, so the arrays are lent out
/// individually instead of through `&mut ParticleSystem`.
pub(crate) struct ParticleArrays<'a> {
    pub mass: &'a [f64],
    pub position: &'a mut [[f64; 3]],
    pub velocity: &'a mut [[f64; 3]],
    pub force: &'a mut [[f64; 3]],
}

impl ParticleSystem {
    /// Create an empty particle system
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty particle system with room for `capacity` particles
    pub fn with_capacity(capacity: usize) -> Self {
        ParticleSystem {
            mass: Vec::with_capacity(capacity),
            position: Vec::with_capacity(capacity),
            velocity: Vec::with_capacity(capacity),
            force: Vec::with_capacity(capacity),
        }
    }

    /// Number of particles (N)
    pub fn len(&self) -> usize {
        self.mass.len()
    }

    /// Whether the system holds no particles
    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }

    /// Append a particle with zero force
    ///
    /// Only meaningful while building a system; a running simulation keeps N
    /// fixed.
    pub fn push(&mut self, mass: Mass, position: Position, velocity: Velocity) {
        self.push_with_force(mass, position, velocity, Force::zero());
    }

    /// Append a particle with an explicit force accumulator value
    pub fn push_with_force(&mut self, mass: Mass, position: Position, velocity: Velocity, force: Force) {
        self.mass.push(mass.value());
        self.position.push(position.as_array());
        self.velocity.push(velocity.as_array());
        self.force.push(force.as_array());
    }

    /// Mass of particle `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn mass(&self, index: usize) -> Mass {
        Mass::new(self.mass[index])
    }

    /// Replace the mass of particle `index`
    pub fn set_mass(&mut self, index: usize, mass: Mass) {
        self.mass[index] = mass.value();
    }

    /// Position of particle `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn position(&self, index: usize) -> Position {
        Position::from_array(self.position[index])
    }

    /// Replace the position of particle `index`
    pub fn set_position(&mut self, index: usize, position: Position) {
        self.position[index] = position.as_array();
    }

    /// Velocity of particle `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn velocity(&self, index: usize) -> Velocity {
        Velocity::from_array(self.velocity[index])
    }

    /// Replace the velocity of particle `index`
    pub fn set_velocity(&mut self, index: usize, velocity: Velocity) {
        self.velocity[index] = velocity.as_array();
    }

    /// Force accumulated on particle `index` by the last force pass
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn force(&self, index: usize) -> Force {
        Force::from_array(self.force[index])
    }

    /// Replace the force accumulator of particle `index`
    pub fn set_force(&mut self, index: usize, force: Force) {
        self.force[index] = force.as_array();
    }

    /// All masses, in particle order
    pub fn masses(&self) -> &[f64] {
        &self.mass
    }

    /// All positions, in particle order
    pub fn positions(&self) -> &[[f64; 3]] {
        &self.position
    }

    /// All velocities, in particle order
    pub fn velocities(&self) -> &[[f64; 3]] {
        &self.velocity
    }

    /// All force accumulators, in particle order
    pub fn forces(&self) -> &[[f64; 3]] {
        &self.force
    }

    /// Reset every force accumulator to zero
    pub fn clear_forces(&mut self) {
        self.force.fill([0.0; 3]);
    }

    pub(crate) fn arrays_mut(&mut self) -> ParticleArrays<'_> {
        ParticleArrays {
            mass: &self.mass,
            position: &mut self.position,
            velocity: &mut self.velocity,
            force: &mut self.force,
        }
    }

    /// Copy every array from `other`, reusing this system's allocations
    ///
    /// Both systems must already hold the same number of particles.
    pub(crate) fn copy_from(&mut self, other: &ParticleSystem) {
        self.mass.copy_from_slice(&other.mass);
        self.position.copy_from_slice(&other.position);
        self.velocity.copy_from_slice(&other.velocity);
        self.force.copy_from_slice(&other.force);
    }

    /// Check that the system can be simulated
    ///
    /// Every mass must be positive and finite and every position and velocity
    /// finite. An empty system is rejected as well. The first offending
    /// particle is named in the error.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::config("particle system must contain at least one particle"));
        }
        for index in 0..self.len() {
            let mass = self.mass[index];
            if !(mass > 0.0 && mass.is_finite()) {
                return Err(Error::config(format!(
                    "particle {index} has non-positive or non-finite mass {mass}"
                )));
            }
            if !self.position(index).is_valid() {
                return Err(Error::config(format!("particle {index} has a non-finite position")));
            }
            if !self.velocity(index).is_valid() {
                return Err(Error::config(format!("particle {index} has a non-finite velocity")));
            }
        }
        Ok(())
    }
}
