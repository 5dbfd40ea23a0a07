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
//! Semi-implicit (kick-drift) Euler integrator
//!
//! # Algorithm
//!
//! ```text
//! v(t + dt) = v(t) + (f(t) / m) * dt
//! x(t + dt) = x(t) + v(t + dt) * dt
//! ```
//!
//! The update is split into two backend passes, a kick over the velocity
//! array followed by a drift over the position array. Each particle's drift
//! reads only its own freshly kicked velocity, so the split is arithmetically
//! identical to updating both per particle in one pass.
//!
//! # Properties
//!
//! - **First-order accurate**: global error O(dt)
//! - **Symplectic** when forces are evaluated at the pre-update positions,
//!   which the step ordering guarantees
//! - **Momentum**: conserves total momentum exactly when the forces sum to zero

use super::Integrator;
use crate::backend::ExecutionBackend;
use crate::particles::ParticleSystem;

/// Semi-implicit Euler integrator
///
/// # Example
///
/// ```
/// use nbody_engine::integration::{Integrator, SemiImplicitEuler};
///
/// let integrator = SemiImplicitEuler::new(3600.0);
/// assert_eq!(integrator.timestep(), 3600.0);
/// assert_eq!(integrator.name(), "Semi-implicit Euler");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemiImplicitEuler {
    timestep: f64,
}

impl SemiImplicitEuler {
    /// Create a new integrator with the given timestep
    ///
    /// # Panics
    ///
    /// Panics if timestep is non-positive, NaN, or infinite
    pub fn new(timestep: f64) -> Self {
        assert!(
            timestep > 0.0 && timestep.is_finite(),
            "Timestep must be positive and finite"
        );
        SemiImplicitEuler { timestep }
    }
}

impl Integrator for SemiImplicitEuler {
    fn name(&self) -> &str {
        "Semi-implicit Euler"
    }

    fn timestep(&self) -> f64 {
        self.timestep
    }

    fn set_timestep(&mut self, dt: f64) {
        assert!(dt > 0.0 && dt.is_finite(), "Timestep must be positive and finite");
        self.timestep = dt;
    }

    fn integrate<B: ExecutionBackend>(&self, system: &mut ParticleSystem, backend: &B) {
        let dt = self.timestep;
        let arrays = system.arrays_mut();
        let masses = arrays.mass;
        let forces: &[[f64; 3]] = arrays.force;
        let velocities = arrays.velocity;
        let positions = arrays.position;

        // Kick
        backend.for_each_particle(&mut *velocities, |i, v| {
            let m = masses[i];
            let f = forces[i];
            v[0] += f[0] / m * dt;
            v[1] += f[1] / m * dt;
            v[2] += f[2] / m * dt;
        });

        // Drift
        let velocities: &[[f64; 3]] = velocities;
        backend.for_each_particle(positions, |i, p| {
            let v = velocities[i];
            p[0] += v[0] * dt;
            p[1] += v[1] * dt;
            p[2] += v[2] * dt;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SequentialBackend;
    use crate::particles::{Force, Mass, Position, Velocity};

    fn single(mass: f64, velocity: Velocity, force: Force) -> ParticleSystem {
        let mut system = ParticleSystem::new();
        system.push_with_force(Mass::new(mass), Position::zero(), velocity, force);
        system
    }

    #[test]
    #[should_panic(expected = "Timestep must be positive and finite")]
    fn test_zero_timestep() {
        SemiImplicitEuler::new(0.0);
    }

    #[test]
    #[should_panic(expected = "Timestep must be positive and finite")]
    fn test_set_nan_timestep() {
        let mut integrator = SemiImplicitEuler::new(1.0);
        integrator.set_timestep(f64::NAN);
    }

    #[test]
    fn test_tiny_timestep_warning() {
        let integrator = SemiImplicitEuler::new(1e-15);
        let warning = integrator.validate_timestep().unwrap_err();
        assert!(warning.contains("extremely small"));
        assert!(SemiImplicitEuler::new(0.01).validate_timestep().is_ok());
    }

    #[test]
    fn test_kick_then_drift() {
        // a = f/m = 2, dt = 0.5: v = 1 + 2*0.5 = 2, x = 0 + 2*0.5 = 1
        let mut system = single(3.0, Velocity::new(1.0, 0.0, 0.0), Force::new(6.0, 0.0, 0.0));
        SemiImplicitEuler::new(0.5).integrate(&mut system, &SequentialBackend);
        assert_eq!(system.velocity(0), Velocity::new(2.0, 0.0, 0.0));
        assert_eq!(system.position(0), Position::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_free_particle_moves_uniformly() {
        let mut system = single(1.0, Velocity::new(1.5, -0.5, 0.25), Force::zero());
        let integrator = SemiImplicitEuler::new(0.125);
        for _ in 0..8 {
            integrator.integrate(&mut system, &SequentialBackend);
        }
        assert_eq!(system.velocity(0), Velocity::new(1.5, -0.5, 0.25));
        assert_eq!(system.position(0), Position::new(1.5, -0.5, 0.25));
    }

    #[test]
    fn test_forces_are_left_untouched() {
        let mut system = single(2.0, Velocity::zero(), Force::new(1.0, 2.0, 3.0));
        SemiImplicitEuler::new(1.0).integrate(&mut system, &SequentialBackend);
        assert_eq!(system.force(0), Force::new(1.0, 2.0, 3.0));
    }
}
