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
//! Numerical integration methods for the step loop
//!
//! An integrator consumes the forces written by the force pass and advances
//! velocity and position by one timestep. Integrators are backend-agnostic:
//! each update is a per-particle work function run through
//! [`ExecutionBackend::for_each_particle`].
//!
//! # Integrators
//!
//! - **Semi-implicit Euler**: first order, one force evaluation per step.
//!   Velocity is kicked by the current force, then position drifts with the
//!   updated velocity. Because the force comes from the pre-update position,
//!   this is the symplectic Euler scheme, and bound orbits do not spiral out
//!   the way they do under explicit Euler.
//!
//! # Timestep Guidelines
//!
//! - The timestep must resolve the shortest dynamical time in the system
//!   (roughly the orbital period of the tightest pair divided by a few hundred).
//! - Masses must be positive; the kick divides by them. This is checked when a
//!   system is initialized, not per step.

use crate::backend::ExecutionBackend;
use crate::particles::ParticleSystem;

mod euler;

pub use euler::SemiImplicitEuler;

/// Trait for numerical integration methods
pub trait Integrator: Send + Sync {
    /// Get the name of this integrator
    fn name(&self) -> &str;

    /// Get the timestep used by this integrator
    fn timestep(&self) -> f64;

    /// Set the timestep for this integrator
    ///
    /// # Panics
    ///
    /// Panics if timestep is non-positive, NaN, or infinite
    fn set_timestep(&mut self, dt: f64);

    /// Check the timestep against values that usually indicate a mistake
    ///
    /// Unlike `set_timestep` this never rejects a value outright: the result
    /// is advisory, and the caller decides whether to log it. Suitable
    /// timesteps depend entirely on the problem's units.
    fn validate_timestep(&self) -> Result<(), String> {
        let dt = self.timestep();

        if dt <= 0.0 || !dt.is_finite() {
            return Err(format!("Invalid timestep: {}. Must be positive and finite.", dt));
        }

        // Below this, p += v*dt loses most of its digits for typical magnitudes.
        if dt < 1e-12 {
            return Err(format!(
                "Timestep {} is extremely small and may cause precision loss with f64.",
                dt
            ));
        }

        Ok(())
    }

    /// Advance every particle's velocity and position by one timestep
    ///
    /// Reads the force accumulators written by the most recent force pass.
    fn integrate<B: ExecutionBackend>(&self, system: &mut ParticleSystem, backend: &B);
}
