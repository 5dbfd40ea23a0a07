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
//! Direct-summation gravitational force kernel
//!
//! Computes, for every particle, the net Newtonian attraction of all other
//! particles. Work is O(N²) per step; there is no tree or multipole
//! approximation.
//!
//! # Physics Background
//!
//! For particles i and j with separation vector **d** = r_j − r_i, the force
//! on i is
//!
//! ```text
//! s     = |d|² + ε
//! F_ij  = G · m_i · m_j / s
//! f_i  += F_ij · d / sqrt(s)
//! ```
//!
//! ## Softening
//!
//! ε is added to the squared separation, so it carries units of length². It
//! caps the force between close particles and keeps coincident particles
//! finite: with d = 0 the contribution is exactly zero rather than 0/0. The
//! direction is normalised by the softened distance sqrt(s) for the same
//! reason.
//!
//! ε is a modelling choice, not a correctness constant. Any ε > 0 weakens the
//! near field: pairs closer than roughly sqrt(ε) feel noticeably less than
//! the Newtonian force. Pick it relative to the typical separation in the
//! problem. There is intentionally no default.
//!
//! # Accumulation Strategies
//!
//! - [`ForceStrategy::IndependentRows`] evaluates each particle's row of the
//!   interaction matrix as a self-contained reduction. Rows never write to
//!   each other's accumulators, so the pass runs through any
//!   [`ExecutionBackend`] without locks, at twice the arithmetic.
//! - [`ForceStrategy::SymmetricPairs`] visits each unordered pair once and
//!   applies equal and opposite forces to both particles. It halves the
//!   arithmetic and conserves momentum to rounding, but its scattered writes
//!   are only safe on a single thread, so it always runs on the caller.
//!
//! Either way every accumulator is reset before a pass begins.
//!
//! # References
//!
//! - Aarseth, S. J. (2003). "Gravitational N-Body Simulations"
//! - Dehnen, W. (2001). "Towards optimal softening in three-dimensional N-body codes"

use crate::backend::ExecutionBackend;
use crate::error::{Error, Result};
use crate::particles::ParticleSystem;

/// Standard gravitational constant in SI units (m³/(kg⋅s²))
///
/// CODATA 2018 recommended value: 6.67430(15) × 10⁻¹¹ m³/(kg⋅s²)
pub const GRAVITATIONAL_CONSTANT: f64 = 6.67430e-11;

/// How pairwise contributions are accumulated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForceStrategy {
    /// One independent reduction per particle; safe under any backend
    #[default]
    IndependentRows,
    /// Each pair once with ± application; single-threaded only
    SymmetricPairs,
}

/// Gravitational force kernel configuration
///
/// # Example
///
/// ```rust
/// use nbody_engine::backend::SequentialBackend;
/// use nbody_engine::gravity::ForceKernel;
/// use nbody_engine::particles::{Mass, ParticleSystem, Position, Velocity};
///
/// let mut system = ParticleSystem::new();
/// system.push(Mass::new(1.0), Position::new(0.0, 0.0, 0.0), Velocity::zero());
/// system.push(Mass::new(1.0), Position::new(1.0, 0.0, 0.0), Velocity::zero());
///
/// let kernel = ForceKernel::new(1.0, 1e-9).unwrap();
/// kernel.compute_forces(&mut system, &SequentialBackend);
/// assert!(system.force(0).fx > 0.0);
/// assert_eq!(system.force(0).fx, -system.force(1).fx);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceKernel {
    g_constant: f64,
    softening: f64,
    strategy: ForceStrategy,
}

impl ForceKernel {
    /// Create a kernel with the given gravitational constant and softening
    ///
    /// `g_constant` must be finite and non-negative; `softening` must be
    /// finite and strictly positive.
    pub fn new(g_constant: f64, softening: f64) -> Result<Self> {
        if !(g_constant >= 0.0 && g_constant.is_finite()) {
            return Err(Error::config(format!(
                "gravitational constant must be non-negative and finite, got {g_constant}"
            )));
        }
        if !(softening > 0.0 && softening.is_finite()) {
            return Err(Error::config(format!(
                "softening must be positive and finite, got {softening}"
            )));
        }
        Ok(ForceKernel {
            g_constant,
            softening,
            strategy: ForceStrategy::default(),
        })
    }

    /// Use a different accumulation strategy
    pub fn with_strategy(mut self, strategy: ForceStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Gravitational constant
    pub fn g_constant(&self) -> f64 {
        self.g_constant
    }

    /// Softening term added to squared separations
    pub fn softening(&self) -> f64 {
        self.softening
    }

    /// Accumulation strategy
    pub fn strategy(&self) -> ForceStrategy {
        self.strategy
    }

    /// Force on a particle of mass `mi` at `ri` due to one of mass `mj` at `rj`
    #[inline]
    pub fn pair_force(&self, mi: f64, ri: [f64; 3], mj: f64, rj: [f64; 3]) -> [f64; 3] {
        let dx = rj[0] - ri[0];
        let dy = rj[1] - ri[1];
        let dz = rj[2] - ri[2];
        let dist_sq = dx * dx + dy * dy + dz * dz + self.softening;
        let dist = dist_sq.sqrt();
        let magnitude = self.g_constant * mi * mj / dist_sq;
        [magnitude * dx / dist, magnitude * dy / dist, magnitude * dz / dist]
    }

    /// Net force on particle `i`: the sum over every j ≠ i in index order
    pub fn row_force(&self, i: usize, masses: &[f64], positions: &[[f64; 3]]) -> [f64; 3] {
        let mi = masses[i];
        let ri = positions[i];
        let mut total = [0.0; 3];
        for (j, (&mj, &rj)) in masses.iter().zip(positions).enumerate() {
            if j == i {
                continue;
            }
            let f = self.pair_force(mi, ri, mj, rj);
            total[0] += f[0];
            total[1] += f[1];
            total[2] += f[2];
        }
        total
    }

    /// Overwrite every force accumulator in `system` from current positions
    pub fn compute_forces<B: ExecutionBackend>(&self, system: &mut ParticleSystem, backend: &B) {
        let arrays = system.arrays_mut();
        let masses = arrays.mass;
        let positions: &[[f64; 3]] = arrays.position;
        let forces = arrays.force;

        match self.strategy {
            ForceStrategy::IndependentRows => {
                backend.for_each_particle(forces, |i, force| {
                    *force = self.row_force(i, masses, positions);
                });
            }
            ForceStrategy::SymmetricPairs => self.accumulate_pairs(masses, positions, forces),
        }
    }

    fn accumulate_pairs(&self, masses: &[f64], positions: &[[f64; 3]], forces: &mut [[f64; 3]]) {
        forces.fill([0.0; 3]);
        let n = masses.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let f = self.pair_force(masses[i], positions[i], masses[j], positions[j]);
                for k in 0..3 {
                    forces[i][k] += f[k];
                    forces[j][k] -= f[k];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SequentialBackend;
    use crate::particles::{Force, Mass, Position, Velocity};

    fn pair(separation: f64) -> ParticleSystem {
        let mut system = ParticleSystem::new();
        system.push(Mass::new(1000.0), Position::zero(), Velocity::zero());
        system.push(Mass::new(1000.0), Position::new(separation, 0.0, 0.0), Velocity::zero());
        system
    }

    #[test]
    fn test_gravitational_constant() {
        assert!(GRAVITATIONAL_CONSTANT > 6.6e-11);
        assert!(GRAVITATIONAL_CONSTANT < 6.7e-11);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(ForceKernel::new(-1.0, 1.0).unwrap_err().is_configuration());
        assert!(ForceKernel::new(1.0, 0.0).unwrap_err().is_configuration());
        assert!(ForceKernel::new(1.0, -1e-3).is_err());
        assert!(ForceKernel::new(f64::NAN, 1.0).is_err());
        assert!(ForceKernel::new(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_pair_force_matches_newton() {
        let kernel = ForceKernel::new(GRAVITATIONAL_CONSTANT, 1e-9).unwrap();
        let f = kernel.pair_force(1000.0, [0.0; 3], 1000.0, [1000.0, 0.0, 0.0]);

        // Attractive, along +x only.
        assert!(f[0] > 0.0);
        assert_eq!(f[1], 0.0);
        assert_eq!(f[2], 0.0);

        let newton = GRAVITATIONAL_CONSTANT * 1000.0 * 1000.0 / (1000.0 * 1000.0);
        assert!((f[0] - newton).abs() / newton < 1e-12);
    }

    #[test]
    fn test_coincident_particles_give_zero_force() {
        let kernel = ForceKernel::new(1.0, 1e-6).unwrap();
        let f = kernel.pair_force(5.0, [3.0, 3.0, 3.0], 5.0, [3.0, 3.0, 3.0]);
        assert_eq!(f, [0.0; 3]);
    }

    #[test]
    fn test_softening_caps_near_field() {
        let kernel = ForceKernel::new(1.0, 1.0).unwrap();
        // With r² = 1e-6 against ε = 1, the magnitude is ~G·m² / ε.
        let f = kernel.pair_force(1.0, [0.0; 3], 1.0, [1e-3, 0.0, 0.0]);
        assert!(Force::from_array(f).is_valid());
        assert!(f[0] < 1e-2);
    }

    #[test]
    fn test_forces_are_equal_and_opposite() {
        let kernel = ForceKernel::new(GRAVITATIONAL_CONSTANT, 1.0).unwrap();
        let mut system = pair(1000.0);
        kernel.compute_forces(&mut system, &SequentialBackend);
        assert_eq!(system.force(0).fx, -system.force(1).fx);
    }

    #[test]
    fn test_stale_forces_are_overwritten() {
        for strategy in [ForceStrategy::IndependentRows, ForceStrategy::SymmetricPairs] {
            let kernel = ForceKernel::new(1.0, 1e-9).unwrap().with_strategy(strategy);
            let mut fresh = pair(2.0);
            kernel.compute_forces(&mut fresh, &SequentialBackend);

            let mut stale = pair(2.0);
            stale.set_force(0, Force::new(1e9, 1e9, 1e9));
            stale.set_force(1, Force::new(-7.0, 3.0, 0.5));
            kernel.compute_forces(&mut stale, &SequentialBackend);

            assert_eq!(stale.forces(), fresh.forces(), "{strategy:?}");
        }
    }

    #[test]
    fn test_single_particle_feels_nothing() {
        let kernel = ForceKernel::new(GRAVITATIONAL_CONSTANT, 1.0).unwrap();
        let mut system = ParticleSystem::new();
        system.push(Mass::new(1e30), Position::new(1.0, 2.0, 3.0), Velocity::zero());
        kernel.compute_forces(&mut system, &SequentialBackend);
        assert_eq!(system.force(0), Force::zero());
    }

    #[test]
    fn test_strategies_agree() {
        let params = crate::particles::RandomInit::with_seed(11);
        let base = ParticleSystem::random_init(50, &params).unwrap();
        let rows = ForceKernel::new(GRAVITATIONAL_CONSTANT, 1e-9).unwrap();
        let pairs = rows.with_strategy(ForceStrategy::SymmetricPairs);

        let mut a = base.clone();
        let mut b = base;
        rows.compute_forces(&mut a, &SequentialBackend);
        pairs.compute_forces(&mut b, &SequentialBackend);

        for (fa, fb) in a.forces().iter().zip(b.forces()) {
            let scale = Force::from_array(*fa).magnitude();
            for k in 0..3 {
                assert!((fa[k] - fb[k]).abs() <= 1e-9 * scale, "{fa:?} vs {fb:?}");
            }
        }
    }
}
