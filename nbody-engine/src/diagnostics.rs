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
//! Conserved-quantity diagnostics
//!
//! Cheap whole-system summaries used to sanity-check a run: total momentum,
//! kinetic and potential energy, and the centre of mass. None of these feed
//! back into the simulation.
//!
//! The potential uses the same softened separation as [`ForceKernel`], so
//! `kinetic + potential` is the energy the kernel's dynamics actually
//! conserve (up to integrator error):
//!
//! ```text
//! U = −Σ_{i<j} G·m_i·m_j / sqrt(|r_j − r_i|² + ε)
//! ```

use crate::gravity::ForceKernel;
use crate::particles::ParticleSystem;

/// Snapshot of conserved quantities
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnostics {
    /// Total linear momentum Σ m·v
    pub momentum: [f64; 3],
    /// Total kinetic energy Σ ½·m·v²
    pub kinetic_energy: f64,
    /// Softened gravitational potential energy
    pub potential_energy: f64,
    /// Mass-weighted mean position
    pub center_of_mass: [f64; 3],
}

impl Diagnostics {
    /// Measure `system` under the given kernel's G and softening
    pub fn measure(system: &ParticleSystem, kernel: &ForceKernel) -> Self {
        Diagnostics {
            momentum: total_momentum(system),
            kinetic_energy: kinetic_energy(system),
            potential_energy: potential_energy(system, kernel),
            center_of_mass: center_of_mass(system),
        }
    }

    /// Kinetic plus potential energy
    pub fn total_energy(&self) -> f64 {
        self.kinetic_energy + self.potential_energy
    }

    /// Magnitude of the total momentum vector
    pub fn momentum_magnitude(&self) -> f64 {
        let [px, py, pz] = self.momentum;
        (px * px + py * py + pz * pz).sqrt()
    }
}

/// Total linear momentum Σ m·v
pub fn total_momentum(system: &ParticleSystem) -> [f64; 3] {
    let mut total = [0.0; 3];
    for (&m, v) in system.masses().iter().zip(system.velocities()) {
        for k in 0..3 {
            total[k] += m * v[k];
        }
    }
    total
}

/// Sum of |m·v| over all particles
///
/// The natural scale for judging momentum drift: a closed system's total
/// momentum can be near zero while individual momenta are large.
pub fn momentum_scale(system: &ParticleSystem) -> f64 {
    system
        .masses()
        .iter()
        .zip(system.velocities())
        .map(|(&m, v)| m * (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt())
        .sum()
}

/// Total kinetic energy Σ ½·m·v²
pub fn kinetic_energy(system: &ParticleSystem) -> f64 {
    system
        .masses()
        .iter()
        .zip(system.velocities())
        .map(|(&m, v)| 0.5 * m * (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]))
        .sum()
}

/// Softened gravitational potential energy
pub fn potential_energy(system: &ParticleSystem, kernel: &ForceKernel) -> f64 {
    let masses = system.masses();
    let positions = system.positions();
    let mut total = 0.0;
    for i in 0..masses.len() {
        for j in (i + 1)..masses.len() {
            let dx = positions[j][0] - positions[i][0];
            let dy = positions[j][1] - positions[i][1];
            let dz = positions[j][2] - positions[i][2];
            let dist = (dx * dx + dy * dy + dz * dz + kernel.softening()).sqrt();
            total -= kernel.g_constant() * masses[i] * masses[j] / dist;
        }
    }
    total
}

/// Mass-weighted mean position; the origin for an empty system
pub fn center_of_mass(system: &ParticleSystem) -> [f64; 3] {
    let total_mass: f64 = system.masses().iter().sum();
    if total_mass == 0.0 {
        return [0.0; 3];
    }
    let mut weighted = [0.0; 3];
    for (&m, r) in system.masses().iter().zip(system.positions()) {
        for k in 0..3 {
            weighted[k] += m * r[k];
        }
    }
    weighted.map(|w| w / total_mass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::{Mass, Position, Velocity};

    fn pair() -> ParticleSystem {
        let mut system = ParticleSystem::new();
        system.push(Mass::new(1.0), Position::new(0.0, 0.0, 0.0), Velocity::new(1.0, 0.0, 0.0));
        system.push(Mass::new(3.0), Position::new(4.0, 0.0, 0.0), Velocity::new(0.0, -2.0, 0.0));
        system
    }

    #[test]
    fn test_momentum() {
        let system = pair();
        assert_eq!(total_momentum(&system), [1.0, -6.0, 0.0]);
        assert_eq!(momentum_scale(&system), 7.0);
    }

    #[test]
    fn test_kinetic_energy() {
        // 0.5*1*1 + 0.5*3*4
        assert_eq!(kinetic_energy(&pair()), 6.5);
    }

    #[test]
    fn test_potential_energy_uses_softening() {
        let kernel = ForceKernel::new(2.0, 9.0).unwrap();
        // -G*m1*m2 / sqrt(16 + 9) = -2*1*3/5
        let u = potential_energy(&pair(), &kernel);
        assert!((u + 1.2).abs() < 1e-15);
    }

    #[test]
    fn test_center_of_mass() {
        assert_eq!(center_of_mass(&pair()), [3.0, 0.0, 0.0]);
        assert_eq!(center_of_mass(&ParticleSystem::new()), [0.0; 3]);
    }

    #[test]
    fn test_measure_combines_parts() {
        let kernel = ForceKernel::new(2.0, 9.0).unwrap();
        let d = Diagnostics::measure(&pair(), &kernel);
        assert!((d.total_energy() - (6.5 - 1.2)).abs() < 1e-12);
        assert!((d.momentum_magnitude() - 37f64.sqrt()).abs() < 1e-12);
    }
}
