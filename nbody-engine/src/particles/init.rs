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
//! Bulk initializers: seeded random systems and named presets
//!
//! # Presets
//!
//! | Name               | Contents                                              |
//! |--------------------|-------------------------------------------------------|
//! | `solar` / `planet` | Sun, eight planets and the Moon on circular orbits    |
//! | `binary`           | Two equal 10³⁰ kg masses on a mutual circular orbit   |
//!
//! Preset orbital speeds are not tabulated; they are derived from each body's
//! distance with the circular-orbit relation v = sqrt(G·M / r), using the SI
//! gravitational constant. Masses from the NASA Planetary Fact Sheet.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Mass, ParticleSystem, Position, Velocity};
use crate::error::{Error, Result};
use crate::gravity::GRAVITATIONAL_CONSTANT;

/// Astronomical unit in meters
pub const AU: f64 = 1.496e11;

/// Mean Earth-Moon distance in meters
const EARTH_MOON_DISTANCE: f64 = 3.844e8;

/// Names accepted by [`ParticleSystem::preset_init`]
pub const PRESET_NAMES: &[&str] = &["solar", "planet", "binary"];

/// Closed interval `[min, max]` for uniform sampling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl ValueRange {
    /// Create a new range
    pub fn new(min: f64, max: f64) -> Self {
        ValueRange { min, max }
    }

    /// Range symmetric about zero, `[-half_width, half_width]`
    pub fn symmetric(half_width: f64) -> Self {
        ValueRange::new(-half_width, half_width)
    }

    fn validate(&self, what: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(Error::config(format!(
                "{what} range [{}, {}] must be finite with min <= max",
                self.min, self.max
            )));
        }
        // The sampler needs max - min to be representable.
        if !(self.max - self.min).is_finite() {
            return Err(Error::config(format!(
                "{what} range [{}, {}] is wider than an f64 can hold",
                self.min, self.max
            )));
        }
        Ok(())
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        rng.random_range(self.min..=self.max)
    }
}

/// Parameters for [`ParticleSystem::random_init`]
///
/// The defaults reproduce the classic CPU benchmark setup: masses between
/// 10²⁰ and 10³⁰ kg, positions in a cube 2×10¹¹ m wide and velocities up to
/// 10³ m/s per component. None of these is physically privileged; tune them
/// for the problem at hand.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomInit {
    /// Mass range in kilograms; the lower bound must be positive
    pub mass: ValueRange,
    /// Per-coordinate position range in meters
    pub position: ValueRange,
    /// Per-component velocity range in meters per second
    pub velocity: ValueRange,
    /// Seed for the generator; equal seeds give identical systems
    pub seed: u64,
}

impl Default for RandomInit {
    fn default() -> Self {
        RandomInit {
            mass: ValueRange::new(1e20, 1e30),
            position: ValueRange::symmetric(1e11),
            velocity: ValueRange::symmetric(1e3),
            seed: 0,
        }
    }
}

impl RandomInit {
    /// Default ranges with the given seed
    pub fn with_seed(seed: u64) -> Self {
        RandomInit {
            seed,
            ..Self::default()
        }
    }

    /// Replace the mass range
    pub fn with_mass(mut self, range: ValueRange) -> Self {
        self.mass = range;
        self
    }

    /// Replace the position range
    pub fn with_position(mut self, range: ValueRange) -> Self {
        self.position = range;
        self
    }

    /// Replace the velocity range
    pub fn with_velocity(mut self, range: ValueRange) -> Self {
        self.velocity = range;
        self
    }

    /// Check every range, and that masses cannot be drawn at or below zero
    pub fn validate(&self) -> Result<()> {
        self.mass.validate("mass")?;
        self.position.validate("position")?;
        self.velocity.validate("velocity")?;
        if self.mass.min <= 0.0 {
            return Err(Error::config(format!(
                "mass range must be strictly positive, got lower bound {}",
                self.mass.min
            )));
        }
        Ok(())
    }
}

impl ParticleSystem {
    /// Generate `count` particles with uniformly distributed properties
    ///
    /// Draw order per particle is mass, then x/y/z, then vx/vy/vz, so a seed
    /// fully determines the system. Forces start at zero.
    pub fn random_init(count: usize, params: &RandomInit) -> Result<Self> {
        if count == 0 {
            return Err(Error::config("random initialization needs a positive particle count"));
        }
        params.validate()?;

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut system = ParticleSystem::with_capacity(count);
        for _ in 0..count {
            let mass = params.mass.sample(&mut rng);
            let position = Position::new(
                params.position.sample(&mut rng),
                params.position.sample(&mut rng),
                params.position.sample(&mut rng),
            );
            let velocity = Velocity::new(
                params.velocity.sample(&mut rng),
                params.velocity.sample(&mut rng),
                params.velocity.sample(&mut rng),
            );
            system.push(Mass::new(mass), position, velocity);
        }

        log::debug!("generated {count} random particles (seed {})", params.seed);
        Ok(system)
    }

    /// Build one of the named deterministic configurations in [`PRESET_NAMES`]
    pub fn preset_init(name: &str) -> Result<Self> {
        match name {
            "solar" | "planet" => Ok(solar_system()),
            "binary" => Ok(binary_star()),
            other => Err(Error::config(format!(
                "unknown preset '{other}' (expected one of: {})",
                PRESET_NAMES.join(", ")
            ))),
        }
    }
}

/// Speed of a circular orbit of radius `r` around a central mass
fn circular_speed(central_mass: f64, r: f64) -> f64 {
    (GRAVITATIONAL_CONSTANT * central_mass / r).sqrt()
}

struct Body {
    mass: f64,
    distance_au: f64,
}

const SUN_MASS: f64 = 1.9891e30;
const EARTH_MASS: f64 = 5.972e24;

const PLANETS: &[Body] = &[
    Body { mass: 3.285e23, distance_au: 0.39 },  // Mercury
    Body { mass: 4.867e24, distance_au: 0.72 },  // Venus
    Body { mass: EARTH_MASS, distance_au: 1.0 }, // Earth
    Body { mass: 6.39e23, distance_au: 1.52 },   // Mars
    Body { mass: 1.898e27, distance_au: 5.20 },  // Jupiter
    Body { mass: 5.683e26, distance_au: 9.58 },  // Saturn
    Body { mass: 8.681e25, distance_au: 19.22 }, // Uranus
    Body { mass: 1.024e26, distance_au: 30.05 }, // Neptune
];

const MOON_MASS: f64 = 7.342e22;

/// Sun at the origin, bodies strung out along +x moving in +y
fn solar_system() -> ParticleSystem {
    let mut system = ParticleSystem::with_capacity(PLANETS.len() + 2);
    system.push(Mass::new(SUN_MASS), Position::zero(), Velocity::zero());

    for body in PLANETS {
        let r = body.distance_au * AU;
        let v = circular_speed(SUN_MASS, r);
        system.push(Mass::new(body.mass), Position::new(r, 0.0, 0.0), Velocity::new(0.0, v, 0.0));
    }

    // The Moon rides on Earth's orbit plus its own orbit around Earth.
    let earth_r = AU;
    let moon_v = circular_speed(SUN_MASS, earth_r) + circular_speed(EARTH_MASS, EARTH_MOON_DISTANCE);
    system.push(
        Mass::new(MOON_MASS),
        Position::new(earth_r + EARTH_MOON_DISTANCE, 0.0, 0.0),
        Velocity::new(0.0, moon_v, 0.0),
    );

    system
}

/// Equal-mass pair one AU apart, circling their common barycentre
fn binary_star() -> ParticleSystem {
    let mass = 1e30;
    let separation = AU;
    // Each body moves at half the relative speed sqrt(G * 2m / d).
    let v = (GRAVITATIONAL_CONSTANT * 2.0 * mass / separation).sqrt() / 2.0;

    let mut system = ParticleSystem::with_capacity(2);
    system.push(Mass::new(mass), Position::new(-separation / 2.0, 0.0, 0.0), Velocity::new(0.0, -v, 0.0));
    system.push(Mass::new(mass), Position::new(separation / 2.0, 0.0, 0.0), Velocity::new(0.0, v, 0.0));
    system
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_init_is_deterministic() {
        let params = RandomInit::with_seed(42);
        let a = ParticleSystem::random_init(64, &params).unwrap();
        let b = ParticleSystem::random_init(64, &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_init_seed_changes_output() {
        let a = ParticleSystem::random_init(8, &RandomInit::with_seed(1)).unwrap();
        let b = ParticleSystem::random_init(8, &RandomInit::with_seed(2)).unwrap();
        assert_ne!(a.positions(), b.positions());
    }

    #[test]
    fn test_random_init_respects_ranges() {
        let params = RandomInit::with_seed(7)
            .with_mass(ValueRange::new(0.9, 1.0))
            .with_position(ValueRange::symmetric(2.0))
            .with_velocity(ValueRange::new(0.0, 0.5));
        let system = ParticleSystem::random_init(200, &params).unwrap();

        assert!(system.masses().iter().all(|m| (0.9..=1.0).contains(m)));
        assert!(system.positions().iter().flatten().all(|x| (-2.0..=2.0).contains(x)));
        assert!(system.velocities().iter().flatten().all(|v| (0.0..=0.5).contains(v)));
        assert!(system.forces().iter().all(|f| *f == [0.0; 3]));
    }

    #[test]
    fn test_random_init_rejects_zero_count() {
        let err = ParticleSystem::random_init(0, &RandomInit::default()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_random_init_rejects_overflowing_range_width() {
        let params = RandomInit::with_seed(1).with_position(ValueRange::symmetric(1e308));
        assert!(params.validate().unwrap_err().is_configuration());
        let err = ParticleSystem::random_init(4, &params).unwrap_err();
        assert!(err.to_string().contains("position"));
    }

    #[test]
    fn test_random_init_accepts_wide_finite_range() {
        let params = RandomInit::with_seed(1).with_position(ValueRange::symmetric(1e307));
        let system = ParticleSystem::random_init(4, &params).unwrap();
        assert!(system.positions().iter().flatten().all(|x| x.is_finite()));
    }

    #[test]
    fn test_random_init_rejects_non_positive_mass_range() {
        let params = RandomInit::default().with_mass(ValueRange::new(0.0, 1.0));
        let err = ParticleSystem::random_init(4, &params).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_random_init_rejects_inverted_range() {
        let params = RandomInit::default().with_velocity(ValueRange::new(1.0, -1.0));
        assert!(ParticleSystem::random_init(4, &params).is_err());
    }

    #[test]
    fn test_solar_preset() {
        let system = ParticleSystem::preset_init("solar").unwrap();
        assert_eq!(system.len(), 10);
        assert_eq!(system.mass(0).value(), SUN_MASS);
        assert_eq!(system.position(0), Position::zero());

        // Earth sits at 1 AU with roughly 29.8 km/s of orbital speed.
        assert_eq!(system.position(3).x(), AU);
        let earth_speed = system.velocity(3).vy();
        assert!((earth_speed - 29_780.0).abs() < 200.0, "earth speed {earth_speed}");

        // Speeds fall off with distance.
        assert!(system.velocity(1).vy() > system.velocity(8).vy());
        assert!(system.validate().is_ok());
    }

    #[test]
    fn test_planet_alias_matches_solar() {
        let solar = ParticleSystem::preset_init("solar").unwrap();
        let planet = ParticleSystem::preset_init("planet").unwrap();
        assert_eq!(solar, planet);
    }

    #[test]
    fn test_binary_preset_has_zero_momentum() {
        let system = ParticleSystem::preset_init("binary").unwrap();
        assert_eq!(system.len(), 2);
        let p0 = system.mass(0).value() * system.velocity(0).vy();
        let p1 = system.mass(1).value() * system.velocity(1).vy();
        assert_eq!(p0 + p1, 0.0);
    }

    #[test]
    fn test_unknown_preset() {
        let err = ParticleSystem::preset_init("galaxy").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("galaxy"));
    }
}
