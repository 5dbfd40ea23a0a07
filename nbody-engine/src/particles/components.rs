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
//! Per-particle value types
//!
//! The particle system stores its state as parallel arrays; these small `Copy`
//! types are what the per-index accessors hand in and out. All of them use
//! double precision, matching the storage.

/// 3D position in world-frame coordinates
///
/// # Examples
///
/// ```
/// use nbody_engine::particles::Position;
///
/// let pos = Position::new(1.0, 2.0, 3.0);
/// assert_eq!(pos.x(), 1.0);
/// assert!(pos.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    x: f64,
    y: f64,
    z: f64,
}

impl Position {
    /// Create a new position with the given coordinates
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Position { x, y, z }
    }

    /// Create a position at the origin (0, 0, 0)
    pub fn zero() -> Self {
        Position::new(0.0, 0.0, 0.0)
    }

    /// Get the x coordinate
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Get the y coordinate
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Get the z coordinate
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Check if all coordinates are finite (not NaN or infinite)
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Euclidean distance to another position
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Get the position as an array
    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Create a position from an array
    pub fn from_array(arr: [f64; 3]) -> Self {
        Position::new(arr[0], arr[1], arr[2])
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::zero()
    }
}

/// 3D velocity
///
/// # Examples
///
/// ```
/// use nbody_engine::particles::Velocity;
///
/// let vel = Velocity::new(3.0, 0.0, -4.0);
/// assert_eq!(vel.magnitude(), 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    vx: f64,
    vy: f64,
    vz: f64,
}

impl Velocity {
    /// Create a new velocity with the given components
    pub fn new(vx: f64, vy: f64, vz: f64) -> Self {
        Velocity { vx, vy, vz }
    }

    /// Create a zero velocity (at rest)
    pub fn zero() -> Self {
        Velocity::new(0.0, 0.0, 0.0)
    }

    /// Get the x component
    pub fn vx(&self) -> f64 {
        self.vx
    }

    /// Get the y component
    pub fn vy(&self) -> f64 {
        self.vy
    }

    /// Get the z component
    pub fn vz(&self) -> f64 {
        self.vz
    }

    /// Check if all components are finite (not NaN or infinite)
    pub fn is_valid(&self) -> bool {
        self.vx.is_finite() && self.vy.is_finite() && self.vz.is_finite()
    }

    /// Calculate the magnitude (speed) of the velocity vector
    pub fn magnitude(&self) -> f64 {
        (self.vx * self.vx + self.vy * self.vy + self.vz * self.vz).sqrt()
    }

    /// Get the velocity as an array
    pub fn as_array(&self) -> [f64; 3] {
        [self.vx, self.vy, self.vz]
    }

    /// Create a velocity from an array
    pub fn from_array(arr: [f64; 3]) -> Self {
        Velocity::new(arr[0], arr[1], arr[2])
    }
}

impl Default for Velocity {
    fn default() -> Self {
        Velocity::zero()
    }
}

/// Net force acting on a particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Force {
    /// X component of the force
    pub fx: f64,
    /// Y component of the force
    pub fy: f64,
    /// Z component of the force
    pub fz: f64,
}

impl Force {
    /// Create a new force vector
    pub fn new(fx: f64, fy: f64, fz: f64) -> Self {
        Force { fx, fy, fz }
    }

    /// Create a zero force
    pub fn zero() -> Self {
        Force::new(0.0, 0.0, 0.0)
    }

    /// Check if the force is valid (all components finite)
    pub fn is_valid(&self) -> bool {
        self.fx.is_finite() && self.fy.is_finite() && self.fz.is_finite()
    }

    /// Get the magnitude of the force
    pub fn magnitude(&self) -> f64 {
        (self.fx * self.fx + self.fy * self.fy + self.fz * self.fz).sqrt()
    }

    /// Get the force as an array
    pub fn as_array(&self) -> [f64; 3] {
        [self.fx, self.fy, self.fz]
    }

    /// Create a force from an array
    pub fn from_array(arr: [f64; 3]) -> Self {
        Force::new(arr[0], arr[1], arr[2])
    }
}

impl Default for Force {
    fn default() -> Self {
        Force::zero()
    }
}

/// Mass of a particle
///
/// Gravitating particles always have strictly positive, finite mass; the
/// integrator divides by it.
///
/// # Examples
///
/// ```
/// use nbody_engine::particles::Mass;
///
/// let mass = Mass::new(5.972e24);
/// assert!(mass.is_valid());
/// assert!(Mass::try_new(0.0).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mass {
    value: f64,
}

impl Mass {
    /// Create a new mass with the given value
    ///
    /// # Panics
    ///
    /// Panics if the mass is not strictly positive and finite. This is
    /// appropriate for programming errors where invalid data should not be
    /// constructed. For fallible construction, use `try_new`.
    pub fn new(value: f64) -> Self {
        assert!(value > 0.0 && value.is_finite(), "Mass must be positive and finite");
        Mass { value }
    }

    /// Try to create a new mass
    ///
    /// Returns `None` if the value is zero, negative, NaN or infinite.
    pub fn try_new(value: f64) -> Option<Self> {
        if value > 0.0 && value.is_finite() {
            Some(Mass { value })
        } else {
            None
        }
    }

    /// Get the mass value
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Check if the mass is valid (positive and finite)
    pub fn is_valid(&self) -> bool {
        self.value > 0.0 && self.value.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_validation() {
        assert!(Position::new(1.0, 2.0, 3.0).is_valid());
        assert!(!Position::new(f64::NAN, 2.0, 3.0).is_valid());
        assert!(!Position::new(f64::INFINITY, 2.0, 3.0).is_valid());
    }

    #[test]
    fn test_position_distance() {
        let a = Position::new(1.0, 1.0, 1.0);
        let b = Position::new(4.0, 5.0, 1.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
    }

    #[test]
    fn test_array_conversion() {
        let pos = Position::from_array([1.0, 2.0, 3.0]);
        assert_eq!(pos.as_array(), [1.0, 2.0, 3.0]);

        let vel = Velocity::from_array([-1.0, 0.5, 2.0]);
        assert_eq!(vel.as_array(), [-1.0, 0.5, 2.0]);

        let force = Force::from_array([0.0, 0.0, 9.0]);
        assert_eq!(force.magnitude(), 9.0);
    }

    #[test]
    fn test_mass_creation() {
        let mass = Mass::new(4.0);
        assert_eq!(mass.value(), 4.0);
    }

    #[test]
    fn test_mass_try_new_rejects_non_positive() {
        assert!(Mass::try_new(1.0).is_some());
        assert!(Mass::try_new(0.0).is_none());
        assert!(Mass::try_new(-1.0).is_none());
        assert!(Mass::try_new(f64::NAN).is_none());
        assert!(Mass::try_new(f64::INFINITY).is_none());
    }

    #[test]
    #[should_panic(expected = "Mass must be positive and finite")]
    fn test_zero_mass_panics() {
        Mass::new(0.0);
    }

    #[test]
    fn test_defaults_are_zero() {
        assert_eq!(Position::default(), Position::zero());
        assert_eq!(Velocity::default().magnitude(), 0.0);
        assert!(Force::default().is_valid());
    }
}
