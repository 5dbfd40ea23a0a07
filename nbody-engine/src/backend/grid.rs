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
//! Massively-parallel grid backend and its device memory model
//!
//! The grid backend treats every particle as one independent lane. Lanes are
//! grouped into work groups of `group_size`, and the launch covers
//! `ceil(N / group_size)` groups, so the final group may have idle lanes that
//! do nothing. With the `parallel` feature each group is a Rayon task.
//!
//! The backend works in its own memory space. [`DeviceBuffers`] owns the
//! device-side copy of the particle arrays. State is uploaded once before a
//! batch of steps, any number of force and integration passes run against
//! the device copy, and the host copy is refreshed only when a snapshot or
//! the final state is needed. Transfers are counted so callers can confirm
//! the round trips were amortised.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{ExecutionBackend, MemorySpace};
use crate::error::{Error, Result};
use crate::particles::ParticleSystem;

/// Flat-grid backend with fixed-size work groups
#[derive(Debug, Clone, Copy)]
pub struct GridBackend {
    group_size: usize,
}

impl GridBackend {
    /// Group size used when the driver does not specify one
    pub const DEFAULT_GROUP_SIZE: usize = 256;

    /// Create a grid backend with `group_size` lanes per group
    pub fn new(group_size: usize) -> Result<Self> {
        if group_size == 0 {
            return Err(Error::config("grid backend group size must be positive"));
        }
        Ok(GridBackend { group_size })
    }

    /// Lanes per work group
    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Number of groups launched to cover `n` particles
    pub fn grid_size(&self, n: usize) -> usize {
        n.div_ceil(self.group_size)
    }
}

fn run_group<T, F>(group: usize, group_size: usize, lanes: &mut [T], work: &F)
where
    F: Fn(usize, &mut T),
{
    for lane in 0..group_size {
        // Lanes past the end of the final group are idle.
        let Some(item) = lanes.get_mut(lane) else {
            break;
        };
        work(group * group_size + lane, item);
    }
}

impl ExecutionBackend for GridBackend {
    fn name(&self) -> &str {
        "grid"
    }

    fn is_parallel(&self) -> bool {
        true
    }

    fn memory_space(&self) -> MemorySpace {
        MemorySpace::Device
    }

    fn for_each_particle<T, F>(&self, items: &mut [T], work: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Send + Sync,
    {
        let group_size = self.group_size;

        #[cfg(feature = "parallel")]
        items
            .par_chunks_mut(group_size)
            .enumerate()
            .for_each(|(group, lanes)| run_group(group, group_size, lanes, &work));

        #[cfg(not(feature = "parallel"))]
        items
            .chunks_mut(group_size)
            .enumerate()
            .for_each(|(group, lanes)| run_group(group, group_size, lanes, &work));
    }
}

/// Host/device transfer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    /// Host-to-device copies
    pub uploads: usize,
    /// Device-to-host copies
    pub downloads: usize,
}

/// Device-resident copy of a particle system
///
/// # Examples
///
/// ```
/// use nbody_engine::backend::DeviceBuffers;
/// use nbody_engine::particles::ParticleSystem;
///
/// let mut host = ParticleSystem::preset_init("binary").unwrap();
/// let mut device = DeviceBuffers::upload(&host);
/// // ... run steps against device.particles_mut() ...
/// device.download(&mut host);
/// assert_eq!(device.transfers().uploads, 1);
/// assert_eq!(device.transfers().downloads, 1);
/// ```
#[derive(Debug)]
pub struct DeviceBuffers {
    particles: ParticleSystem,
    stats: TransferStats,
}

impl DeviceBuffers {
    /// Copy host state into freshly allocated device buffers
    pub fn upload(host: &ParticleSystem) -> Self {
        log::debug!("uploading {} particles to device buffers", host.len());
        DeviceBuffers {
            particles: host.clone(),
            stats: TransferStats {
                uploads: 1,
                downloads: 0,
            },
        }
    }

    /// Device-side particle arrays, for stepping
    pub fn particles_mut(&mut self) -> &mut ParticleSystem {
        &mut self.particles
    }

    /// Device-side particle arrays, read-only
    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    /// Copy device state back over the host arrays
    ///
    /// # Panics
    ///
    /// Panics if `host` no longer has the particle count that was uploaded.
    pub fn download(&mut self, host: &mut ParticleSystem) {
        assert_eq!(
            host.len(),
            self.particles.len(),
            "host particle count changed while device buffers were live"
        );
        host.copy_from(&self.particles);
        self.stats.downloads += 1;
        log::trace!("downloaded {} particles from device buffers", host.len());
    }

    /// Transfers performed so far
    pub fn transfers(&self) -> TransferStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::{Mass, Position, Velocity};

    #[test]
    fn test_zero_group_size_rejected() {
        assert!(GridBackend::new(0).unwrap_err().is_configuration());
    }

    #[test]
    fn test_grid_covers_all_particles() {
        let backend = GridBackend::new(32).unwrap();
        assert_eq!(backend.grid_size(100), 4);
        assert_eq!(backend.grid_size(96), 3);
        assert_eq!(backend.grid_size(0), 0);
    }

    #[test]
    fn test_partial_last_group() {
        let backend = GridBackend::new(16).unwrap();
        let mut out = vec![0usize; 40];
        backend.for_each_particle(&mut out, |i, slot| *slot = i + 1);
        assert_eq!(out, (1..=40).collect::<Vec<_>>());
    }

    #[test]
    fn test_group_larger_than_input() {
        let backend = GridBackend::new(1024).unwrap();
        let mut out = vec![0i64; 3];
        backend.for_each_particle(&mut out, |i, slot| *slot = -(i as i64));
        assert_eq!(out, vec![0, -1, -2]);
    }

    #[test]
    fn test_device_buffers_are_separate_from_host() {
        let mut host = ParticleSystem::new();
        host.push(Mass::new(1.0), Position::zero(), Velocity::zero());

        let mut device = DeviceBuffers::upload(&host);
        device
            .particles_mut()
            .set_position(0, Position::new(1.0, 2.0, 3.0));
        assert_eq!(host.position(0), Position::zero());

        device.download(&mut host);
        assert_eq!(host.position(0), Position::new(1.0, 2.0, 3.0));
        assert_eq!(
            device.transfers(),
            TransferStats {
                uploads: 1,
                downloads: 1
            }
        );
    }
}
