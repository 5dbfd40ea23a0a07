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
//! Solar System N-Body Simulation Example
//!
//! Integrates the Sun, the eight planets and the Moon for a number of years
//! and reports how well the run conserved energy and momentum. It showcases:
//!
//! - The `solar` preset with circular starting orbits
//! - Running the same system on the sequential and threaded backends
//! - Energy and momentum diagnostics at the start and end of a run
//! - Bit-identical results across backends
//!
//! # Physical Constants
//!
//! All values use SI units (meters, kilograms, seconds).
//!
//! # Running
//!
//! ```bash
//! # One Earth year with one-hour steps
//! cargo run --example solar_system --release
//!
//! # Ten years with a six-hour timestep
//! cargo run --example solar_system --release -- --years 10 --timestep 21600
//! ```

use std::io;

use nbody_engine::backend::{ExecutionBackend, SequentialBackend, ThreadedBackend};
use nbody_engine::config::{InitSource, SimulationConfig};
use nbody_engine::diagnostics::{momentum_scale, Diagnostics};
use nbody_engine::gravity::GRAVITATIONAL_CONSTANT;
use nbody_engine::particles::{ParticleSystem, AU};
use nbody_engine::simulation::{RunSummary, Simulation};
use nbody_engine::snapshot::SnapshotEmitter;

/// One Earth day in seconds
const DAY: f64 = 86400.0;

/// One Earth year in seconds (365.25 days)
const YEAR: f64 = 365.25 * DAY;

/// Softening of (1000 km)², negligible at planetary distances
const SOFTENING: f64 = 1e12;

const BODY_NAMES: &[&str] = &[
    "Sun", "Mercury", "Venus", "Earth", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune", "Moon",
];

fn run_on<B: ExecutionBackend>(config: SimulationConfig, backend: B) -> nbody_engine::Result<(ParticleSystem, RunSummary)> {
    let mut sim = Simulation::new(config, backend)?;
    sim.initialize(&InitSource::Preset("solar".to_string()))?;
    let mut emitter = SnapshotEmitter::new(io::sink());
    let summary = sim.run(&mut emitter)?;
    let system = sim.into_system().unwrap_or_default();
    Ok((system, summary))
}

fn main() -> nbody_engine::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Solar System N-Body Simulation ===");
    println!();
    println!("Physical Constants:");
    println!("  G = {:.5e} m³/(kg⋅s²)", GRAVITATIONAL_CONSTANT);
    println!("  1 AU = {:.5e} m", AU);
    println!("  1 year = {:.5e} s", YEAR);
    println!();

    // Parse command line arguments (simple)
    let args: Vec<String> = std::env::args().collect();
    let mut timestep = 3600.0;
    let mut years = 1.0;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--timestep" => {
                match args.get(i + 1).and_then(|v| v.parse::<f64>().ok()) {
                    Some(value) => timestep = value,
                    None => eprintln!("Warning: invalid --timestep, using default {:.0} s", timestep),
                }
                i += 2;
            }
            "--years" => {
                match args.get(i + 1).and_then(|v| v.parse::<f64>().ok()) {
                    Some(value) => years = value,
                    None => eprintln!("Warning: invalid --years, using default {:.1}", years),
                }
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let steps = (years * YEAR / timestep).round() as usize;
    let config = SimulationConfig::new(timestep, steps, steps.max(1), SOFTENING);

    println!("Simulation Configuration:");
    println!("  Timestep: {:.0} s ({:.3} days)", timestep, timestep / DAY);
    println!("  Duration: {:.2} years ({} steps)", years, steps);
    println!();

    let initial = ParticleSystem::preset_init("solar")?;
    let kernel = config.force_kernel()?;
    let before = Diagnostics::measure(&initial, &kernel);

    let (sequential, seq_summary) = run_on(config, SequentialBackend)?;
    let (threaded, par_summary) = run_on(config, ThreadedBackend::new(ThreadedBackend::DEFAULT_MAX_WORKERS)?)?;

    println!("Final positions (AU):");
    for (index, name) in BODY_NAMES.iter().enumerate().take(sequential.len()) {
        let p = sequential.position(index);
        println!("  {:<8} ({:>8.4}, {:>8.4}, {:>8.4})", name, p.x() / AU, p.y() / AU, p.z() / AU);
    }
    println!();

    let after = Diagnostics::measure(&sequential, &kernel);
    let energy_drift = ((after.total_energy() - before.total_energy()) / before.total_energy()).abs();
    let momentum_drift = (after.momentum_magnitude() - before.momentum_magnitude()).abs() / momentum_scale(&initial);

    println!("Conservation:");
    println!("  Relative energy drift: {:.3e}", energy_drift);
    println!("  Momentum drift (of scale): {:.3e}", momentum_drift);
    println!();

    println!("Backends:");
    println!("  sequential: {:.3?}", seq_summary.elapsed);
    println!("  threaded:   {:.3?}", par_summary.elapsed);
    println!("  identical results: {}", sequential == threaded);

    Ok(())
}
