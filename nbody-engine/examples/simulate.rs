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
//! Command-line N-body driver
//!
//! Runs a simulation from a random system, a preset, or a saved record file
//! and writes the snapshot time series to a file, one record per line.
//!
//! # Usage
//!
//! ```text
//! simulate <input> <dt> <steps> <interval> <width> [options]
//!
//! <input>     a particle count (random), a preset (solar, planet, binary),
//!             or a path to a saved record
//! <dt>        timestep in seconds
//! <steps>     number of steps
//! <interval>  snapshot every <interval> steps
//! <width>     worker count (threaded) or group size (grid)
//!
//! --backend <sequential|threaded|grid>   default: threaded
//! --softening <m²>                       default: 1e-9
//! --seed <n>                             default: 0
//! --output <path>                        default: snapshots.tsv
//! --save <path>                          write the final state as a record
//! --timeout <seconds>                    stop at the next step after this
//! ```
//!
//! # Running
//!
//! ```bash
//! # 1000 random particles, hourly steps for ten days, on 8 threads
//! cargo run --example simulate --release -- 1000 3600 240 24 8
//!
//! # The solar system on the grid backend with 128-lane groups
//! RUST_LOG=debug cargo run --example simulate --release -- solar 3600 8760 24 128 --backend grid
//! ```

use std::fs::File;
use std::process;
use std::str::FromStr;
use std::time::Duration;

use nbody_engine::backend::BackendConfig;
use nbody_engine::config::{InitSource, SimulationConfig};
use nbody_engine::simulation::{CancelFlag, RunControl};
use nbody_engine::snapshot::SnapshotEmitter;
use nbody_engine::{initialize, simulation};

const USAGE: &str = "usage: simulate <input> <dt> <steps> <interval> <width> \
[--backend sequential|threaded|grid] [--softening M2] [--seed N] [--output PATH] [--save PATH] [--timeout SECS]";

struct Args {
    input: String,
    dt: f64,
    steps: usize,
    interval: usize,
    width: usize,
    backend: String,
    softening: f64,
    seed: u64,
    output: String,
    save: Option<String>,
    timeout: Option<Duration>,
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {message}");
    eprintln!("{USAGE}");
    process::exit(2);
}

fn parse<T: FromStr>(value: Option<&String>, name: &str) -> T {
    let Some(value) = value else {
        fail(&format!("{name} requires an argument"));
    };
    value
        .parse()
        .unwrap_or_else(|_| fail(&format!("invalid {name} '{value}'")))
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 5 {
        fail("expected five positional arguments");
    }

    let mut parsed = Args {
        input: args[0].clone(),
        dt: parse(args.get(1), "<dt>"),
        steps: parse(args.get(2), "<steps>"),
        interval: parse(args.get(3), "<interval>"),
        width: parse(args.get(4), "<width>"),
        backend: "threaded".to_string(),
        softening: 1e-9,
        seed: 0,
        output: "snapshots.tsv".to_string(),
        save: None,
        timeout: None,
    };

    let mut i = 5;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--backend" => parsed.backend = parse(value, "--backend"),
            "--softening" => parsed.softening = parse(value, "--softening"),
            "--seed" => parsed.seed = parse(value, "--seed"),
            "--output" => parsed.output = parse(value, "--output"),
            "--save" => parsed.save = Some(parse(value, "--save")),
            "--timeout" => {
                let seconds: f64 = parse(value, "--timeout");
                match Duration::try_from_secs_f64(seconds) {
                    Ok(timeout) => parsed.timeout = Some(timeout),
                    Err(_) => fail(&format!("invalid --timeout '{seconds}'")),
                }
            }
            other => fail(&format!("unknown option '{other}'")),
        }
        i += 2;
    }
    parsed
}

fn run(args: &Args) -> nbody_engine::Result<()> {
    let source = InitSource::parse(&args.input, args.seed)?;
    let config = SimulationConfig::new(args.dt, args.steps, args.interval, args.softening);
    let backend = BackendConfig::from_name(&args.backend, args.width)?.build()?;

    let mut system = initialize(&source)?;
    let mut emitter = SnapshotEmitter::create(&args.output)?;
    let mut control = RunControl::with_cancel(CancelFlag::new());
    control.timeout = args.timeout;

    let summary = simulation::run_steps_controlled(&mut system, &config, &backend, &mut emitter, &control)?;

    println!("Run finished: {:?}", summary.outcome);
    println!("  Particles: {}", system.len());
    println!("  Steps: {} of {}", summary.steps_completed, args.steps);
    println!("  Snapshots: {} -> {}", summary.snapshots_written, args.output);
    println!("  Wall time: {:.3?}", summary.elapsed);
    if let Some(transfers) = summary.transfers {
        println!("  Device transfers: {} up, {} down", transfers.uploads, transfers.downloads);
    }

    if let Some(path) = &args.save {
        system.save(File::create(path)?)?;
        println!("  Final state saved to {path}");
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args();
    if let Err(err) = run(&args) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
