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
//! Plain-text particle records
//!
//! A record is the particle count followed by one group of fields per
//! particle, whitespace-delimited:
//!
//! ```text
//! N  mass x y z vx vy vz [fx fy fz]  ...
//! ```
//!
//! Records are written on a single tab-separated line with all ten fields
//! per particle, so a run's snapshots form a time series with one line per
//! snapshot. Numbers use the shortest representation that parses back to the
//! same `f64`, which makes save followed by load exact.
//!
//! Two layouts are accepted on load:
//!
//! - **Single line**: the first non-blank line holds the whole record, with
//!   either 7 or 10 fields for every particle. Later lines are ignored, so a
//!   snapshot file loads as its first snapshot.
//! - **Row form**: the first non-blank line holds only N, followed by exactly
//!   N non-blank rows of 7 or 10 fields.
//!
//! Force fields are optional because they are recomputed before first use.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::particles::{Force, Mass, ParticleSystem, Position, Velocity};

/// Fields per particle when forces are omitted
pub const FIELDS_WITHOUT_FORCE: usize = 7;

/// Fields per particle when forces are present
pub const FIELDS_WITH_FORCE: usize = 10;

/// Write `system` as one tab-separated record line
pub fn write_record<W: Write>(writer: &mut W, system: &ParticleSystem) -> io::Result<()> {
    write!(writer, "{}", system.len())?;
    for index in 0..system.len() {
        let [x, y, z] = system.positions()[index];
        let [vx, vy, vz] = system.velocities()[index];
        let [fx, fy, fz] = system.forces()[index];
        write!(
            writer,
            "\t{:e}\t{:e}\t{:e}\t{:e}\t{:e}\t{:e}\t{:e}\t{:e}\t{:e}\t{:e}",
            system.masses()[index],
            x,
            y,
            z,
            vx,
            vy,
            vz,
            fx,
            fy,
            fz
        )?;
    }
    writeln!(writer)
}

/// Parse one record from text
pub fn parse_record(input: &str) -> Result<ParticleSystem> {
    let mut lines = input.lines().map(str::trim).filter(|line| !line.is_empty());
    let first = lines
        .next()
        .ok_or_else(|| Error::malformed(None, "input is empty"))?;

    let mut tokens = first.split_whitespace();
    let count = parse_count(tokens.next().unwrap_or_default())?;
    let rest: Vec<&str> = tokens.collect();

    let mut system;
    if rest.is_empty() {
        let rows: Vec<&str> = lines.collect();
        if rows.len() != count {
            return Err(Error::malformed(
                None,
                format!("declared {count} particles but found {} data rows", rows.len()),
            ));
        }
        system = ParticleSystem::with_capacity(count);
        for (index, row) in rows.iter().enumerate() {
            let fields: Vec<&str> = row.split_whitespace().collect();
            push_particle(&mut system, index, &fields)?;
        }
    } else {
        let width = record_width(count, rest.len())?;
        system = ParticleSystem::with_capacity(count);
        for (index, fields) in rest.chunks(width).enumerate() {
            push_particle(&mut system, index, fields)?;
        }
    }

    system.validate()?;
    Ok(system)
}

fn parse_count(token: &str) -> Result<usize> {
    let count: usize = token
        .parse()
        .map_err(|_| Error::malformed(None, format!("particle count '{token}' is not a non-negative integer")))?;
    if count == 0 {
        return Err(Error::config("input declares zero particles"));
    }
    Ok(count)
}

/// Fields per particle for a single-line record of `fields` values
fn record_width(count: usize, fields: usize) -> Result<usize> {
    for width in [FIELDS_WITH_FORCE, FIELDS_WITHOUT_FORCE] {
        if fields % width == 0 && fields / width == count {
            return Ok(width);
        }
    }
    Err(Error::malformed(
        None,
        format!(
            "declared {count} particles but the record holds {fields} fields \
             (expected {} or {})",
            count.saturating_mul(FIELDS_WITHOUT_FORCE),
            count.saturating_mul(FIELDS_WITH_FORCE)
        ),
    ))
}

fn push_particle(system: &mut ParticleSystem, index: usize, fields: &[&str]) -> Result<()> {
    if fields.len() != FIELDS_WITHOUT_FORCE && fields.len() != FIELDS_WITH_FORCE {
        return Err(Error::malformed(
            Some(index),
            format!(
                "expected {FIELDS_WITHOUT_FORCE} or {FIELDS_WITH_FORCE} fields, found {}",
                fields.len()
            ),
        ));
    }

    let mut values = [0.0; FIELDS_WITH_FORCE];
    for (k, token) in fields.iter().enumerate() {
        values[k] = token
            .parse()
            .map_err(|_| Error::malformed(Some(index), format!("field {k} ('{token}') is not a number")))?;
    }

    let mass = Mass::try_new(values[0]).ok_or_else(|| {
        Error::config(format!("particle {index} has non-positive or non-finite mass {}", values[0]))
    })?;
    system.push_with_force(
        mass,
        Position::new(values[1], values[2], values[3]),
        Velocity::new(values[4], values[5], values[6]),
        Force::new(values[7], values[8], values[9]),
    );
    Ok(())
}

impl ParticleSystem {
    /// Read one record from `reader` (see the module docs for the layout)
    pub fn load_from_external_format<R: Read>(mut reader: R) -> Result<Self> {
        let mut input = String::new();
        reader.read_to_string(&mut input)?;
        parse_record(&input)
    }

    /// Read one record from the file at `path`
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let system = Self::load_from_external_format(file)?;
        log::info!("loaded {} particles from {}", system.len(), path.display());
        Ok(system)
    }

    /// Write this system as a single record line
    pub fn save<W: Write>(&self, mut writer: W) -> Result<()> {
        write_record(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// This system as a single record line, including the trailing newline
    pub fn to_record_string(&self) -> String {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = write_record(&mut out, self);
        String::from_utf8_lossy(&out).into_owned()
    }
}
