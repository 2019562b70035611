//! Parses the input-file format into a `Vec<Process>`.
//!
//! Grounded on the original implementation's `load_processes`
//! (`original_source/src/main.c`): read a header, then one record per line,
//! validating each field as it is read and reporting the line it failed on.
//! Unlike the original, this loader also rejects duplicate pids, since the
//! engine's pid-indexed lookup table requires uniqueness — `spec.md` §3
//! already calls `pid` "unique," so this is enforcement of an existing
//! invariant rather than a new rule.

use std::io::BufRead;

use crate::error::{SimError, SimResult};
use crate::process::Process;

#[derive(Debug)]
pub struct LoadedInput {
    pub num_cpu: u32,
    pub processes: Vec<Process>,
}

pub fn load<R: BufRead>(reader: R) -> SimResult<LoadedInput> {
    let mut lines = reader.lines();

    let header = lines
        .next()
        .ok_or_else(|| SimError::input("empty input file"))?
        .map_err(|e| SimError::input(format!("failed to read header line: {}", e)))?;
    let mut header_fields = header.split_whitespace();
    let num_cpu: u32 = header_fields
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| SimError::input_at("missing or invalid num_cpu", 1))?;
    let num_processes: usize = header_fields
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| SimError::input_at("missing or invalid num_processes", 1))?;
    if num_cpu == 0 {
        return Err(SimError::input_at("num_cpu must be positive", 1));
    }
    if num_processes == 0 {
        return Err(SimError::input_at("num_processes must be positive", 1));
    }

    let mut processes = Vec::with_capacity(num_processes);
    let mut seen_pids = std::collections::HashSet::with_capacity(num_processes);

    for (offset, line) in lines.enumerate() {
        let line_no = offset + 2;
        if processes.len() == num_processes {
            break;
        }
        let line = line.map_err(|e| {
            SimError::input_at(format!("failed to read line: {}", e), line_no)
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let pid: u32 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| SimError::input_at("missing or invalid pid", line_no))?;
        let nice: i32 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| SimError::input_at("missing or invalid niceness", line_no))?;
        let arrival: i64 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| SimError::input_at("missing or invalid arrival", line_no))?;
        let burst: i64 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| SimError::input_at("missing or invalid burst", line_no))?;

        if !(-20..=19).contains(&nice) {
            return Err(SimError::input_at(
                format!("niceness {} out of range [-20, 19]", nice),
                line_no,
            ));
        }
        if burst <= 0 {
            return Err(SimError::input_at(
                format!("burst {} must be positive", burst),
                line_no,
            ));
        }
        if arrival < 0 {
            return Err(SimError::input_at(
                format!("arrival {} must be non-negative", arrival),
                line_no,
            ));
        }
        if !seen_pids.insert(pid) {
            return Err(SimError::input_at(format!("duplicate pid {}", pid), line_no));
        }

        processes.push(Process::new(pid, nice, arrival as u64, burst as u64));
    }

    if processes.len() != num_processes {
        return Err(SimError::input(format!(
            "expected {} process records, found {}",
            num_processes,
            processes.len()
        )));
    }

    Ok(LoadedInput { num_cpu, processes })
}
