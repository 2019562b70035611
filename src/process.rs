//! Process descriptors and the engine's process table.
//!
//! Identity is modelled as an index into a `Vec<Process>` rather than a
//! pointer, per the source's own re-architecting note: "model the process
//! list as an indexable collection and carry the index explicitly on
//! handles; do not rely on pointer subtraction for identity."

use std::collections::HashMap;

use crate::config::nice_to_weight;
use crate::error::{SimError, SimResult};

/// Lightweight, copyable handle into the engine's process table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessIndex(pub usize);

/// A single process's mutable scheduling state plus its immutable identity.
#[derive(Debug, Clone)]
pub struct Process {
    pub pid: u32,
    pub weight: u32,
    pub vruntime: f64,
    pub arrival: u64,
    pub burst: u64,
    pub remaining: u64,
}

impl Process {
    pub fn new(pid: u32, nice: i32, arrival: u64, burst: u64) -> Self {
        Self {
            pid,
            weight: nice_to_weight(nice),
            vruntime: 0.0,
            arrival,
            burst,
            remaining: burst,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }
}

/// Owns every process for the lifetime of a simulation run and maps pids to
/// their table index.
#[derive(Debug, Default)]
pub struct ProcessTable {
    processes: Vec<Process>,
    by_pid: HashMap<u32, ProcessIndex>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self { processes: Vec::new(), by_pid: HashMap::new() }
    }

    pub fn push(&mut self, process: Process) -> SimResult<ProcessIndex> {
        let pid = process.pid;
        if self.by_pid.contains_key(&pid) {
            return Err(SimError::input(format!("duplicate pid {}", pid)));
        }
        let idx = ProcessIndex(self.processes.len());
        self.by_pid.insert(pid, idx);
        self.processes.push(process);
        Ok(idx)
    }

    pub fn get(&self, idx: ProcessIndex) -> &Process {
        &self.processes[idx.0]
    }

    pub fn get_mut(&mut self, idx: ProcessIndex) -> &mut Process {
        &mut self.processes[idx.0]
    }

    pub fn index_of(&self, pid: u32) -> Option<ProcessIndex> {
        self.by_pid.get(&pid).copied()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = ProcessIndex> {
        (0..self.processes.len()).map(ProcessIndex)
    }
}
