//! The CPU pool: a fixed array of CPU descriptors plus a min-priority queue
//! over the currently-idle ones, ordered by `(running_time asc, cpu_id asc)`.
//!
//! The min-heap-via-reversed-`Ord` idiom mirrors the teacher's own
//! `TimeoutWaitQueue`/`TimeoutWaiter` pair in `task::manager`
//! (`BinaryHeap` keyed by a wrapper whose `Ord` impl is `Ordering::reverse`
//! of the natural one).

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::process::ProcessIndex;

#[derive(Debug, Clone)]
pub struct Cpu {
    pub cpu_id: u32,
    pub running_time: u64,
    pub running: Option<RunningProcess>,
}

#[derive(Debug, Clone, Copy)]
pub struct RunningProcess {
    pub index: ProcessIndex,
    pub pid: u32,
    pub last_dispatch: u64,
    pub time_slice: u64,
}

impl Cpu {
    fn new(cpu_id: u32) -> Self {
        Self { cpu_id, running_time: 0, running: None }
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IdleKey {
    running_time: u64,
    cpu_id: u32,
}

impl Ord for IdleKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.running_time
            .cmp(&other.running_time)
            .then_with(|| self.cpu_id.cmp(&other.cpu_id))
    }
}

impl PartialOrd for IdleKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug)]
pub struct CpuPool {
    cpus: Vec<Cpu>,
    idle: BinaryHeap<Reverse<IdleKey>>,
    running_weight: u64,
}

impl CpuPool {
    pub fn new(num_cpu: u32) -> Self {
        let cpus: Vec<Cpu> = (1..=num_cpu).map(Cpu::new).collect();
        let idle = cpus
            .iter()
            .map(|c| Reverse(IdleKey { running_time: c.running_time, cpu_id: c.cpu_id }))
            .collect();
        Self { cpus, idle, running_weight: 0 }
    }

    pub fn len(&self) -> usize {
        self.cpus.len()
    }

    pub fn cpu(&self, cpu_id: u32) -> &Cpu {
        &self.cpus[(cpu_id - 1) as usize]
    }

    pub fn running_weight(&self) -> u64 {
        self.running_weight
    }

    /// The idle CPU that would be chosen next, without dispatching to it.
    pub fn peek_idle(&self) -> Option<u32> {
        self.idle.peek().map(|Reverse(k)| k.cpu_id)
    }

    pub fn has_idle(&self) -> bool {
        !self.idle.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cpu> {
        self.cpus.iter()
    }

    /// Pop the preferred idle CPU, assign `index`/`pid` to it at time `t`,
    /// and add `weight` to the running-weight accumulator. Panics if no CPU
    /// is idle — callers must check `has_idle`/`peek_idle` first, matching
    /// the source contract that dispatch onto a full pool is a logic error.
    ///
    /// `time_slice` must already be capped by the caller to the process's
    /// remaining work (`slice.min(remaining)`), since it is stored verbatim
    /// as `last_dispatch + time_slice` — the offset of the one pending END
    /// event this dispatch is about to schedule.
    pub fn dispatch(
        &mut self,
        index: ProcessIndex,
        pid: u32,
        weight: u32,
        t: u64,
        time_slice: u64,
    ) -> u32 {
        let Reverse(key) = self.idle.pop().expect("dispatch called with no idle cpu");
        let cpu = &mut self.cpus[(key.cpu_id - 1) as usize];
        cpu.running = Some(RunningProcess { index, pid, last_dispatch: t, time_slice });
        self.running_weight += weight as u64;
        key.cpu_id
    }

    /// Assign directly to a specific CPU (used by preemption and END-branch
    /// dispatch, both of which target a particular already-known CPU rather
    /// than the idle-heap head).
    ///
    /// Same `time_slice` contract as `dispatch`: callers must pass the
    /// remaining-capped value.
    pub fn dispatch_to(
        &mut self,
        cpu_id: u32,
        index: ProcessIndex,
        pid: u32,
        weight: u32,
        t: u64,
        time_slice: u64,
    ) {
        let cpu = &mut self.cpus[(cpu_id - 1) as usize];
        debug_assert!(cpu.is_idle());
        cpu.running = Some(RunningProcess { index, pid, last_dispatch: t, time_slice });
        self.running_weight += weight as u64;
        self.idle.retain(|Reverse(k)| k.cpu_id != cpu_id);
    }

    /// Accumulate `running_time`, clear the running process, and return the
    /// pool to idle for this CPU. The pool does not know process weights, so
    /// callers must also call `release_weight` with the released process's
    /// weight to keep the running-weight accumulator consistent.
    pub fn release(&mut self, cpu_id: u32, delta: u64) -> Option<RunningProcess> {
        let cpu = &mut self.cpus[(cpu_id - 1) as usize];
        cpu.running_time += delta;
        let released = cpu.running.take();
        self.idle.push(Reverse(IdleKey { running_time: cpu.running_time, cpu_id }));
        released
    }

    /// Subtract `weight` from the running-weight accumulator.
    pub fn release_weight(&mut self, weight: u32) {
        self.running_weight = self.running_weight.saturating_sub(weight as u64);
    }

    /// Update the stored timeslice for the process currently running on
    /// `cpu_id`, leaving `last_dispatch` untouched (used when the ARRIVAL
    /// branch refreshes a running process's timeslice in place).
    pub fn set_time_slice(&mut self, cpu_id: u32, time_slice: u64) {
        if let Some(rp) = self.cpus[(cpu_id - 1) as usize].running.as_mut() {
            rp.time_slice = time_slice;
        }
    }

    pub fn total_running_time(&self) -> u64 {
        self.cpus.iter().map(|c| c.running_time).sum()
    }
}
