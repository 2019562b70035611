//! The event loop: consumes the Event Tree, coordinates the Run Queue and
//! CPU Pool, and emits trace records. This is the component the rest of the
//! crate exists to serve — everything else is the scaffolding it needs.

use crate::config::MIN_GRANULARITY;
use crate::cpu::CpuPool;
use crate::ensure_invariant;
use crate::error::{SimError, SimResult};
use crate::event::{Event, EventKind, EventTree};
use crate::process::{Process, ProcessIndex, ProcessTable};
use crate::run_queue::{RunQueue, RunQueueEntry};
use crate::trace::TraceRecord;

#[derive(Debug)]
pub struct Engine {
    processes: ProcessTable,
    run_queue: RunQueue,
    events: EventTree,
    cpus: CpuPool,
    trace: Vec<TraceRecord>,
    completed: usize,
}

impl Engine {
    pub fn new(processes: Vec<Process>, num_cpu: u32) -> SimResult<Self> {
        if num_cpu == 0 {
            return Err(SimError::input("num_cpu must be positive"));
        }
        let mut table = ProcessTable::new();
        let mut events = EventTree::new();
        for process in processes {
            let arrival = process.arrival;
            let pid = process.pid;
            table.push(process)?;
            events.insert(Event::arrival(arrival, pid));
        }
        Ok(Self {
            processes: table,
            run_queue: RunQueue::new(),
            events,
            cpus: CpuPool::new(num_cpu),
            trace: Vec::new(),
            completed: 0,
        })
    }

    /// Run the simulation to completion and return the emitted trace.
    /// Consumes the engine: a run is a one-shot, pure function of its
    /// construction inputs, per `spec.md` §4.5's determinism paragraph.
    pub fn run(mut self) -> SimResult<Vec<TraceRecord>> {
        let total = self.processes.len();
        let mut last_t = 0u64;
        while self.completed < total {
            let e = self.events.pop().ok_or_else(|| {
                SimError::invariant("event tree exhausted before all processes completed")
            })?;
            let t = e.time;
            last_t = t;
            self.trace.push(TraceRecord::TimeStamp { t });
            match e.kind {
                EventKind::Arrival => self.handle_arrival(e, t)?,
                EventKind::End => self.handle_end(e, t)?,
            }
        }
        self.trace.push(TraceRecord::AllDone { t: last_t });
        Ok(self.trace)
    }

    fn entry_for(&self, idx: ProcessIndex) -> RunQueueEntry {
        let p = self.processes.get(idx);
        RunQueueEntry { vruntime: p.vruntime, weight: p.weight, pid: p.pid, index: idx }
    }

    /// `{dequeue(p); update_vruntime(p, delta); enqueue(p)}`, generalised to
    /// a process that may or may not currently be in the Run Queue (the
    /// dequeue step is then simply a no-op) — this is how a *running*
    /// process gets its vruntime advanced and ends up back in the Run Queue
    /// in one step, as `spec.md` §4.5 uses it in both branches.
    fn task_tick(&mut self, idx: ProcessIndex, delta: u64) {
        let entry = self.entry_for(idx);
        let updated = self.run_queue.task_tick(entry, delta);
        self.processes.get_mut(idx).vruntime = updated.vruntime;
    }

    /// Sum of queued weight plus currently-running weight — the timeslice
    /// denominator mandated by `spec.md` §9 open question 1.
    fn w_total(&self) -> u64 {
        self.run_queue.total_weight() + self.cpus.running_weight()
    }

    fn enqueue_arrived(&mut self, idx: ProcessIndex) {
        let entry = self.entry_for(idx);
        self.run_queue.enqueue(entry);
        self.trace.push(TraceRecord::Enqueue { pid: entry.pid });
    }

    /// Pick the Run Queue's head and dispatch it to the preferred idle CPU.
    fn dispatch_to_idle(&mut self, t: u64) -> SimResult<()> {
        let entry = self
            .run_queue
            .pick_next()
            .ok_or_else(|| SimError::invariant("fill-idle step called with an empty run queue"))?;
        let w_total = self.w_total();
        self.run_queue.dequeue(&entry);
        let slice = RunQueue::timeslice(entry.weight, w_total);
        let remaining = self.processes.get(entry.index).remaining;
        let capped_slice = slice.min(remaining);
        let cpu_id = self.cpus.dispatch(entry.index, entry.pid, entry.weight, t, capped_slice);
        let end_t = t + capped_slice;
        self.events.insert(Event::end(end_t, entry.pid, cpu_id));
        self.trace.push(TraceRecord::Dispatch { pid: entry.pid, cpu: cpu_id });
        Ok(())
    }

    /// Pick the Run Queue's head and dispatch it to a specific, already-idle
    /// CPU (used after a release, where the target CPU is known rather than
    /// chosen from the idle heap).
    fn dispatch_to_cpu(&mut self, cpu_id: u32, t: u64) -> RunQueueEntry {
        let entry = self.run_queue.pick_next().expect("caller checked run queue non-empty");
        let w_total = self.w_total();
        self.run_queue.dequeue(&entry);
        let slice = RunQueue::timeslice(entry.weight, w_total);
        let remaining = self.processes.get(entry.index).remaining;
        let capped_slice = slice.min(remaining);
        self.cpus.dispatch_to(cpu_id, entry.index, entry.pid, entry.weight, t, capped_slice);
        let end_t = t + capped_slice;
        self.events.insert(Event::end(end_t, entry.pid, cpu_id));
        entry
    }

    /// ARRIVAL branch step 2: recompute the timeslice of the process running
    /// on `cpu_id` under the newly changed total weight, finalising it if it
    /// has already overrun the new slice.
    fn refresh_cpu(&mut self, cpu_id: u32, t: u64) -> SimResult<()> {
        let (idx, pid, last_dispatch, old_slice) = {
            let rp = self.cpus.cpu(cpu_id).running.ok_or_else(|| {
                SimError::invariant(format!("cpu {} expected a running process to refresh", cpu_id))
            })?;
            (rp.index, rp.pid, rp.last_dispatch, rp.time_slice)
        };
        let weight = self.processes.get(idx).weight;
        let new_slice = RunQueue::timeslice(weight, self.w_total());
        let run_for = t - last_dispatch;
        let removed = self.events.delete(&Event::end(last_dispatch + old_slice, pid, cpu_id));
        ensure_invariant!(
            removed.is_some(),
            "expected a pending end event for pid {} on cpu {} at {}",
            pid,
            cpu_id,
            last_dispatch + old_slice
        );

        if run_for >= new_slice {
            self.task_tick(idx, run_for);
            let remaining = {
                let p = self.processes.get_mut(idx);
                p.remaining = p.remaining.saturating_sub(run_for);
                p.remaining
            };
            self.cpus.release(cpu_id, run_for);
            self.cpus.release_weight(weight);
            if remaining == 0 {
                self.run_queue.dequeue(&self.entry_for(idx));
                self.completed += 1;
                self.trace.push(TraceRecord::Finish { pid });
            }
        } else {
            // Cap by the process's remaining work as of its last dispatch
            // (untouched in this branch) so the reinserted end event keeps
            // matching `last_dispatch + time_slice`, the same invariant
            // `dispatch`/`dispatch_to` maintain at first dispatch.
            let remaining = self.processes.get(idx).remaining;
            let capped_slice = new_slice.min(remaining);
            self.events.insert(Event::end(last_dispatch + capped_slice, pid, cpu_id));
            self.cpus.set_time_slice(cpu_id, capped_slice);
        }
        Ok(())
    }

    /// ARRIVAL branch step 4: preempt the eligible CPU whose running process
    /// has the largest vruntime, if any qualifies. Returns whether a
    /// preemption happened.
    fn try_preempt(&mut self, t: u64) -> SimResult<bool> {
        let mut best: Option<(u32, f64)> = None;
        for cpu in self.cpus.iter() {
            if let Some(rp) = cpu.running {
                if t - rp.last_dispatch >= MIN_GRANULARITY {
                    let vruntime = self.processes.get(rp.index).vruntime;
                    let replace = match best {
                        Some((_, best_vr)) => vruntime > best_vr,
                        None => true,
                    };
                    if replace {
                        best = Some((cpu.cpu_id, vruntime));
                    }
                }
            }
        }
        let Some((cpu_id, _)) = best else { return Ok(false) };

        let (idx, preempted_pid, last_dispatch, old_slice, weight) = {
            let rp = self.cpus.cpu(cpu_id).running.expect("scan only selects running cpus");
            let weight = self.processes.get(rp.index).weight;
            (rp.index, rp.pid, rp.last_dispatch, rp.time_slice, weight)
        };
        let removed =
            self.events.delete(&Event::end(last_dispatch + old_slice, preempted_pid, cpu_id));
        ensure_invariant!(
            removed.is_some(),
            "expected a pending end event for pid {} on cpu {} at {}",
            preempted_pid,
            cpu_id,
            last_dispatch + old_slice
        );
        let run_for = t - last_dispatch;
        self.task_tick(idx, run_for);
        {
            let p = self.processes.get_mut(idx);
            p.remaining = p.remaining.saturating_sub(run_for);
        }
        self.cpus.release(cpu_id, run_for);
        self.cpus.release_weight(weight);
        ensure_invariant!(
            !self.run_queue.is_empty(),
            "preemption budget positive but run queue empty after releasing cpu {}",
            cpu_id
        );

        let incoming = self.dispatch_to_cpu(cpu_id, t);
        self.trace.push(TraceRecord::Preempt {
            preempted: preempted_pid,
            incoming: incoming.pid,
            cpu: cpu_id,
        });
        Ok(true)
    }

    fn handle_arrival(&mut self, e: Event, t: u64) -> SimResult<()> {
        let mut k: i64 = 0;

        let first = self
            .processes
            .index_of(e.pid)
            .ok_or_else(|| SimError::invariant(format!("arrival for unknown pid {}", e.pid)))?;
        self.enqueue_arrived(first);
        k += 1;

        loop {
            let is_same_tick_arrival =
                matches!(self.events.peek(), Some(next) if next.kind == EventKind::Arrival && next.time == t);
            if !is_same_tick_arrival {
                break;
            }
            let next = self.events.pop().expect("peeked arrival must be poppable");
            let idx = self.processes.index_of(next.pid).ok_or_else(|| {
                SimError::invariant(format!("arrival for unknown pid {}", next.pid))
            })?;
            self.enqueue_arrived(idx);
            k += 1;
        }

        let running_cpu_ids: Vec<u32> =
            self.cpus.iter().filter(|c| c.running.is_some()).map(|c| c.cpu_id).collect();
        for cpu_id in running_cpu_ids {
            self.refresh_cpu(cpu_id, t)?;
        }

        while self.cpus.has_idle() && !self.run_queue.is_empty() {
            self.dispatch_to_idle(t)?;
            k -= 1;
        }

        while k > 0 {
            if !self.try_preempt(t)? {
                break;
            }
            k -= 1;
        }

        Ok(())
    }

    fn handle_end(&mut self, e: Event, t: u64) -> SimResult<()> {
        let cpu_id = e.cpu_id.expect("end events always carry a cpu");

        // Stale if the cpu is idle, is running a different pid, or is
        // running the same pid under a dispatch instance this event does
        // not belong to (its scheduled end time no longer matches the
        // current dispatch's `last_dispatch + time_slice`) — e.g. a pid
        // that finished, left, and was legitimately redispatched to the
        // same cpu before an orphaned End from its earlier run could pop.
        let stale = match self.cpus.cpu(cpu_id).running {
            Some(rp) => rp.pid != e.pid || rp.last_dispatch + rp.time_slice != e.time,
            None => true,
        };
        if stale {
            return Ok(());
        }

        let (idx, pid, last_dispatch, weight) = {
            let rp = self.cpus.cpu(cpu_id).running.expect("checked not stale above");
            let weight = self.processes.get(rp.index).weight;
            (rp.index, rp.pid, rp.last_dispatch, weight)
        };

        let run_done = t - last_dispatch;
        {
            let p = self.processes.get_mut(idx);
            p.remaining = p.remaining.saturating_sub(run_done);
        }
        self.task_tick(idx, run_done);
        self.cpus.release(cpu_id, run_done);
        self.cpus.release_weight(weight);

        if self.processes.get(idx).remaining == 0 {
            self.run_queue.dequeue(&self.entry_for(idx));
            self.completed += 1;
            self.trace.push(TraceRecord::Finish { pid });
        } else {
            self.trace.push(TraceRecord::Expired { pid, cpu: cpu_id });
        }

        if !self.run_queue.is_empty() {
            let incoming = self.dispatch_to_cpu(cpu_id, t);
            self.trace.push(TraceRecord::Dispatch { pid: incoming.pid, cpu: cpu_id });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::format_record;

    fn lines(records: &[TraceRecord]) -> Vec<String> {
        records.iter().map(format_record).collect()
    }

    #[test]
    fn single_cpu_single_process() {
        let processes = vec![Process::new(1, 0, 0, 10)];
        let trace = Engine::new(processes, 1).unwrap().run().unwrap();
        let lines = lines(&trace);
        assert!(lines.contains(&"Enqueue PID=1".to_string()));
        assert!(lines.contains(&"Assigned process with PID=1 to CPU 1".to_string()));
        assert!(lines.contains(&"Finish PID=1".to_string()));
        assert_eq!(lines.last().unwrap(), "All done at Time stamp = 10");
    }

    #[test]
    fn two_equal_weight_processes_share_one_cpu_to_completion() {
        // Both arrive at t=0 with no further arrivals: the ARRIVAL-branch
        // preemption step never fires again, so the two run back to back
        // rather than interleaving — only the total completion time and
        // per-process finish are guaranteed.
        let processes = vec![Process::new(1, 0, 0, 20), Process::new(2, 0, 0, 20)];
        let trace = Engine::new(processes, 1).unwrap().run().unwrap();
        let lines = lines(&trace);
        assert_eq!(lines.last().unwrap(), "All done at Time stamp = 40");
        assert!(lines.contains(&"Finish PID=1".to_string()));
        assert!(lines.contains(&"Finish PID=2".to_string()));
    }

    #[test]
    fn late_arrival_with_idle_cpus_dispatches_immediately() {
        let processes = vec![Process::new(1, 0, 0, 10), Process::new(2, 0, 100, 10)];
        let trace = Engine::new(processes, 4).unwrap().run().unwrap();
        let lines = lines(&trace);
        assert!(lines.contains(&"Assigned process with PID=1 to CPU 1".to_string()));
        // CPU 1 has accrued running_time=10 by t=100, so the idle heap
        // prefers the still-unused CPU 2 over the busier CPU 1.
        assert!(lines.contains(&"Assigned process with PID=2 to CPU 2".to_string()));
        assert_eq!(lines.last().unwrap(), "All done at Time stamp = 110");
    }

    #[test]
    fn niceness_asymmetry_grants_heavier_weight_more_runtime() {
        let processes = vec![Process::new(1, -5, 0, 20), Process::new(2, 5, 0, 20)];
        let trace = Engine::new(processes, 1).unwrap().run().unwrap();
        let lines = lines(&trace);
        assert_eq!(lines.last().unwrap(), "All done at Time stamp = 40");
        // PID 1 (heavier) should finish strictly before PID 2.
        let finish1 = lines.iter().position(|l| l == "Finish PID=1").unwrap();
        let finish2 = lines.iter().position(|l| l == "Finish PID=2").unwrap();
        assert!(finish1 < finish2);
    }

    #[test]
    fn timeslice_floor_holds_with_many_low_priority_processes() {
        let processes: Vec<Process> =
            (1..=30).map(|pid| Process::new(pid, 19, 0, 5)).collect();
        let trace = Engine::new(processes, 1).unwrap().run().unwrap();
        assert!(trace.iter().any(|r| matches!(r, TraceRecord::Finish { .. })));
    }

    #[test]
    fn staggered_arrival_refreshes_a_remaining_capped_running_process() {
        // PID 1 dispatches alone at t=0 with burst=100: its computed
        // timeslice (200) is capped down to its remaining work (100), so
        // the real pending end sits at t=100, not t=200. PID 2 arrives at
        // t=50, forcing `refresh_cpu` to locate and delete that real,
        // remaining-capped end event and then preempt PID 1 in the same
        // step. If the cap were not stored on the cpu (or the delete key
        // were computed from the uncapped value), the real end event would
        // be left dangling and this would either panic on the
        // invariant check or desync the trace below.
        let processes = vec![Process::new(1, 0, 0, 100), Process::new(2, 0, 50, 30)];
        let trace = Engine::new(processes, 1).unwrap().run().unwrap();
        let lines = lines(&trace);
        assert!(lines
            .contains(&"Preempt process PID=1 and entering process PID=2 to CPU 1".to_string()));
        assert!(lines.contains(&"Finish PID=2".to_string()));
        assert!(lines.contains(&"Finish PID=1".to_string()));
        // PID 1 resumes after PID 2 finishes and must not re-expire early
        // from an orphaned end event left over from its first dispatch.
        assert_eq!(lines.last().unwrap(), "All done at Time stamp = 130");
        assert_eq!(lines.iter().filter(|l| l.starts_with("Expired")).count(), 0);
    }

    #[test]
    fn two_cpus_staggered_arrivals_all_complete() {
        let processes = vec![
            Process::new(1, 0, 0, 30),
            Process::new(2, 0, 5, 20),
            Process::new(3, 0, 10, 10),
        ];
        let trace = Engine::new(processes, 2).unwrap().run().unwrap();
        let lines = lines(&trace);
        for pid in [1, 2, 3] {
            assert!(lines.contains(&format!("Finish PID={}", pid)));
        }
    }

    #[test]
    fn rejects_zero_cpus() {
        let err = Engine::new(vec![Process::new(1, 0, 0, 10)], 0).unwrap_err();
        assert!(matches!(err, SimError::Input { .. }));
    }
}
