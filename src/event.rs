//! The pending-event schedule: an Ordered Set of `(time, kind, proc, cpu)`
//! events, the canonical source of future actions for the engine's main
//! loop.

use std::cmp::Ordering;

use crate::ordered_set::OrderedSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    Arrival,
    End,
}

/// A scheduled event. Equality and ordering are purely on logical fields —
/// `time`, `kind`, `pid`, `cpu_id` — never on allocation identity, since the
/// Event Tree stores events by value and copies them on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event {
    pub time: u64,
    pub kind: EventKind,
    pub pid: u32,
    /// Present for END events, absent for ARRIVAL events.
    pub cpu_id: Option<u32>,
}

impl Event {
    pub fn arrival(time: u64, pid: u32) -> Self {
        Self { time, kind: EventKind::Arrival, pid, cpu_id: None }
    }

    pub fn end(time: u64, pid: u32, cpu_id: u32) -> Self {
        Self { time, kind: EventKind::End, pid, cpu_id: Some(cpu_id) }
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            // END orders before ARRIVAL at an equal timestamp: ends at a
            // timestamp are finalised before arrivals at that same time.
            .then_with(|| end_before_arrival(self.kind).cmp(&end_before_arrival(other.kind)))
            .then_with(|| match self.kind {
                EventKind::Arrival => self.pid.cmp(&other.pid),
                EventKind::End => self.cpu_id.cmp(&other.cpu_id),
            })
    }
}

fn end_before_arrival(kind: EventKind) -> u8 {
    match kind {
        EventKind::End => 0,
        EventKind::Arrival => 1,
    }
}

#[derive(Debug, Default)]
pub struct EventTree {
    events: OrderedSet<Event>,
}

impl EventTree {
    pub fn new() -> Self {
        Self { events: OrderedSet::new() }
    }

    pub fn insert(&mut self, event: Event) {
        self.events.insert(event);
    }

    pub fn peek(&self) -> Option<&Event> {
        self.events.min()
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop_min()
    }

    pub fn delete(&mut self, event: &Event) -> Option<Event> {
        self.events.delete(event)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
