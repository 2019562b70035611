//! The engine's canonical output: a typed record of every scheduling
//! decision, kept deliberately free of text formatting. Rendering to the
//! exact line format of the trace-output table is the printer's job
//! (`printer.rs`), not the engine's — the engine stays a pure function of
//! its inputs, observable only through the `Vec<TraceRecord>` it returns.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceRecord {
    /// A loop iteration begins at `t`.
    TimeStamp { t: u64 },
    /// `pid` arrives and is added to the Run Queue.
    Enqueue { pid: u32 },
    /// `pid` is dispatched to an idle `cpu`.
    Dispatch { pid: u32, cpu: u32 },
    /// `incoming` preempts `preempted` on `cpu`.
    Preempt { preempted: u32, incoming: u32, cpu: u32 },
    /// `pid`'s timeslice expired on `cpu`; it is not yet finished.
    Expired { pid: u32, cpu: u32 },
    /// `pid` has completed.
    Finish { pid: u32 },
    /// Terminal line: all processes completed at `t`.
    AllDone { t: u64 },
}
