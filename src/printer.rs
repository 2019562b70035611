//! Renders `TraceRecord`s to the exact textual lines of the trace-output
//! contract. Kept separate from the engine so the text format can change
//! without touching simulation logic.

use std::io::{self, Write};

use crate::trace::TraceRecord;

pub fn format_record(record: &TraceRecord) -> String {
    match *record {
        TraceRecord::TimeStamp { t } => format!("Time stamp: {}", t),
        TraceRecord::Enqueue { pid } => format!("Enqueue PID={}", pid),
        TraceRecord::Dispatch { pid, cpu } => {
            format!("Assigned process with PID={} to CPU {}", pid, cpu)
        }
        TraceRecord::Preempt { preempted, incoming, cpu } => format!(
            "Preempt process PID={} and entering process PID={} to CPU {}",
            preempted, incoming, cpu
        ),
        TraceRecord::Expired { pid, cpu } => {
            format!("Expired time-slice of PID={} in CPU {}", pid, cpu)
        }
        TraceRecord::Finish { pid } => format!("Finish PID={}", pid),
        TraceRecord::AllDone { t } => format!("All done at Time stamp = {}", t),
    }
}

/// Write every record, one line per record, in emission order.
pub fn write_trace<W: Write>(mut out: W, records: &[TraceRecord]) -> io::Result<()> {
    for record in records {
        writeln!(out, "{}", format_record(record))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_match_the_contractual_lines() {
        assert_eq!(format_record(&TraceRecord::TimeStamp { t: 5 }), "Time stamp: 5");
        assert_eq!(format_record(&TraceRecord::Enqueue { pid: 1 }), "Enqueue PID=1");
        assert_eq!(
            format_record(&TraceRecord::Dispatch { pid: 1, cpu: 2 }),
            "Assigned process with PID=1 to CPU 2"
        );
        assert_eq!(
            format_record(&TraceRecord::Preempt { preempted: 1, incoming: 2, cpu: 3 }),
            "Preempt process PID=1 and entering process PID=2 to CPU 3"
        );
        assert_eq!(
            format_record(&TraceRecord::Expired { pid: 4, cpu: 1 }),
            "Expired time-slice of PID=4 in CPU 1"
        );
        assert_eq!(format_record(&TraceRecord::Finish { pid: 9 }), "Finish PID=9");
        assert_eq!(
            format_record(&TraceRecord::AllDone { t: 40 }),
            "All done at Time stamp = 40"
        );
    }
}
