//! Derived metrics printed at the end of a run.

use std::fmt;

use crate::stats::StatsSnapshot;

/// Printed in place of a ratio whose denominator is zero.
pub const UNDEFINED: &str = "undefined";

/// The final report of a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Report {
    /// Inserts as a fraction of all reads and inserts, if any were performed.
    pub write_ratio: Option<f64>,
    /// Empty reads as a fraction of all reads, if any were performed.
    pub empty_read_ratio: Option<f64>,
    /// Documents matched by all reads.
    pub documents_read: u64,
    /// Documents inserted.
    pub documents_written: u64,
}

impl Report {
    /// Prints the report to stdout, separated from preceding output by a blank line.
    pub fn print(&self) {
        println!();
        print!("{self}");
    }
}

impl From<StatsSnapshot> for Report {
    fn from(stats: StatsSnapshot) -> Self {
        Self {
            write_ratio: ratio(stats.total_writes, stats.total_writes + stats.total_reads),
            empty_read_ratio: ratio(stats.empty_reads, stats.total_reads),
            documents_read: stats.total_documents_read,
            documents_written: stats.total_writes,
        }
    }
}

fn ratio(part: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| part as f64 / total as f64)
}

struct Percentage(Option<f64>);

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ratio) => write!(f, "{:.2}%", ratio * 100.0),
            None => f.write_str(UNDEFINED),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Write percentage: {}", Percentage(self.write_ratio))?;
        writeln!(
            f,
            "Empty read percentage: {}",
            Percentage(self.empty_read_ratio)
        )?;
        writeln!(f, "Total documents read: {}", self.documents_read)?;
        writeln!(f, "Total documents written: {}", self.documents_written)
    }
}
