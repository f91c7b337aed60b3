/// Progress aggregation: item counts and outstanding enumeration work.
///
/// The aggregator is a side channel. It observes the scheduler's counters and
/// the filter's visible count and turns them into the one-line summary shown
/// in the status bar.
use crate::model::format::format_count;
use crate::scheduler::SchedulerStatus;
use std::fmt;

/// Whether the owner should keep polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    Continue,
    Stop,
}

impl Poll {
    pub fn is_continue(self) -> bool {
        self == Self::Continue
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressReport {
    /// Rows passing the filter.
    pub visible: usize,
    /// Rows before filtering.
    pub total: usize,
    /// Directories active or queued in the scheduler.
    pub directories_remaining: usize,
}

impl ProgressReport {
    pub fn poll(&self) -> Poll {
        if self.directories_remaining > 0 {
            Poll::Continue
        } else {
            Poll::Stop
        }
    }
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.visible == self.total {
            write!(f, "{} items", format_count(self.visible))?;
        } else {
            write!(
                f,
                "{}/{} items",
                format_count(self.visible),
                format_count(self.total)
            )?;
        }
        if self.directories_remaining > 0 {
            write!(
                f,
                " ({} directories remaining)",
                format_count(self.directories_remaining)
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ProgressAggregator {
    report: ProgressReport,
    summary: String,
    ticks: u64,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        let report = ProgressReport::default();
        Self {
            summary: report.to_string(),
            report,
            ticks: 0,
        }
    }

    /// Recompute from fresh counts. Returns `true` if the summary changed.
    pub fn update(&mut self, visible: usize, total: usize, status: &SchedulerStatus) -> bool {
        let report = ProgressReport {
            visible,
            total,
            directories_remaining: status.remaining(),
        };
        if report == self.report {
            return false;
        }
        self.report = report;
        self.summary = report.to_string();
        true
    }

    /// Periodic recompute; tells the owner whether to keep ticking.
    pub fn tick(&mut self, visible: usize, total: usize, status: &SchedulerStatus) -> Poll {
        self.ticks += 1;
        self.update(visible, total, status);
        self.report.poll()
    }

    pub fn report(&self) -> ProgressReport {
        self.report
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
