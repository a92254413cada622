use std::path::PathBuf;
use std::time::Duration;

/// Outcome of one collection run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Records accepted during this run
    pub accepted: u64,

    /// Accepted count across all runs, as stored in the checkpoint
    pub cumulative: u64,

    pub target: u64,
    pub errors: u64,
    pub rejected: u64,

    /// Logins skipped because an earlier run or attempt already covered them
    pub skipped: u64,

    /// Quota pauses taken during the run
    pub throttled: u64,

    pub api_requests: u64,
    pub elapsed: Duration,

    /// Path of the final batch file
    pub final_batch: Option<PathBuf>,
}

impl RunSummary {
    pub fn target_reached(&self) -> bool {
        self.cumulative >= self.target
    }

    /// Accepted records per hour of wall-clock time
    pub fn rate_per_hour(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.accepted as f64 * 3600.0 / secs
    }

    /// One-line summary: collected vs target, errors, elapsed seconds
    pub fn summary_line(&self) -> String {
        format!(
            "Collected {}/{} resumes ({} new this run), {} errors, {} rejected, {:.1}s elapsed",
            self.cumulative,
            self.target,
            self.accepted,
            self.errors,
            self.rejected,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Prints the run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("{}", summary.summary_line());
    if let Some(path) = &summary.final_batch {
        println!("Final batch: {}", path.display());
    }
    if summary.throttled > 0 {
        println!("Paused {} times for the API quota", summary.throttled);
    }
}
