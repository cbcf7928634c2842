//! Run statistics
//!
//! Counters collected while a harvest runs, and the end-of-run report.

use crate::fetch::HealthSnapshot;

/// Outcome counts for one harvest run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Candidate product URLs discovered
    pub urls_discovered: u64,

    /// URLs a fetch was started for
    pub urls_attempted: u64,

    /// Records that passed every gate
    pub products_emitted: u64,

    /// Pages whose product failed the relevance filter
    pub irrelevant: u64,

    /// Pages without a usable title
    pub invalid: u64,

    /// Fetches that exhausted their retries
    pub fatal_fetches: u64,

    /// URLs skipped because the circuit breaker was open
    pub circuit_open: u64,

    /// Rows that could not be written
    pub write_errors: u64,

    /// Flattened rows written
    pub rows_written: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs that ended without a product
    pub fn skipped(&self) -> u64 {
        self.irrelevant + self.invalid + self.fatal_fetches + self.circuit_open
    }

    /// Share of attempted URLs that produced a record, as a percentage
    pub fn yield_rate(&self) -> f64 {
        if self.urls_attempted == 0 {
            return 0.0;
        }
        (self.products_emitted as f64 / self.urls_attempted as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The run counters
/// * `health` - Fetch health at the end of the run, if available
pub fn print_statistics(stats: &RunStats, health: Option<&HealthSnapshot>) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  URLs discovered: {}", stats.urls_discovered);
    println!("  URLs attempted: {}", stats.urls_attempted);
    println!("  Products emitted: {}", stats.products_emitted);
    println!("  Rows written: {}", stats.rows_written);
    println!();

    if stats.skipped() > 0 || stats.write_errors > 0 {
        println!("Skipped:");
        for (label, count) in [
            ("Irrelevant", stats.irrelevant),
            ("Invalid (no title)", stats.invalid),
            ("Fetch failed", stats.fatal_fetches),
            ("Circuit open", stats.circuit_open),
            ("Write errors", stats.write_errors),
        ] {
            if count > 0 {
                println!("  {}: {}", label, count);
            }
        }
        println!();
    }

    if let Some(health) = health {
        println!("Fetch Health:");
        println!("  Consecutive failures: {}", health.consecutive_failures);
        println!(
            "  Fetch success rate: {:.1}% ({} / {})",
            health.success_rate() * 100.0,
            health.successful,
            health.total
        );
        if let Some(at) = health.last_failure_at {
            println!("  Last failure: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        println!();
    }

    println!(
        "Yield: {:.1}% ({} / {} URLs produced a product)",
        stats.yield_rate(),
        stats.products_emitted,
        stats.urls_attempted
    );
}
