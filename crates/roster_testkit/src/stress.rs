//! Stress tests for RosterDB.
//!
//! These tests hammer one ordered collection from many threads and check
//! that the order stays dense.

use roster_core::{CoreResult, Payload, PayloadPatch, RequestedPosition, Roster};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations attempted.
    pub total_ops: usize,
    /// Operations that committed.
    pub successful_ops: usize,
    /// Operations that failed with a non-retryable error.
    pub failed_ops: usize,
    /// Commits rejected with a retryable conflict (each retried).
    pub conflicts: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, conflicts: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            conflicts,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Conflicts retried: {}", self.conflicts);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform (split across threads).
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Retries allowed per operation on a retryable conflict.
    pub max_retries: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 2_000,
            threads: 4,
            max_retries: 64,
        }
    }
}

/// Picks the operation for step `i`: create at a spread of positions,
/// move, or delete, in a 3:2:1 mix.
fn step(roster: &Roster, i: usize) -> CoreResult<()> {
    let len = roster.len()?;
    match i % 6 {
        0..=2 => {
            let position = (i % (len + 2)) as i64;
            roster.create(RequestedPosition::at(position), Payload::new())?;
        }
        3 | 4 => {
            let records = roster.list()?;
            if let Some(record) = records.get(i % records.len().max(1)) {
                let to = ((i / 7) % (len + 1)) as i64 + 1;
                roster.update(record.id, RequestedPosition::at(to), PayloadPatch::Keep)?;
            }
        }
        _ => {
            let records = roster.list()?;
            if let Some(record) = records.get(i % records.len().max(1)) {
                roster.delete(record.id)?;
            }
        }
    }
    Ok(())
}

/// Runs a step, retrying retryable errors. Returns the number of retries.
///
/// A record picked from a stale listing may already be gone; that is a
/// `NotFound` and counts as a failure.
fn step_with_retry(roster: &Roster, i: usize, max_retries: usize) -> (CoreResult<()>, usize) {
    let mut retries = 0;
    loop {
        match step(roster, i) {
            Err(err) if err.is_retryable() && retries < max_retries => retries += 1,
            other => return (other, retries),
        }
    }
}

/// Run a sequential mixed-mutation stress test.
pub fn stress_sequential_mutations(roster: &Roster, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;
    let mut conflicts = 0usize;

    for i in 0..config.operations {
        let (result, retries) = step_with_retry(roster, i, config.max_retries);
        conflicts += retries;
        match result {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, conflicts, start.elapsed())
}

/// Run a concurrent mixed-mutation stress test.
pub fn stress_concurrent_mutations(roster: Arc<Roster>, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let conflicts = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads.max(1);

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let roster = Arc::clone(&roster);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let conflicts = Arc::clone(&conflicts);
            let max_retries = config.max_retries;

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let (result, retries) =
                        step_with_retry(&roster, t * ops_per_thread + i, max_retries);
                    conflicts.fetch_add(retries, Ordering::Relaxed);
                    match result {
                        Ok(()) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        conflicts.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestStore;
    use crate::model::assert_dense;
    use roster_core::{ConcurrencyMode, Config, ShiftMode};

    #[test]
    fn test_sequential_mutations() {
        let test_store = TestStore::memory();
        let roster = test_store.roster();
        let config = StressConfig {
            operations: 500,
            ..Default::default()
        };

        let result = stress_sequential_mutations(&roster, &config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.conflicts, 0);
        assert_dense(&roster);
    }

    #[test]
    fn test_concurrent_single_writer() {
        let test_store = TestStore::memory();
        let roster = Arc::new(test_store.roster());
        let config = StressConfig {
            operations: 800,
            threads: 4,
            ..Default::default()
        };

        let result = stress_concurrent_mutations(Arc::clone(&roster), &config);
        assert_eq!(result.conflicts, 0);
        assert!(result.successful_ops > 0);
        assert_dense(&roster);
    }

    #[test]
    fn test_concurrent_optimistic() {
        let test_store = TestStore::memory_with_config(
            Config::new()
                .concurrency(ConcurrencyMode::Optimistic)
                .shift_mode(ShiftMode::Ranged),
        );
        let roster = Arc::new(test_store.roster());
        let config = StressConfig {
            operations: 800,
            threads: 4,
            ..Default::default()
        };

        let result = stress_concurrent_mutations(Arc::clone(&roster), &config);
        assert!(result.successful_ops > 0);
        assert_dense(&roster);
    }

    #[test]
    fn test_concurrent_file_store() {
        let test_store = TestStore::file_with_config(Config::new().sync_on_commit(false));
        let roster = Arc::new(test_store.roster());
        let config = StressConfig {
            operations: 200,
            threads: 4,
            ..Default::default()
        };

        let result = stress_concurrent_mutations(Arc::clone(&roster), &config);
        assert!(result.successful_ops > 0);
        assert_dense(&roster);

        drop(roster);
        let test_store = test_store.reopen();
        assert_dense(&test_store.roster());
    }
}
