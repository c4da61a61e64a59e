//! Verify command implementation.

use super::{open_roster, Target};
use std::path::Path;

/// Runs the verify command.
///
/// Fails if the collection's orders are not exactly `1..=N`.
pub fn run(path: &Path, target: &Target) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying {} at {:?}", target.collection, path);
    println!();

    let roster = open_roster(path, target)?;
    let count = roster.len()?;
    let violations = roster.verify()?;

    println!("  Records checked: {count}");
    for violation in &violations {
        println!("  ✗ {violation}");
    }

    println!();
    if violations.is_empty() {
        println!("✓ Order verification passed");
        Ok(())
    } else {
        println!("✗ Order verification failed");
        Err(format!("{} order violations", violations.len()).into())
    }
}
