//! Delete command implementation.

use super::{open_roster, Target};
use roster_core::RecordId;
use std::path::Path;

/// Runs the delete command.
pub fn run(path: &Path, target: &Target, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let id: RecordId = id.parse()?;
    let roster = open_roster(path, target)?;

    let removed = roster.delete(id)?;
    println!(
        "✓ Deleted {} from position {} ({} records remain)",
        removed.id,
        removed.order,
        roster.len()?
    );
    Ok(())
}
