//! Insert command implementation.

use super::{describe, open_roster, parse_fields, Target};
use roster_core::RequestedPosition;
use std::path::Path;

/// Runs the insert command.
pub fn run(
    path: &Path,
    target: &Target,
    position: Option<&str>,
    fields: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let roster = open_roster(path, target)?;
    let requested = position.map_or(RequestedPosition::absent(), RequestedPosition::parse);
    let payload = parse_fields(fields)?;

    let record = roster.create(requested, payload)?;
    println!("✓ Inserted into {} at {}", roster.name(), record.order);
    println!("{}", describe(&record));
    Ok(())
}
