//! Update command implementation.

use super::{describe, open_roster, parse_fields, Target};
use roster_core::{PayloadPatch, RecordId, RequestedPosition};
use std::path::Path;

/// Runs the update command.
pub fn run(
    path: &Path,
    target: &Target,
    id: &str,
    position: Option<&str>,
    fields: &[String],
    replace: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let id: RecordId = id.parse()?;
    let roster = open_roster(path, target)?;
    let requested = position.map_or(RequestedPosition::absent(), RequestedPosition::parse);

    let patch = if replace {
        PayloadPatch::Replace(parse_fields(fields)?)
    } else if fields.is_empty() {
        PayloadPatch::Keep
    } else {
        PayloadPatch::Merge(parse_fields(fields)?)
    };

    let before = roster.get(id)?.map(|record| record.order);
    let record = roster.update(id, requested, patch)?;
    match before {
        Some(order) if order != record.order => {
            println!("✓ Moved from {} to {}", order, record.order);
        }
        _ => println!("✓ Updated"),
    }
    println!("{}", describe(&record));
    Ok(())
}
