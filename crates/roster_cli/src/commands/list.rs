//! List command implementation.

use super::{describe, open_roster, Target};
use roster_core::OrderedRecord;
use serde::Serialize;
use std::path::Path;

/// Listing of one collection.
#[derive(Debug, Serialize)]
pub struct ListResult {
    /// Collection name.
    pub collection: String,
    /// Number of records.
    pub count: usize,
    /// Records in ascending order.
    pub records: Vec<OrderedRecord>,
}

/// Runs the list command.
pub fn run(path: &Path, target: &Target, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let roster = open_roster(path, target)?;
    let records = roster.list()?;
    let result = ListResult {
        collection: roster.name().to_owned(),
        count: records.len(),
        records,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        "text" => {
            println!("Collection {} ({} records)", result.collection, result.count);
            for record in &result.records {
                println!("{}", describe(record));
            }
        }
        other => return Err(format!("Unknown format: {other}").into()),
    }
    Ok(())
}
