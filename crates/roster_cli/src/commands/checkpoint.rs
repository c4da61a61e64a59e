//! Checkpoint command implementation.

use roster_core::Store;
use std::path::Path;

/// Runs the checkpoint command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(path)?;
    let before = store.journal_size()?;
    store.checkpoint()?;
    let after = store.journal_size()?;

    println!("Checkpointed store at {:?}", path);
    println!("  Committed: {}", store.committed_seq());
    println!("  Journal before: {before} bytes");
    println!("  Journal after:  {after} bytes");
    Ok(())
}
