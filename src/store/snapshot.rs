//! JSON snapshot persistence for the in-memory store
//!
//! The CLI host loads the snapshot, runs one engine operation, and writes
//! the snapshot back. Pretty-printed JSON keeps the file reviewable.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::store::memory::{MemoryStore, StoreSnapshot};

/// Load a store from a snapshot file; a missing file yields an empty store
pub fn load_store(path: &Path) -> Result<MemoryStore> {
    if !path.exists() {
        return Ok(MemoryStore::new());
    }

    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read store snapshot {}", path.display()))?;

    let snapshot: StoreSnapshot = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse store snapshot {}", path.display()))?;

    Ok(MemoryStore::from_snapshot(snapshot))
}

/// Write the store contents back to the snapshot file
pub async fn save_store(store: &MemoryStore, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create store directory {}", parent.display()))?;
    }

    let snapshot = store.snapshot().await;
    let json = serde_json::to_string_pretty(&snapshot)
        .context("Failed to serialize store snapshot")?;

    fs::write(path, json)
        .with_context(|| format!("Failed to write store snapshot {}", path.display()))?;

    Ok(())
}
