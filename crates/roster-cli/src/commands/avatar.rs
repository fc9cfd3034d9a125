//! Avatar command handlers

use std::path::Path;

use anyhow::Result;

use roster_core::SyncEngine;

use crate::avatar::data_uri_from_file;
use crate::output::Output;

/// Set a user's avatar from an image file
pub async fn set(engine: &mut SyncEngine, id: u64, path: &Path, output: &Output) -> Result<()> {
    let data_uri = data_uri_from_file(path)?;

    // Ensure the record exists somewhere before attaching an avatar
    engine.fetch_one(id).await?;
    engine.set_avatar(id, Some(data_uri));

    output.success(&format!("Avatar set for user {}", id));
    Ok(())
}

/// Remove a user's avatar
pub async fn remove(engine: &mut SyncEngine, id: u64, output: &Output) -> Result<()> {
    if let Err(e) = engine.fetch_all().await {
        output.warning(&format!("Could not load existing users: {}", e));
    }
    engine.set_avatar(id, None);

    output.success(&format!("Avatar removed for user {}", id));
    Ok(())
}
