// User identity: configured id, or one generated once and kept on disk

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use toolchat_core::UserIdentity;

use crate::config::IdentityConfig;

const USER_ID_FILE: &str = "user_id";

pub fn resolve_identity(config: &IdentityConfig) -> Result<UserIdentity> {
    if let Some(user_id) = config
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
    {
        return Ok(UserIdentity::new(user_id));
    }

    load_or_create(&state_dir(config)?)
}

pub fn state_dir(config: &IdentityConfig) -> Result<PathBuf> {
    match &config.state_dir {
        Some(dir) => Ok(dir.clone()),
        None => dirs::data_dir()
            .map(|dir| dir.join("toolchat"))
            .context("Could not determine a data directory for the user id"),
    }
}

/// Read `<dir>/user_id`, generating and storing a new id when absent or blank
pub fn load_or_create(dir: &Path) -> Result<UserIdentity> {
    let path = dir.join(USER_ID_FILE);

    if path.exists() {
        let stored = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let stored = stored.trim();
        if !stored.is_empty() {
            return Ok(UserIdentity::new(stored));
        }
    }

    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let user_id = uuid::Uuid::new_v4().to_string();
    fs::write(&path, &user_id).with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), "Generated new user id");
    Ok(UserIdentity::new(user_id))
}
