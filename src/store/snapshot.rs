//! Snapshot export/import.
//!
//! A snapshot is the full store contents as one JSON document. It backs
//! the admin export/import endpoints and the optional data file.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::{StoreError, StoreResult};
use crate::types::*;

/// Schema version for snapshot format compatibility
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredGameState {
    pub key: GameKey,
    pub state: GameState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HuntSnapshot {
    pub schema_version: u32,
    /// Export timestamp (RFC 3339)
    pub exported_at: String,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub game_states: Vec<StoredGameState>,
    #[serde(default)]
    pub submissions: Vec<Submission>,
}

impl HuntSnapshot {
    pub fn new(
        users: Vec<User>,
        locations: Vec<Location>,
        game_states: Vec<StoredGameState>,
        submissions: Vec<Submission>,
    ) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            exported_at: chrono::Utc::now().to_rfc3339(),
            users,
            locations,
            game_states,
            submissions,
        }
    }

    /// Validate the snapshot before import
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version > SNAPSHOT_SCHEMA_VERSION {
            return Err(format!(
                "Snapshot schema version {} is newer than supported version {}",
                self.schema_version, SNAPSHOT_SCHEMA_VERSION
            ));
        }

        let mut user_ids = HashSet::new();
        let mut usernames = HashSet::new();
        for user in &self.users {
            if !user_ids.insert(user.id) {
                return Err(format!("Duplicate user id {}", user.id));
            }
            if !usernames.insert(user.username.as_str()) {
                return Err(format!("Duplicate username '{}'", user.username));
            }
        }

        let mut location_ids = HashSet::new();
        for location in &self.locations {
            if !location_ids.insert(location.id) {
                return Err(format!("Duplicate location id {}", location.id));
            }
        }

        let mut submission_ids = HashSet::new();
        for sub in &self.submissions {
            if !submission_ids.insert(sub.id) {
                return Err(format!("Duplicate submission id {}", sub.id));
            }
            if !user_ids.contains(&sub.user_id) {
                return Err(format!(
                    "Submission {} references user {} which doesn't exist",
                    sub.id, sub.user_id
                ));
            }
            if !location_ids.contains(&sub.location_id) {
                return Err(format!(
                    "Submission {} references location {} which doesn't exist",
                    sub.id, sub.location_id
                ));
            }
        }

        Ok(())
    }
}

/// Read a snapshot file. A missing file is not an error.
pub async fn read_snapshot_file(path: &Path) -> StoreResult<Option<HuntSnapshot>> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let snapshot: HuntSnapshot = serde_json::from_slice(&raw)?;
    snapshot.validate().map_err(StoreError::InvalidSnapshot)?;
    Ok(Some(snapshot))
}

/// Write a snapshot file via a sibling temp file and rename
pub async fn write_snapshot_file(path: &Path, snapshot: &HuntSnapshot) -> StoreResult<()> {
    let json = serde_json::to_vec_pretty(snapshot)?;
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
