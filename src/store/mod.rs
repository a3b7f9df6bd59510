//! Persistence gateway.
//!
//! Everything the server keeps between requests goes through [`HuntStore`].
//! The only implementation is the in-memory [`MemoryStore`], which can
//! mirror itself to a JSON snapshot file.

mod memory;
pub mod seed;
pub mod snapshot;

use async_trait::async_trait;

use crate::types::*;

pub use memory::MemoryStore;
pub use snapshot::{HuntSnapshot, StoredGameState, SNAPSHOT_SCHEMA_VERSION};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),

    #[error("Storage I/O failed: {0}")]
    Io(String),

    #[error("Snapshot encoding failed: {0}")]
    Serialization(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Storage seam for users, locations, game state and submissions.
///
/// Reads return owned copies; writes are whole-record replacements, so
/// concurrent read-modify-write cycles on the same record are
/// last-writer-wins.
#[async_trait]
pub trait HuntStore: Send + Sync {
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Fails with [`StoreError::Conflict`] when the username is taken
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// All locations in hunt order
    async fn list_locations(&self) -> StoreResult<Vec<Location>>;

    async fn get_location(&self, id: LocationId) -> StoreResult<Option<Location>>;

    async fn add_location(&self, location: NewLocation) -> StoreResult<Location>;

    async fn get_game_state(&self, key: &GameKey) -> StoreResult<Option<GameState>>;

    async fn save_game_state(&self, key: &GameKey, state: GameState) -> StoreResult<()>;

    async fn create_submission(&self, submission: NewSubmission) -> StoreResult<Submission>;

    async fn get_submission(&self, id: SubmissionId) -> StoreResult<Option<Submission>>;

    /// A user's submissions, newest first
    async fn submissions_for_user(&self, user_id: UserId) -> StoreResult<Vec<Submission>>;

    /// Every submission, newest first
    async fn all_submissions(&self) -> StoreResult<Vec<Submission>>;

    /// Replace a stored submission. Returns `None` if it no longer exists.
    async fn update_submission(&self, submission: Submission) -> StoreResult<Option<Submission>>;

    async fn export_snapshot(&self) -> StoreResult<HuntSnapshot>;

    /// Replace all stored data with the snapshot's contents
    async fn import_snapshot(&self, snapshot: HuntSnapshot) -> StoreResult<()>;
}
