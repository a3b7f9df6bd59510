use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::snapshot::{read_snapshot_file, write_snapshot_file};
use super::{HuntSnapshot, HuntStore, StoreError, StoreResult, StoredGameState};
use crate::types::*;

/// In-memory store, optionally mirrored to a JSON snapshot file
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    locations: Arc<RwLock<BTreeMap<LocationId, Location>>>,
    game_states: Arc<RwLock<HashMap<GameKey, GameState>>>,
    submissions: Arc<RwLock<HashMap<SubmissionId, Submission>>>,
    next_user_id: AtomicU64,
    next_location_id: AtomicU64,
    next_submission_id: AtomicU64,
    /// Snapshot file rewritten after every mutation
    data_file: Option<PathBuf>,
    /// Held across each mutation and its snapshot write, so a failed
    /// write can be rolled back before anyone else persists
    write_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            locations: Arc::new(RwLock::new(BTreeMap::new())),
            game_states: Arc::new(RwLock::new(HashMap::new())),
            submissions: Arc::new(RwLock::new(HashMap::new())),
            next_user_id: AtomicU64::new(1),
            next_location_id: AtomicU64::new(1),
            next_submission_id: AtomicU64::new(1),
            data_file: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Open a store backed by `path`, loading it if it exists
    pub async fn open(path: PathBuf) -> StoreResult<Self> {
        let mut store = Self::new();
        if let Some(snapshot) = read_snapshot_file(&path).await? {
            tracing::info!(
                "Loaded {} users, {} locations, {} submissions from {}",
                snapshot.users.len(),
                snapshot.locations.len(),
                snapshot.submissions.len(),
                path.display()
            );
            store.replace_all(snapshot).await;
        } else {
            tracing::info!("No data file at {}, starting empty", path.display());
        }
        store.data_file = Some(path);
        Ok(store)
    }

    async fn replace_all(&self, snapshot: HuntSnapshot) {
        self.next_user_id
            .store(next_id(snapshot.users.iter().map(|u| u.id)), Ordering::SeqCst);
        self.next_location_id
            .store(next_id(snapshot.locations.iter().map(|l| l.id)), Ordering::SeqCst);
        self.next_submission_id
            .store(next_id(snapshot.submissions.iter().map(|s| s.id)), Ordering::SeqCst);

        *self.users.write().await = snapshot.users.into_iter().map(|u| (u.id, u)).collect();
        *self.locations.write().await = snapshot.locations.into_iter().map(|l| (l.id, l)).collect();
        *self.game_states.write().await = snapshot
            .game_states
            .into_iter()
            .map(|g| (g.key, g.state))
            .collect();
        *self.submissions.write().await = snapshot
            .submissions
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
    }

    /// Mirror the current contents to the data file, if there is one.
    /// Callers hold `write_lock` and no collection lock.
    async fn persist(&self) -> StoreResult<()> {
        let Some(ref path) = self.data_file else {
            return Ok(());
        };
        let snapshot = self.export_snapshot().await?;
        write_snapshot_file(path, &snapshot).await
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn next_id(ids: impl Iterator<Item = u64>) -> u64 {
    ids.max().map_or(1, |max| max + 1)
}

fn newest_first(mut submissions: Vec<Submission>) -> Vec<Submission> {
    submissions.sort_by(|a, b| {
        b.submitted_at
            .cmp(&a.submitted_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    submissions
}

#[async_trait]
impl HuntStore for MemoryStore {
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let _guard = self.write_lock.lock().await;
        let user = {
            let mut users = self.users.write().await;
            if users.values().any(|u| u.username == new_user.username) {
                return Err(StoreError::Conflict("Username already exists".to_string()));
            }
            let user = User {
                id: self.next_user_id.fetch_add(1, Ordering::SeqCst),
                username: new_user.username,
                password_hash: new_user.password_hash,
                is_admin: new_user.is_admin,
                created_at: chrono::Utc::now(),
            };
            users.insert(user.id, user.clone());
            user
        };
        if let Err(e) = self.persist().await {
            self.users.write().await.remove(&user.id);
            return Err(e);
        }
        Ok(user)
    }

    async fn list_locations(&self) -> StoreResult<Vec<Location>> {
        Ok(self.locations.read().await.values().cloned().collect())
    }

    async fn get_location(&self, id: LocationId) -> StoreResult<Option<Location>> {
        Ok(self.locations.read().await.get(&id).cloned())
    }

    async fn add_location(&self, new_location: NewLocation) -> StoreResult<Location> {
        let _guard = self.write_lock.lock().await;
        let location = Location {
            id: self.next_location_id.fetch_add(1, Ordering::SeqCst),
            name: new_location.name,
            clues: new_location.clues,
            answer: new_location.answer,
        };
        self.locations
            .write()
            .await
            .insert(location.id, location.clone());
        if let Err(e) = self.persist().await {
            self.locations.write().await.remove(&location.id);
            return Err(e);
        }
        Ok(location)
    }

    async fn get_game_state(&self, key: &GameKey) -> StoreResult<Option<GameState>> {
        Ok(self.game_states.read().await.get(key).cloned())
    }

    async fn save_game_state(&self, key: &GameKey, state: GameState) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let previous = self.game_states.write().await.insert(key.clone(), state);
        if let Err(e) = self.persist().await {
            let mut game_states = self.game_states.write().await;
            match previous {
                Some(previous) => game_states.insert(key.clone(), previous),
                None => game_states.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn create_submission(&self, new_submission: NewSubmission) -> StoreResult<Submission> {
        let _guard = self.write_lock.lock().await;
        let submission = Submission {
            id: self.next_submission_id.fetch_add(1, Ordering::SeqCst),
            user_id: new_submission.user_id,
            location_id: new_submission.location_id,
            image_url: new_submission.image_url,
            answer: new_submission.answer,
            correct_answer: new_submission.correct_answer,
            submitted_at: chrono::Utc::now(),
            admin_comment: None,
            reviewed: false,
        };
        self.submissions
            .write()
            .await
            .insert(submission.id, submission.clone());
        if let Err(e) = self.persist().await {
            self.submissions.write().await.remove(&submission.id);
            return Err(e);
        }
        Ok(submission)
    }

    async fn get_submission(&self, id: SubmissionId) -> StoreResult<Option<Submission>> {
        Ok(self.submissions.read().await.get(&id).cloned())
    }

    async fn submissions_for_user(&self, user_id: UserId) -> StoreResult<Vec<Submission>> {
        let mine = self
            .submissions
            .read()
            .await
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(mine))
    }

    async fn all_submissions(&self) -> StoreResult<Vec<Submission>> {
        let all = self.submissions.read().await.values().cloned().collect();
        Ok(newest_first(all))
    }

    async fn update_submission(&self, submission: Submission) -> StoreResult<Option<Submission>> {
        let _guard = self.write_lock.lock().await;
        let previous = {
            let mut submissions = self.submissions.write().await;
            match submissions.get_mut(&submission.id) {
                Some(existing) => std::mem::replace(existing, submission.clone()),
                None => return Ok(None),
            }
        };
        if let Err(e) = self.persist().await {
            self.submissions
                .write()
                .await
                .insert(previous.id, previous);
            return Err(e);
        }
        Ok(Some(submission))
    }

    async fn export_snapshot(&self) -> StoreResult<HuntSnapshot> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        let locations = self.list_locations().await?;
        let mut game_states: Vec<StoredGameState> = self
            .game_states
            .read()
            .await
            .iter()
            .map(|(key, state)| StoredGameState {
                key: key.clone(),
                state: state.clone(),
            })
            .collect();
        game_states.sort_by_key(|g| g.key.to_string());
        let mut submissions: Vec<Submission> =
            self.submissions.read().await.values().cloned().collect();
        submissions.sort_by_key(|s| s.id);

        Ok(HuntSnapshot::new(users, locations, game_states, submissions))
    }

    async fn import_snapshot(&self, snapshot: HuntSnapshot) -> StoreResult<()> {
        snapshot.validate().map_err(StoreError::InvalidSnapshot)?;
        let _guard = self.write_lock.lock().await;
        let previous = self.export_snapshot().await?;
        self.replace_all(snapshot).await;
        if let Err(e) = self.persist().await {
            self.replace_all(previous).await;
            return Err(e);
        }
        Ok(())
    }
}
