use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric ID types, kept numeric for wire compatibility with the web client
pub type UserId = u64;
pub type LocationId = u64;
pub type SubmissionId = u64;

/// Milliseconds since the Unix epoch, as the browser's `Date.now()` reports them
pub type Millis = i64;

pub fn now_millis() -> Millis {
    Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// What the client gets to see of a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// A hunt target. Locations are played in ascending id order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub clues: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLocation {
    pub name: String,
    pub clues: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub current_location_index: usize,
    pub visible_clue_indices: Vec<usize>,
    pub start_time: Option<Millis>,
    pub end_time: Option<Millis>,
    pub show_intro: bool,
    pub completed_locations: Vec<usize>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            current_location_index: 0,
            visible_clue_indices: vec![0],
            start_time: None,
            end_time: None,
            show_intro: true,
            completed_locations: Vec::new(),
        }
    }
}

/// Whose game state is being read or written.
///
/// Unauthenticated players all share the guest slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GameKey {
    User { user_id: UserId },
    Guest,
}

impl GameKey {
    pub fn for_user(user_id: Option<UserId>) -> Self {
        match user_id {
            Some(user_id) => GameKey::User { user_id },
            None => GameKey::Guest,
        }
    }
}

impl fmt::Display for GameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKey::User { user_id } => write!(f, "user:{}", user_id),
            GameKey::Guest => write!(f, "guest"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub user_id: UserId,
    pub location_id: LocationId,
    pub image_url: String,
    pub answer: String,
    pub correct_answer: bool,
    pub submitted_at: DateTime<Utc>,
    pub admin_comment: Option<String>,
    pub reviewed: bool,
}

#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub user_id: UserId,
    pub location_id: LocationId,
    pub image_url: String,
    pub answer: String,
    pub correct_answer: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_state_wire_format() {
        let json = serde_json::to_value(GameState::default()).unwrap();
        assert_eq!(json["currentLocationIndex"], 0);
        assert_eq!(json["visibleClueIndices"], serde_json::json!([0]));
        assert!(json["startTime"].is_null());
        assert_eq!(json["showIntro"], true);
    }

    #[test]
    fn test_user_view_hides_password() {
        let user = User {
            id: 7,
            username: "alice".to_string(),
            password_hash: "hashed".to_string(),
            is_admin: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&UserView::from(&user)).unwrap();
        assert!(!json.contains("digest"));
        assert!(json.contains("\"isAdmin\":false"));
    }

    #[test]
    fn test_game_key_display() {
        assert_eq!(GameKey::for_user(Some(3)).to_string(), "user:3");
        assert_eq!(GameKey::for_user(None).to_string(), "guest");
    }
}
