use serde::Serialize;

use super::AppState;
use crate::error::ApiResult;
use crate::hunt::{AnswerOutcome, ClueOutcome, HuntPhase, SkipOutcome};
use crate::types::*;

/// A player action run through the progression engine
#[derive(Debug, Clone)]
pub enum HuntAction {
    Start,
    Answer(String),
    Clue,
    Skip,
    Restart,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ActionOutcome {
    Started,
    Correct { finished: bool },
    Incorrect,
    ClueRevealed { index: usize },
    /// All clues are showing; skipping is the only way forward
    CluesExhausted,
    Skipped { answer: String, finished: bool },
    Restarted,
    /// The action does not apply in the current phase
    Ignored,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HuntReport {
    pub state: GameState,
    pub phase: HuntPhase,
    pub total_locations: usize,
    #[serde(flatten)]
    pub outcome: ActionOutcome,
}

impl AppState {
    /// Apply a player action to the stored state for `key`.
    ///
    /// Missing state counts as a fresh game. The state is saved only when
    /// the action changed it.
    pub async fn play(&self, key: &GameKey, action: HuntAction) -> ApiResult<HuntReport> {
        let locations = self.store.list_locations().await?;
        let mut state = self.store.get_game_state(key).await?.unwrap_or_default();
        let before = state.clone();
        let now = now_millis();

        let outcome = match action {
            HuntAction::Start if state.start(&locations, now) => ActionOutcome::Started,
            HuntAction::Answer(guess) => match state.check_answer(&locations, &guess, now) {
                AnswerOutcome::Correct { finished } => ActionOutcome::Correct { finished },
                AnswerOutcome::Incorrect => ActionOutcome::Incorrect,
                AnswerOutcome::Ignored => ActionOutcome::Ignored,
            },
            HuntAction::Clue => match state.request_next_clue(&locations) {
                ClueOutcome::Revealed(index) => ActionOutcome::ClueRevealed { index },
                ClueOutcome::Exhausted => ActionOutcome::CluesExhausted,
                ClueOutcome::Ignored => ActionOutcome::Ignored,
            },
            HuntAction::Skip => match state.give_up_and_skip(&locations, now) {
                SkipOutcome::Skipped { answer, finished } => {
                    ActionOutcome::Skipped { answer, finished }
                }
                SkipOutcome::Ignored => ActionOutcome::Ignored,
            },
            HuntAction::Restart if state.restart(&locations, now) => ActionOutcome::Restarted,
            HuntAction::Start | HuntAction::Restart => ActionOutcome::Ignored,
        };

        if state != before {
            self.store.save_game_state(key, state.clone()).await?;
        }
        tracing::debug!(owner = %key, ?outcome, "Hunt action applied");

        Ok(HuntReport {
            phase: state.phase(),
            state,
            total_locations: locations.len(),
            outcome,
        })
    }
}
