//! Hunt progression.
//!
//! The progression engine is a small state machine over [`GameState`]:
//! `NotStarted -> InProgress -> Completed`. Transitions take the ordered
//! location list and a timestamp, mutate the state in place and report
//! what happened so the caller can phrase feedback.

pub mod answer;

use crate::types::{GameState, Location, Millis};
use serde::Serialize;

pub use answer::{answers_match, normalize};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HuntPhase {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The guess matched; `finished` is true when this was the last location
    Correct { finished: bool },
    Incorrect,
    /// The state does not accept answers right now
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClueOutcome {
    Revealed(usize),
    /// Every clue for this location is already visible
    Exhausted,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipOutcome {
    Skipped { answer: String, finished: bool },
    Ignored,
}

impl GameState {
    pub fn phase(&self) -> HuntPhase {
        if self.end_time.is_some() {
            HuntPhase::Completed
        } else if self.show_intro {
            HuntPhase::NotStarted
        } else {
            HuntPhase::InProgress
        }
    }

    /// Stale states (index past the end, or an empty hunt) accept no transitions
    fn is_stale(&self, locations: &[Location]) -> bool {
        self.current_location_index >= locations.len()
    }

    fn is_playable(&self, locations: &[Location]) -> bool {
        !self.is_stale(locations) && self.phase() == HuntPhase::InProgress
    }

    /// Leave the intro and start the clock. Returns false if nothing changed.
    pub fn start(&mut self, locations: &[Location], now: Millis) -> bool {
        if self.is_stale(locations) || self.phase() != HuntPhase::NotStarted {
            return false;
        }
        self.show_intro = false;
        self.start_time = Some(now);
        if self.visible_clue_indices.is_empty() {
            self.visible_clue_indices.push(0);
        }
        true
    }

    pub fn check_answer(
        &mut self,
        locations: &[Location],
        guess: &str,
        now: Millis,
    ) -> AnswerOutcome {
        if !self.is_playable(locations) {
            return AnswerOutcome::Ignored;
        }
        let location = &locations[self.current_location_index];
        if !answers_match(guess, &location.answer) {
            return AnswerOutcome::Incorrect;
        }
        let finished = self.advance(locations.len(), now);
        AnswerOutcome::Correct { finished }
    }

    /// Reveal the lowest clue index not yet visible
    pub fn request_next_clue(&mut self, locations: &[Location]) -> ClueOutcome {
        if !self.is_playable(locations) {
            return ClueOutcome::Ignored;
        }
        let clue_count = locations[self.current_location_index].clues.len();
        match (0..clue_count).find(|i| !self.visible_clue_indices.contains(i)) {
            Some(next) => {
                self.visible_clue_indices.push(next);
                ClueOutcome::Revealed(next)
            }
            None => ClueOutcome::Exhausted,
        }
    }

    /// Give up on the current location: reveal its answer and move on as if solved
    pub fn give_up_and_skip(&mut self, locations: &[Location], now: Millis) -> SkipOutcome {
        if !self.is_playable(locations) {
            return SkipOutcome::Ignored;
        }
        let answer = locations[self.current_location_index].answer.clone();
        let finished = self.advance(locations.len(), now);
        SkipOutcome::Skipped { answer, finished }
    }

    /// Back to the first location with the clock restarted, skipping the intro
    pub fn restart(&mut self, locations: &[Location], now: Millis) -> bool {
        if locations.is_empty() {
            return false;
        }
        *self = GameState {
            show_intro: false,
            start_time: Some(now),
            ..GameState::default()
        };
        true
    }

    /// Mark the current location done. The terminal location keeps its index.
    fn advance(&mut self, total: usize, now: Millis) -> bool {
        self.completed_locations.push(self.current_location_index);
        if self.current_location_index + 1 >= total {
            self.end_time = Some(now);
            true
        } else {
            self.current_location_index += 1;
            self.visible_clue_indices = vec![0];
            false
        }
    }
}
