//! Typewriter animation for the input placeholder.
//!
//! The animator owns no timers. The view advances it by the time elapsed
//! since its previous tick and every transition that fell due in that window
//! is applied in order, so a torn-down view simply stops calling it.

use std::time::Duration;

use crate::constants::{
    PLACEHOLDER_ADVANCE_DELAY, PLACEHOLDER_DELETE_INTERVAL, PLACEHOLDER_HOLD_DELAY,
    PLACEHOLDER_START_DELAY, PLACEHOLDER_TYPE_INTERVAL,
};

pub const PLACEHOLDER_PHRASES: &[&str] = &[
    "Type your question...",
    "How old are you?",
    "What are your skills?",
    "Where are you located?",
    "What projects have you worked on?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Appending one character per type interval.
    Typing,
    /// Phrase fully shown.
    Holding,
    /// Removing one character per delete interval.
    Deleting,
    /// Empty, waiting before moving to the next phrase.
    Advancing,
}

#[derive(Debug, Clone)]
pub struct PlaceholderAnimator {
    phrases: Vec<String>,
    index: usize,
    shown: String,
    phase: Phase,
    until_next: Duration,
}

impl Default for PlaceholderAnimator {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaceholderAnimator {
    pub fn new() -> Self {
        Self::with_phrases(PLACEHOLDER_PHRASES.iter().copied())
    }

    pub fn with_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phrases: phrases.into_iter().map(Into::into).collect(),
            index: 0,
            shown: String::new(),
            phase: Phase::Typing,
            // The first character lands one type interval after the mount delay.
            until_next: PLACEHOLDER_START_DELAY + PLACEHOLDER_TYPE_INTERVAL,
        }
    }

    /// Current hint text.
    pub fn text(&self) -> &str {
        &self.shown
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Index of the phrase being typed or deleted.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Time left until the next transition.
    pub fn until_next(&self) -> Duration {
        self.until_next
    }

    pub fn advance(&mut self, mut elapsed: Duration) {
        if self.phrases.is_empty() {
            return;
        }
        while elapsed >= self.until_next {
            elapsed -= self.until_next;
            self.step();
        }
        self.until_next -= elapsed;
    }

    fn step(&mut self) {
        match self.phase {
            Phase::Typing => {
                let target = &self.phrases[self.index];
                let shown_len = self.shown.chars().count();
                if let Some(c) = target.chars().nth(shown_len) {
                    self.shown.push(c);
                }
                if self.shown.chars().count() >= target.chars().count() {
                    self.phase = Phase::Holding;
                    self.until_next = PLACEHOLDER_HOLD_DELAY;
                } else {
                    self.until_next = PLACEHOLDER_TYPE_INTERVAL;
                }
            }
            Phase::Holding => {
                self.phase = Phase::Deleting;
                self.until_next = PLACEHOLDER_DELETE_INTERVAL;
            }
            Phase::Deleting => {
                self.shown.pop();
                if self.shown.is_empty() {
                    self.phase = Phase::Advancing;
                    self.until_next = PLACEHOLDER_ADVANCE_DELAY;
                } else {
                    self.until_next = PLACEHOLDER_DELETE_INTERVAL;
                }
            }
            Phase::Advancing => {
                self.index = (self.index + 1) % self.phrases.len();
                self.phase = Phase::Typing;
                self.until_next = PLACEHOLDER_TYPE_INTERVAL;
            }
        }
    }
}
