//! Typewriter effect for the header tagline.

use std::time::{Duration, Instant};

const TYPE_DELAY: Duration = Duration::from_millis(100);
const DELETE_DELAY: Duration = Duration::from_millis(50);
const HOLD_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Typing,
    Holding,
    Deleting,
}

/// Types each line out, holds it, deletes it, then moves to the next.
#[derive(Debug, Clone)]
pub struct TypingEffect {
    lines: Vec<Vec<char>>,
    line: usize,
    visible: usize,
    phase: Phase,
    next_step_at: Option<Instant>,
}

impl TypingEffect {
    pub fn new<S: AsRef<str>>(lines: &[S]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.as_ref().chars().collect()).collect(),
            line: 0,
            visible: 0,
            phase: Phase::Typing,
            next_step_at: None,
        }
    }

    /// Advances one character and returns how long to wait before the next
    /// step.
    pub fn step(&mut self) -> Duration {
        let Some(current) = self.lines.get(self.line) else {
            return HOLD_DELAY;
        };
        let len = current.len();

        match self.phase {
            Phase::Typing => {
                self.visible = (self.visible + 1).min(len);
                if self.visible == len {
                    self.phase = Phase::Holding;
                    HOLD_DELAY
                } else {
                    TYPE_DELAY
                }
            }
            Phase::Holding | Phase::Deleting => {
                self.visible = self.visible.saturating_sub(1);
                if self.visible == 0 {
                    self.line = (self.line + 1) % self.lines.len();
                    self.phase = Phase::Typing;
                    TYPE_DELAY
                } else {
                    self.phase = Phase::Deleting;
                    DELETE_DELAY
                }
            }
        }
    }

    /// Applies every step that is due by `now`.
    pub fn tick(&mut self, now: Instant) {
        if self.lines.is_empty() {
            return;
        }

        let mut due = *self.next_step_at.get_or_insert(now);
        while due <= now {
            due += self.step();
        }
        self.next_step_at = Some(due);
    }

    /// The part of the current line typed so far.
    pub fn text(&self) -> String {
        self.lines
            .get(self.line)
            .map(|line| line[..self.visible].iter().collect())
            .unwrap_or_default()
    }
}
