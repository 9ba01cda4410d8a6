use chrono::{DateTime, Utc};

use crate::status::StatusSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// First completed cycle; nothing to compare against
    Initial,
    Steady,
    WentDown,
    CameUp,
}

impl Transition {
    pub fn evaluate(previous: Option<bool>, current: bool) -> Transition {
        match (previous, current) {
            (None, _) => Transition::Initial,
            (Some(true), false) => Transition::WentDown,
            (Some(false), true) => Transition::CameUp,
            _ => Transition::Steady,
        }
    }

    /// Whether this transition changes `last_change`
    pub fn is_change(&self) -> bool {
        matches!(self, Transition::WentDown | Transition::CameUp)
    }
}

/// Outcome of one cycle, computed before anything is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CyclePlan {
    pub transition: Transition,
    pub next: StatusSnapshot,
}

/// Decide the next status snapshot from the previous one and this cycle's verdict
pub fn plan_cycle(previous: &StatusSnapshot, up: bool, now: DateTime<Utc>) -> CyclePlan {
    let transition = Transition::evaluate(previous.up, up);

    let last_change = if transition.is_change() {
        Some(now)
    } else {
        previous.last_change
    };

    CyclePlan {
        transition,
        next: StatusSnapshot {
            up: Some(up),
            last_check: Some(now),
            last_change,
        },
    }
}
