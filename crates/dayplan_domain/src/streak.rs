use serde::{Deserialize, Serialize};

use crate::day::Day;

/// Derived streak figures for one activity. Never persisted; recomputed
/// from day history on every query.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Streak {
    pub current: u32,
    pub longest: u32,
    pub next: u32,
}

/// Compute streaks from day history ordered date-descending (most recent
/// first, including today).
///
/// The walk mirrors the product's original accounting: the most recent
/// day seeds the run, each older done day extends it, and the first
/// not-done day freezes `current` at the run length reached so far. With
/// no gap at all, `current` is the whole run.
pub fn streak_for(activity_id: &str, history: &[Day]) -> Streak {
    let mut current_run: u32 = 0;
    let mut max_run: u32 = 0;
    let mut frozen: Option<u32> = None;

    for day in history {
        if day.completed(activity_id) {
            current_run += 1;
        } else {
            if frozen.is_none() {
                frozen = Some(current_run);
            }
            max_run = max_run.max(current_run);
            current_run = 0;
        }
    }
    max_run = max_run.max(current_run);
    let current = frozen.unwrap_or(current_run);

    Streak {
        current,
        longest: max_run,
        next: next_milestone(current, max_run),
    }
}

/// Milestone ladder: fixed rungs at 4, 8, 15 and 31, then rolling
/// multiples of 25. Sitting below the personal best caps the target at
/// that best; matching it unlocks the next rung. Deliberate product
/// policy, thresholds reproduced exactly.
fn next_milestone(last: u32, max: u32) -> u32 {
    match last {
        0 => 0,
        1..=3 => {
            if last == max {
                4
            } else {
                4.min(max)
            }
        }
        4..=7 => {
            if last == max {
                8
            } else {
                8.min(max)
            }
        }
        8..=14 => {
            if last == max {
                15
            } else {
                15.min(max)
            }
        }
        15..=30 => {
            if last == max {
                31
            } else {
                31.min(max)
            }
        }
        _ => {
            if last < max {
                max
            } else {
                (last / 25 + 1) * 25
            }
        }
    }
}
