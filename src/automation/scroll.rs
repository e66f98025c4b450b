//! Sliding-window bookkeeping for long, scrolling question pages.
//!
//! Consecutive captures overlap, so the same question can be visible in
//! several windows. The tracker remembers every answered id for the whole
//! session and decides how far to scroll next.

use std::collections::{BTreeMap, BTreeSet};

/// Chooses how many pixels to scroll after looking at one window.
///
/// `positions` maps visible question ids to their top offset in the window.
/// With no visible questions this is a blind step of one window minus the
/// overlap. Otherwise the step brings the last visible question near the top,
/// never less than half a window and never more than one window minus the overlap.
pub fn choose_scroll_distance(
    positions: &BTreeMap<u32, i32>,
    view_height: i32,
    overlap: i32,
) -> i32 {
    let max_step = view_height - overlap;

    let Some(last_y) = positions.values().copied().max() else {
        return max_step;
    };

    (last_y - overlap).max(view_height / 2).min(max_step)
}

/// Answered-question set plus the window geometry used for scrolling.
#[derive(Debug, Clone)]
pub struct ScrollWindowTracker {
    answered: BTreeSet<u32>,
    view_height: i32,
    overlap: i32,
}

impl ScrollWindowTracker {
    pub fn new(view_height: i32, overlap: i32) -> Self {
        Self {
            answered: BTreeSet::new(),
            view_height,
            overlap,
        }
    }

    /// Records `id` as answered. Returns false if it already was.
    pub fn mark_answered(&mut self, id: u32) -> bool {
        self.answered.insert(id)
    }

    pub fn is_answered(&self, id: u32) -> bool {
        self.answered.contains(&id)
    }

    pub fn answered_count(&self) -> usize {
        self.answered.len()
    }

    /// Visible ids that still need an answer, ascending.
    pub fn unanswered_in_view(&self, positions: &BTreeMap<u32, i32>) -> Vec<u32> {
        positions
            .keys()
            .copied()
            .filter(|id| !self.is_answered(*id))
            .collect()
    }

    /// Step used when a window shows no legible question number.
    pub fn blind_step(&self) -> i32 {
        self.view_height - self.overlap
    }

    pub fn next_distance(&self, positions: &BTreeMap<u32, i32>) -> i32 {
        choose_scroll_distance(positions, self.view_height, self.overlap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(entries: &[(u32, i32)]) -> BTreeMap<u32, i32> {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_blind_step_when_no_questions() {
        for (height, overlap) in [(1000, 150), (600, 0), (10, 9), (801, 400)] {
            assert_eq!(
                choose_scroll_distance(&BTreeMap::new(), height, overlap),
                height - overlap
            );
        }
    }

    #[test]
    fn test_distance_follows_last_question() {
        // last question at 800 → 800 - 150 = 650, inside [500, 850]
        assert_eq!(
            choose_scroll_distance(&positions(&[(1, 100), (2, 800)]), 1000, 150),
            650
        );
    }

    #[test]
    fn test_distance_floor_is_half_window() {
        assert_eq!(choose_scroll_distance(&positions(&[(1, 100)]), 1000, 150), 500);
    }

    #[test]
    fn test_distance_clamped_to_window_minus_overlap() {
        // A marker reported below the window would overshoot without the clamp
        assert_eq!(choose_scroll_distance(&positions(&[(7, 1200)]), 1000, 100), 900);
    }

    #[test]
    fn test_distance_near_window_bottom() {
        assert_eq!(choose_scroll_distance(&positions(&[(7, 990)]), 1000, 100), 890);
    }

    #[test]
    fn test_distance_bounds_hold_for_many_inputs() {
        let height = 1000;
        for overlap in [0, 50, 150, 400, 499] {
            for last_y in (0..=height).step_by(37) {
                let d = choose_scroll_distance(&positions(&[(1, 5), (2, last_y)]), height, overlap);
                assert!(d <= height - overlap, "d={} o={} y={}", d, overlap, last_y);
                assert!(d >= height / 2, "d={} o={} y={}", d, overlap, last_y);
            }
        }
    }

    #[test]
    fn test_mark_answered_is_permanent_and_idempotent() {
        let mut tracker = ScrollWindowTracker::new(1000, 150);
        assert!(!tracker.is_answered(3));
        assert!(tracker.mark_answered(3));
        assert!(!tracker.mark_answered(3));
        assert!(tracker.is_answered(3));
        tracker.mark_answered(4);
        assert!(tracker.is_answered(3));
        assert_eq!(tracker.answered_count(), 2);
    }

    #[test]
    fn test_unanswered_in_view_ascending() {
        let mut tracker = ScrollWindowTracker::new(1000, 150);
        tracker.mark_answered(2);
        let visible = positions(&[(5, 700), (2, 100), (3, 400)]);
        assert_eq!(tracker.unanswered_in_view(&visible), vec![3, 5]);
        assert_eq!(tracker.blind_step(), 850);
        assert_eq!(tracker.next_distance(&visible), 550);
    }
}
