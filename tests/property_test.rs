//! Property-based tests for active-time accounting and retry bounds

mod common;

use common::tracker;
use phantom_track::{
    Millis, PresenceState, ResponseDisposition, ResponseOutcome, TimerTask, Visibility,
};
use proptest::prelude::*;

const THRESHOLD: Millis = 30_000;

proptest! {
    /// Ticks closer than the threshold accumulate exactly their gaps
    #[test]
    fn prop_sum_of_short_gaps(gaps in prop::collection::vec(1..THRESHOLD, 1..200)) {
        let mut presence = PresenceState::new(THRESHOLD);
        let mut now = 0;
        presence.record_activity(now, Visibility::Visible);

        for gap in &gaps {
            now += gap;
            presence.record_activity(now, Visibility::Visible);
        }

        prop_assert_eq!(presence.active_ms(), gaps.iter().sum::<u64>());
    }

    /// Gaps at or past the threshold never count
    #[test]
    fn prop_long_gaps_ignored(gaps in prop::collection::vec(0..3 * THRESHOLD, 1..100)) {
        let mut presence = PresenceState::new(THRESHOLD);
        let mut now = 0;
        presence.record_activity(now, Visibility::Visible);

        for gap in &gaps {
            now += gap;
            presence.record_activity(now, Visibility::Visible);
        }

        let expected: u64 = gaps.iter().filter(|g| **g > 0 && **g < THRESHOLD).sum();
        prop_assert_eq!(presence.active_ms(), expected);
    }

    /// Splitting a gap with flushes never changes the total
    #[test]
    fn prop_flush_is_neutral(gap in 1..THRESHOLD, split in 0.0f64..1.0) {
        let mut ticked = PresenceState::new(THRESHOLD);
        ticked.record_activity(0, Visibility::Visible);
        ticked.record_activity(gap, Visibility::Visible);

        let mut flushed = PresenceState::new(THRESHOLD);
        flushed.record_activity(0, Visibility::Visible);
        flushed.flush((gap as f64 * split) as Millis, Visibility::Visible);
        flushed.record_activity(gap, Visibility::Visible);

        prop_assert_eq!(ticked.active_ms(), flushed.active_ms());
    }

    /// Any failure sequence leads to at most `max_retries` re-sends
    #[test]
    fn prop_retries_bounded(failures in prop::collection::vec(any::<bool>(), 1..10)) {
        let mut tracker = tracker();
        tracker.start();
        let mut now = 0;

        for rate_limited in failures {
            let id = tracker.transport().last_post_id();
            let outcome = if rate_limited {
                ResponseOutcome::Status(429)
            } else {
                ResponseOutcome::NetworkError("offline".into())
            };
            match tracker.on_response(id, outcome) {
                ResponseDisposition::RetryScheduled { delay_ms, .. } => {
                    now += delay_ms;
                    tracker.advance_to(now);
                }
                _ => break,
            }
        }

        let pageviews = tracker
            .transport()
            .posted_types()
            .into_iter()
            .filter(|t| t == "pageview")
            .count();
        prop_assert!(pageviews <= 4);
        prop_assert!(tracker
            .scheduler()
            .pending_tasks()
            .iter()
            .all(|(_, task)| !matches!(task, TimerTask::Retry(_))));
    }
}
