//! Decision logic for the periodic cleanup sweeps.
//!
//! The sweeps themselves live in the API crate's background tasks; the
//! rules for whether a given record is stale are pure functions here so
//! they can be tested against the schedule edge cases without a database.

use chrono::Duration;

use crate::types::{TermWindow, Timestamp};

/// Outcome of the stale room entry check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleEntryAction {
    /// Leave the entry alone for now.
    Keep,
    /// Cancel the entry; no holding will legitimately pick it up.
    Cancel,
}

/// Decide whether a `created` room entry that was never assigned to a
/// holding should be canceled.
///
/// `day_terms` are the course-group terms scheduled in the entry's room on
/// the day of the swipe, sorted by start time. The rules cover the cases
/// where a holding was never started:
///
/// - The student swiped ahead of a scheduled term: the entry survives as
///   long as that term has not ended.
/// - The student swiped with no scheduled term in reach: the entry
///   survives for `lifetime` after the swipe.
/// - The student swiped during a term, within `buffer` before the next
///   scheduled term: the entry survives, it may belong to the follow-up
///   session.
pub fn stale_entry_action(
    created: Timestamp,
    now: Timestamp,
    lifetime: Duration,
    buffer: Duration,
    day_terms: &[TermWindow],
) -> StaleEntryAction {
    // The current or next term that could still claim this entry.
    let current = day_terms
        .iter()
        .find(|t| t.start <= created + lifetime && t.end >= created);

    let Some(current) = current else {
        // No scheduled term left in reach; the entry lifetime alone decides.
        if created + lifetime > now {
            return StaleEntryAction::Keep;
        }
        return StaleEntryAction::Cancel;
    };

    if created > current.start {
        // Swiped during the term; a swipe within the buffer ahead of the
        // following term belongs to that one and is left alone.
        let next = day_terms.iter().find(|t| t.start >= current.end);
        if let Some(next) = next {
            if next.start - buffer < created {
                return StaleEntryAction::Keep;
            }
        }
    }

    if current.end > now {
        // The claiming term is still in its scheduled time range.
        return StaleEntryAction::Keep;
    }

    StaleEntryAction::Cancel
}

/// Check whether a running holding has overrun its scheduled duration plus
/// the overdraft allowance.
///
/// Returns the backdated finish timestamp (`initiated` plus the scheduled
/// term duration) when the holding must be force-ended, so closure is
/// recorded at the official end rather than the detection time.
pub fn overrun_backdate(
    initiated: Timestamp,
    term: TermWindow,
    overdraft: Duration,
    now: Timestamp,
) -> Option<Timestamp> {
    let deadline = initiated + term.duration() + overdraft;
    if now > deadline {
        Some(initiated + term.duration())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn at(hour: u32, min: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, min, 0).unwrap()
    }

    fn window(start: Timestamp, end: Timestamp) -> TermWindow {
        TermWindow { start, end }
    }

    fn lifetime() -> Duration {
        Duration::minutes(45)
    }

    fn buffer() -> Duration {
        Duration::minutes(15)
    }

    #[test]
    fn test_no_terms_keeps_within_lifetime() {
        let action = stale_entry_action(at(9, 0), at(9, 30), lifetime(), buffer(), &[]);
        assert_eq!(action, StaleEntryAction::Keep);
    }

    #[test]
    fn test_no_terms_cancels_after_lifetime() {
        let action = stale_entry_action(at(9, 0), at(9, 45), lifetime(), buffer(), &[]);
        assert_eq!(action, StaleEntryAction::Cancel);
    }

    #[test]
    fn test_next_term_out_of_reach_cancels_at_lifetime() {
        // Swipe at 09:00, next term only at 10:30: canceled at/after 09:45.
        let terms = [window(at(10, 30), at(11, 20))];
        assert_eq!(
            stale_entry_action(at(9, 0), at(9, 44), lifetime(), buffer(), &terms),
            StaleEntryAction::Keep
        );
        assert_eq!(
            stale_entry_action(at(9, 0), at(9, 45), lifetime(), buffer(), &terms),
            StaleEntryAction::Cancel
        );
    }

    #[test]
    fn test_swipe_ahead_of_term_survives_until_term_end() {
        // Swipe at 09:50 for a 10:00-10:50 term that never gets a holding.
        let terms = [window(at(10, 0), at(10, 50))];
        assert_eq!(
            stale_entry_action(at(9, 50), at(10, 45), lifetime(), buffer(), &terms),
            StaleEntryAction::Keep
        );
        assert_eq!(
            stale_entry_action(at(9, 50), at(10, 51), lifetime(), buffer(), &terms),
            StaleEntryAction::Cancel
        );
    }

    #[test]
    fn test_swipe_within_buffer_of_next_term_kept() {
        // Swipe at 10:40 during the 10:00-10:50 term, next term at 10:50:
        // inside the 15 minute buffer, so the entry belongs to the next
        // session and survives even after the current term ends.
        let terms = [window(at(10, 0), at(10, 50)), window(at(10, 50), at(11, 40))];
        assert_eq!(
            stale_entry_action(at(10, 40), at(11, 0), lifetime(), buffer(), &terms),
            StaleEntryAction::Keep
        );
    }

    #[test]
    fn test_swipe_during_term_outside_buffer_cancels_after_term() {
        // Swipe at 10:05 during the 10:00-10:50 term, next term at 12:00:
        // outside the buffer, canceled once the term is over.
        let terms = [window(at(10, 0), at(10, 50)), window(at(12, 0), at(12, 50))];
        assert_eq!(
            stale_entry_action(at(10, 5), at(10, 49), lifetime(), buffer(), &terms),
            StaleEntryAction::Keep
        );
        assert_eq!(
            stale_entry_action(at(10, 5), at(10, 51), lifetime(), buffer(), &terms),
            StaleEntryAction::Cancel
        );
    }

    #[test]
    fn test_overrun_backdates_to_official_end() {
        let term = window(at(10, 0), at(10, 50));
        let initiated = at(10, 3);
        let overdraft = Duration::minutes(15);

        // 10:03 + 50min + 15min = 11:08 deadline.
        assert_eq!(overrun_backdate(initiated, term, overdraft, at(11, 8)), None);
        assert_eq!(
            overrun_backdate(initiated, term, overdraft, at(11, 9)),
            Some(at(10, 53))
        );
    }

    #[test]
    fn test_overrun_not_triggered_while_running_on_time() {
        let term = window(at(10, 0), at(11, 30));
        assert_eq!(
            overrun_backdate(at(10, 0), term, Duration::minutes(15), at(11, 0)),
            None
        );
    }
}
