//! Pending-entry assignment rules applied when a holding starts.

use std::collections::HashSet;

use crate::types::DbId;

/// What to do with a pending (unassigned, `created`) room entry when a
/// holding starts in its room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    /// Assign the entry to the starting holding.
    Assign,
    /// Leave the entry for a parallel holding; the student is rostered in
    /// another term sharing this room and time window, and will be picked
    /// up when that holding starts.
    Skip,
    /// Delete the entry; its student link no longer resolves, so there is
    /// nothing to assign.
    Drop,
}

/// Decide the fate of a pending room entry.
///
/// `parallel_students` is the union of the rosters of all parallel terms
/// (same room, start and end as the starting holding's term, excluding
/// that term itself). When there are no parallel terms the set is empty
/// and every resolvable entry is assigned.
pub fn pending_action(
    student_id: Option<DbId>,
    parallel_students: &HashSet<DbId>,
) -> PendingAction {
    match student_id {
        None => PendingAction::Drop,
        Some(id) if parallel_students.contains(&id) => PendingAction::Skip,
        Some(_) => PendingAction::Assign,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrostered_student_assigned_without_parallel_terms() {
        assert_eq!(pending_action(Some(7), &HashSet::new()), PendingAction::Assign);
    }

    #[test]
    fn test_student_of_parallel_term_skipped() {
        let parallel: HashSet<DbId> = [3, 5].into_iter().collect();
        assert_eq!(pending_action(Some(5), &parallel), PendingAction::Skip);
    }

    #[test]
    fn test_student_not_in_parallel_roster_assigned() {
        let parallel: HashSet<DbId> = [3, 5].into_iter().collect();
        assert_eq!(pending_action(Some(7), &parallel), PendingAction::Assign);
    }

    #[test]
    fn test_dangling_student_link_dropped() {
        let parallel: HashSet<DbId> = [3].into_iter().collect();
        assert_eq!(pending_action(None, &parallel), PendingAction::Drop);
    }
}
