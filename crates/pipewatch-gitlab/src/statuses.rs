//! Status enumerations the GitLab API can report.
//!
//! Status metric families need the complete enumeration up front so that
//! members never observed can still be zero-filled or deleted; the sets are
//! therefore fixed here rather than derived from API responses.

/// Every status a pipeline can report.
pub const PIPELINE_STATUSES: &[&str] = &[
    "created",
    "waiting_for_resource",
    "preparing",
    "pending",
    "running",
    "success",
    "failed",
    "canceled",
    "skipped",
    "manual",
    "scheduled",
];

/// Every status a job can report.
pub const JOB_STATUSES: &[&str] = &[
    "created",
    "pending",
    "running",
    "failed",
    "success",
    "canceled",
    "skipped",
    "waiting_for_resource",
    "manual",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_are_present_in_both_sets() {
        for status in ["success", "failed", "canceled", "skipped"] {
            assert!(PIPELINE_STATUSES.contains(&status));
            assert!(JOB_STATUSES.contains(&status));
        }
    }

    #[test]
    fn no_duplicate_members() {
        for set in [PIPELINE_STATUSES, JOB_STATUSES] {
            let mut seen = std::collections::HashSet::new();
            for status in set {
                assert!(seen.insert(status), "duplicate status {status}");
            }
        }
    }
}
