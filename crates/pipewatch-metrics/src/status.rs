//! One-hot status emission.
//!
//! A status observation is encoded across the *full* status enumeration,
//! not just the observed value: the matching member's series becomes 1 and
//! every other member is either zero-filled (dense mode) or deleted from
//! exposition (sparse mode). Dense mode keeps every combination queryable;
//! sparse mode trades that for not carrying always-zero series across many
//! jobs × many statuses.

use std::hash::Hash;

use prometheus_client::metrics::family::Family;

use crate::registry::FloatGauge;

/// What one enumeration member's series does after an emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesAction {
    /// The member matches the observed status: the series becomes 1.
    On,
    /// Dense-mode non-match: the series becomes 0.
    Off,
    /// Sparse-mode non-match: the series is removed from exposition.
    Remove,
}

/// Encode one observed status across a full enumeration.
///
/// Pure: pairs each member with the action its series takes, in the
/// caller-supplied order. When `observed` is not a member, no pair is
/// [`SeriesAction::On`]; a silent no-match, not an error.
pub fn one_hot<'a, S: AsRef<str>>(
    statuses: &'a [S],
    observed: &str,
    sparse: bool,
) -> Vec<(&'a str, SeriesAction)> {
    statuses
        .iter()
        .map(|status| {
            let status = status.as_ref();
            let action = if status == observed {
                SeriesAction::On
            } else if sparse {
                SeriesAction::Remove
            } else {
                SeriesAction::Off
            };
            (status, action)
        })
        .collect()
}

/// Apply a one-hot encoding to a status family.
///
/// `make_labels` extends the base label tuple with one enumeration member.
/// Every member's state is re-derived on every call, so repeated calls with
/// identical inputs converge to the same family state regardless of what
/// was there before.
pub fn emit_status<L, S, F>(
    family: &Family<L, FloatGauge>,
    statuses: &[S],
    observed: &str,
    sparse: bool,
    make_labels: F,
) where
    L: Clone + Eq + Hash,
    S: AsRef<str>,
    F: Fn(&str) -> L,
{
    for (status, action) in one_hot(statuses, observed, sparse) {
        let labels = make_labels(status);
        match action {
            SeriesAction::On => {
                family.get_or_create(&labels).set(1.0);
            }
            SeriesAction::Off => {
                family.get_or_create(&labels).set(0.0);
            }
            SeriesAction::Remove => {
                family.remove(&labels);
            }
        }
    }
}
