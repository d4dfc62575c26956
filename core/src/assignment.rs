use chrono::{DateTime, Utc};
use serde::Serialize;

/// Binding of a sensor to a plot over `[assigned_at, unassigned_at)`.
///
/// An open interval (`unassigned_at == None`) is the current assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentInterval {
    pub id: i32,
    pub sensor_id: i32,
    pub plot_id: i32,
    pub assigned_at: DateTime<Utc>,
    pub unassigned_at: Option<DateTime<Utc>>,
}

impl AssignmentInterval {
    /// Right-open: the instant of unassignment already belongs to the
    /// next binding.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.assigned_at <= at && self.unassigned_at.map_or(true, |end| at < end)
    }

    pub fn is_open(&self) -> bool {
        self.unassigned_at.is_none()
    }
}

/// Picks the assignment covering `at`.
///
/// Overlapping intervals are not prevented by the datastore, the most
/// recently started one wins.
pub fn select_active<'a, I>(assignments: I, at: DateTime<Utc>) -> Option<&'a AssignmentInterval>
where
    I: IntoIterator<Item = &'a AssignmentInterval>,
{
    assignments
        .into_iter()
        .filter(|assignment| assignment.covers(at))
        .max_by_key(|assignment| assignment.assigned_at)
}
