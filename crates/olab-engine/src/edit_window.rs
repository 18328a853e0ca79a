//! Edit-window policy.
//!
//! Every order carries one deadline, fixed at creation. Two independent
//! questions are answered from it: whether the owning clinic may still edit
//! patient/config details, and whether production may begin. An urgent order
//! trades its edit window away (deadline = creation time) for immediate
//! production eligibility plus the pricing surcharge.

use chrono::{DateTime, Duration, Utc};
use olab_schemas::OrderStatus;

/// Length of the clinic edit window for normal orders.
pub fn edit_window() -> Duration {
    Duration::hours(2)
}

/// Deadline for patient/config edits. Set once at creation, never
/// recomputed.
pub fn edit_deadline(created_at: DateTime<Utc>, urgent: bool) -> DateTime<Utc> {
    if urgent {
        created_at
    } else {
        created_at + edit_window()
    }
}

/// May the owning clinic still edit the order?
pub fn is_editable(status: OrderStatus, deadline: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    status == OrderStatus::New && now < deadline
}

/// May production begin (`new → in_production`)?
///
/// Production may not start while the clinic's window is still open; urgent
/// orders are eligible immediately (their deadline equals creation time, so
/// both arms agree).
pub fn production_eligible(urgent: bool, deadline: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    urgent || now >= deadline
}

/// Time left in the window, clamped at zero once the deadline has passed.
pub fn remaining(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (deadline - now).max(Duration::zero())
}
