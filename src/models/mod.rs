//! Scheduling domain models.
//!
//! Plain data consumed and produced by the engine. Nothing here performs
//! I/O or depends on persistence types.
//!
//! # Domain Mappings
//!
//! | u-roster | Retail operations |
//! |----------|-------------------|
//! | WorkEvent | In-store demo, supervisory check, fixture task |
//! | Employee | Event specialist, lead, supervisor |
//! | RotationAssignment | Weekly duty roster row |
//! | ShiftBlock | Staggered arrival slot |
//! | Assignment | Proposed / committed staffing decision |

mod assignment;
mod calendar;
mod employee;
mod event;
mod rotation;
mod shift_block;
mod violation;

pub use assignment::{Assignment, AssignmentStatus};
pub use calendar::{dates_between, same_week, week_start, Interval};
pub use employee::{Employee, EmployeeId, Role};
pub use event::{Coupling, EventId, EventType, Wave, WorkEvent};
pub use rotation::{RotationAssignment, RotationException, RotationType};
pub use shift_block::{ShiftBlock, ShiftBlockConfig, BLOCK_COUNT};
pub use violation::{ConstraintClass, FailureReason, Violation, ViolationKind};
