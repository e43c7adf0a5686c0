//! Value types shared across the engine.

mod employee;
mod interaction;
mod time_range;

pub use employee::{
    CHANNEL_GROUP_CATEGORY, Employee, EmployeeCollection, EmployeeKind, EmployeeLookup, Group,
};
pub use interaction::{Interaction, InteractionKind, RecurrenceKind};
pub use time_range::{InvalidTimeRange, TimeRange};
