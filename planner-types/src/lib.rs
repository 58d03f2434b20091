//! Shared types for the family planner data layer.
//!
//! Defines the record model (families, family members, tasks, calendar
//! events) as a tagged union with write-boundary validation, the queued
//! operation model replayed by the sync layer, session snapshots, and
//! task statistics.

pub mod error;
pub mod ids;
pub mod ops;
pub mod record;
pub mod session;
pub mod stats;

pub use error::ValidationError;
pub use ids::RecordId;
pub use ops::{OperationKind, QueuedOperation};
pub use record::{
    CalendarEvent, Collection, Family, FamilyMember, FamilySettings, Priority, RecordPayload,
    Task, TaskStatus, validate_patch,
};
pub use session::SessionSnapshot;
pub use stats::{TaskStatistics, task_statistics};
