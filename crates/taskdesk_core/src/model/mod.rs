//! Domain model for tasks and their owners.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId` and owned by exactly one
//!   `UserId` for its whole lifetime.
//! - Deletion is a hard delete; there is no tombstone state.

pub mod task;
pub mod user;
