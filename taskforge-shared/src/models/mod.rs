/// Database models for Taskforge
///
/// # Models
///
/// - `task`: tasks with status/priority enums, soft delete, and the
///   version-guarded conditional update
/// - `tag`: tags and the independently timestamped task-tag association
/// - `user`: users and roles (scope enforcement, owner eager loading)
/// - `audit_log`: append-only audit trail entries

pub mod audit_log;
pub mod tag;
pub mod task;
pub mod user;
