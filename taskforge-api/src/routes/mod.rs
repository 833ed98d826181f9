/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `tasks`: Task management (list, create, get, update, delete, restore,
///   status cycling)
/// - `tags`: Tag management (mutations admin-only)

pub mod health;
pub mod tags;
pub mod tasks;
