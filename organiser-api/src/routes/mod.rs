/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: Signup, login and user lookups
/// - `projects`: Projects, tasks and membership
/// - `uploads`: Image uploads

pub mod health;
pub mod projects;
pub mod uploads;
pub mod users;
