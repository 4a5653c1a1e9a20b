/// Domain models
///
/// Plain data types shared by the store backends and the API layer.
/// Persistence lives in [`crate::store`].
///
/// # Models
///
/// - `user`: accounts and public profiles
/// - `project`: projects, membership roles
/// - `task`: project tasks and their status

pub mod project;
pub mod task;
pub mod user;
