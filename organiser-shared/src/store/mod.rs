//! Persistence traits and backends
//!
//! Handlers and services depend on the [`UserStore`] and [`ProjectStore`]
//! traits only. Two backends implement both:
//!
//! - [`postgres::PgStore`]: sqlx over PostgreSQL, used in production
//! - [`memory::MemoryStore`]: `tokio::sync::RwLock` over hash maps, used for
//!   local development and the test suites
//!
//! Both enforce the same uniqueness rule: at most one user per normalised
//! email. The application checks before inserting, and the backend rejects
//! a racing duplicate with [`StoreError::DuplicateEmail`].
//!
//! # Example
//!
//! ```
//! use organiser_shared::store::{memory::MemoryStore, UserStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! assert!(!store.email_exists("a@x.com").await?);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    project::{NewProject, Project, ProjectUpdate},
    task::{NewTask, Task, TaskStatus},
    user::{NewUser, User},
};

pub mod memory;
pub mod postgres;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique email constraint violated
    #[error("Email already registered")]
    DuplicateEmail,

    /// A referenced record does not exist
    #[error("Referenced record not found: {0}")]
    MissingReference(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Credential store: user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new user with empty project and chat lists
    ///
    /// Fails with `StoreError::DuplicateEmail` if the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Looks up by normalised email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;

    /// All users, oldest first
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Users with the given IDs, in the order of `ids`; unknown IDs are skipped
    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError>;

    /// Checks the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Project and task records
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Persists a project and appends it to the owner's project list
    async fn insert_project(&self, project: NewProject) -> Result<Project, StoreError>;

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, StoreError>;

    /// Projects `user_id` owns or participates in, oldest first
    async fn list_projects_for_user(&self, user_id: Uuid) -> Result<Vec<Project>, StoreError>;

    /// Appends participants that are not already present, preserving order,
    /// and appends the project to each new participant's project list
    ///
    /// Returns `None` if the project does not exist.
    async fn add_participants(
        &self,
        project_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<Option<Project>, StoreError>;

    async fn update_project(
        &self,
        id: Uuid,
        update: ProjectUpdate,
    ) -> Result<Option<Project>, StoreError>;

    /// Persists a task and appends it to the project's task list
    async fn insert_task(&self, task: NewTask) -> Result<Task, StoreError>;

    /// Tasks of a project in creation order
    async fn list_tasks(&self, project_id: Uuid) -> Result<Vec<Task>, StoreError>;

    /// Returns `None` if no task `task_id` belongs to `project_id`
    async fn update_task_status(
        &self,
        project_id: Uuid,
        task_id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Task>, StoreError>;
}
