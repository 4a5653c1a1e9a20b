//! PostgreSQL store backend
//!
//! Schema lives in `organiser-shared/migrations` (see [`crate::db::migrations`]).
//! Reference lists (a user's projects, a project's participants and tasks)
//! are `UUID[]` columns, appended to inside a transaction together with the
//! row they reference.
//!
//! Emails are stored in [`normalize_email`] form and compared exactly, so
//! matching never depends on the database collation.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use super::{ProjectStore, StoreError, UserStore};
use crate::models::{
    project::{NewProject, Project, ProjectUpdate},
    task::{NewTask, Task, TaskStatus},
    user::{normalize_email, NewUser, User},
};

const USER_COLUMNS: &str =
    "id, name, surname, age, email, password_hash, image, projects, chats, created_at";

const PROJECT_COLUMNS: &str =
    "id, owner_id, name, image, participants, tasks, created_at, updated_at";

const TASK_COLUMNS: &str =
    "id, project_id, title, description, status, assignee_id, created_at, updated_at";

/// Classifies constraint violations into store errors
fn map_db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() && db_err.constraint() == Some("users_email_key") {
            return StoreError::DuplicateEmail;
        }
        if db_err.is_foreign_key_violation() {
            let constraint = db_err.constraint().unwrap_or("foreign key").to_string();
            return StoreError::MissingReference(constraint);
        }
    }
    StoreError::Database(err)
}

/// sqlx-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for migrations and shutdown
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let query = format!(
            r#"
            INSERT INTO users (id, name, surname, age, email, password_hash, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(user.name)
            .bind(user.surname)
            .bind(user.age)
            .bind(normalize_email(&user.email))
            .bind(user.password_hash)
            .bind(user.image)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(normalize_email(email))
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id");

        Ok(sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
        let rows = sqlx::query_as::<_, User>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        let mut by_id: HashMap<Uuid, User> = rows.into_iter().map(|u| (u.id, u)).collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::db::pool::health_check(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn insert_project(&self, project: NewProject) -> Result<Project, StoreError> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"
            INSERT INTO projects (id, owner_id, name, image)
            VALUES ($1, $2, $3, $4)
            RETURNING {PROJECT_COLUMNS}
            "#
        );
        let record = sqlx::query_as::<_, Project>(&query)
            .bind(Uuid::new_v4())
            .bind(project.owner_id)
            .bind(project.name)
            .bind(project.image)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error)?;

        sqlx::query("UPDATE users SET projects = array_append(projects, $2) WHERE id = $1")
            .bind(record.owner_id)
            .bind(record.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");

        Ok(sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> Result<Vec<Project>, StoreError> {
        let query = format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE owner_id = $1 OR $1 = ANY(participants)
            ORDER BY created_at, id
            "#
        );

        Ok(sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn add_participants(
        &self,
        project_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<Option<Project>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let known: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE id = ANY($1)")
            .bind(user_ids)
            .fetch_all(&mut *tx)
            .await?;
        if let Some(missing) = user_ids.iter().find(|id| !known.contains(*id)) {
            return Err(StoreError::MissingReference(format!("user {}", missing)));
        }

        let select = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 FOR UPDATE");
        let Some(project) = sqlx::query_as::<_, Project>(&select)
            .bind(project_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let mut participants = project.participants.clone();
        let mut added = Vec::new();
        for id in user_ids {
            if *id != project.owner_id && !participants.contains(id) {
                participants.push(*id);
                added.push(*id);
            }
        }

        if added.is_empty() {
            tx.commit().await?;
            return Ok(Some(project));
        }

        let update = format!(
            r#"
            UPDATE projects
            SET participants = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, Project>(&update)
            .bind(project_id)
            .bind(&participants)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE users
            SET projects = array_append(projects, $2)
            WHERE id = ANY($1) AND NOT ($2 = ANY(projects))
            "#,
        )
        .bind(&added)
        .bind(project_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(project_id = %project_id, added = added.len(), "Participants added");

        Ok(Some(updated))
    }

    async fn update_project(
        &self,
        id: Uuid,
        update: ProjectUpdate,
    ) -> Result<Option<Project>, StoreError> {
        let query = format!(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                image = COALESCE($3, image),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        );

        Ok(sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(update.name)
            .bind(update.image)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_task(&self, task: NewTask) -> Result<Task, StoreError> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"
            INSERT INTO tasks (id, project_id, title, description, status, assignee_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TASK_COLUMNS}
            "#
        );
        let record = sqlx::query_as::<_, Task>(&query)
            .bind(Uuid::new_v4())
            .bind(task.project_id)
            .bind(task.title)
            .bind(task.description)
            .bind(task.status)
            .bind(task.assignee_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error)?;

        sqlx::query(
            r#"
            UPDATE projects
            SET tasks = array_append(tasks, $2), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(record.project_id)
        .bind(record.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn list_tasks(&self, project_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = $1 ORDER BY created_at, id"
        );

        Ok(sqlx::query_as::<_, Task>(&query)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_task_status(
        &self,
        project_id: Uuid,
        task_id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Task>, StoreError> {
        let query = format!(
            r#"
            UPDATE tasks
            SET status = $3, updated_at = NOW()
            WHERE id = $2 AND project_id = $1
            RETURNING {TASK_COLUMNS}
            "#
        );

        Ok(sqlx::query_as::<_, Task>(&query)
            .bind(project_id)
            .bind(task_id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?)
    }
}
