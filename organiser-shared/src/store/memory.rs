//! In-process store backend
//!
//! Non-persistent implementation of [`UserStore`] and [`ProjectStore`].
//! Selected with `STORE_BACKEND=memory` for local development, and used by
//! the test suites. Each operation takes the lock once, so every call is
//! atomic with respect to the others.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ProjectStore, StoreError, UserStore};
use crate::models::{
    project::{NewProject, Project, ProjectUpdate},
    task::{NewTask, Task, TaskStatus},
    user::{normalize_email, NewUser, User},
};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    /// normalised email -> user id
    emails: HashMap<String, Uuid>,
    projects: HashMap<Uuid, Project>,
    tasks: HashMap<Uuid, Task>,
}

/// Hash-map backed store; clones share the same data
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        let key = normalize_email(&user.email);

        if inner.emails.contains_key(&key) {
            return Err(StoreError::DuplicateEmail);
        }

        let record = User {
            id: Uuid::new_v4(),
            name: user.name,
            surname: user.surname,
            age: user.age,
            email: key.clone(),
            password_hash: user.password_hash,
            image: user.image,
            projects: Vec::new(),
            chats: Vec::new(),
            created_at: Utc::now(),
        };

        inner.emails.insert(key, record.id);
        inner.users.insert(record.id, record.clone());

        Ok(record)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .emails
            .get(&normalize_email(email))
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.emails.contains_key(&normalize_email(email)))
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.inner.read().await.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| inner.users.get(id).cloned()).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn insert_project(&self, project: NewProject) -> Result<Project, StoreError> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let record = Project {
            id: Uuid::new_v4(),
            owner_id: project.owner_id,
            name: project.name,
            image: project.image,
            participants: Vec::new(),
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let owner = inner
            .users
            .get_mut(&record.owner_id)
            .ok_or_else(|| StoreError::MissingReference(format!("user {}", record.owner_id)))?;
        owner.projects.push(record.id);
        inner.projects.insert(record.id, record.clone());

        Ok(record)
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        Ok(self.inner.read().await.projects.get(&id).cloned())
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> Result<Vec<Project>, StoreError> {
        let mut projects: Vec<Project> = self
            .inner
            .read()
            .await
            .projects
            .values()
            .filter(|p| p.role_of(user_id).is_some())
            .cloned()
            .collect();
        projects.sort_by_key(|p| p.created_at);
        Ok(projects)
    }

    async fn add_participants(
        &self,
        project_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<Option<Project>, StoreError> {
        let mut inner = self.inner.write().await;

        if let Some(missing) = user_ids.iter().find(|id| !inner.users.contains_key(*id)) {
            return Err(StoreError::MissingReference(format!("user {}", missing)));
        }

        let Some(project) = inner.projects.get_mut(&project_id) else {
            return Ok(None);
        };

        let mut added = Vec::new();
        for id in user_ids {
            if *id != project.owner_id && !project.participants.contains(id) {
                project.participants.push(*id);
                added.push(*id);
            }
        }
        if !added.is_empty() {
            project.updated_at = Utc::now();
        }
        let snapshot = project.clone();

        for id in added {
            if let Some(user) = inner.users.get_mut(&id) {
                if !user.projects.contains(&project_id) {
                    user.projects.push(project_id);
                }
            }
        }

        Ok(Some(snapshot))
    }

    async fn update_project(
        &self,
        id: Uuid,
        update: ProjectUpdate,
    ) -> Result<Option<Project>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(project) = inner.projects.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            project.name = name;
        }
        if let Some(image) = update.image {
            project.image = Some(image);
        }
        project.updated_at = Utc::now();

        Ok(Some(project.clone()))
    }

    async fn insert_task(&self, task: NewTask) -> Result<Task, StoreError> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let record = Task {
            id: Uuid::new_v4(),
            project_id: task.project_id,
            title: task.title,
            description: task.description,
            status: task.status,
            assignee_id: task.assignee_id,
            created_at: now,
            updated_at: now,
        };

        let project = inner
            .projects
            .get_mut(&record.project_id)
            .ok_or_else(|| StoreError::MissingReference(format!("project {}", record.project_id)))?;
        project.tasks.push(record.id);
        project.updated_at = now;
        inner.tasks.insert(record.id, record.clone());

        Ok(record)
    }

    async fn list_tasks(&self, project_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let inner = self.inner.read().await;
        let Some(project) = inner.projects.get(&project_id) else {
            return Ok(Vec::new());
        };

        Ok(project
            .tasks
            .iter()
            .filter_map(|id| inner.tasks.get(id).cloned())
            .collect())
    }

    async fn update_task_status(
        &self,
        project_id: Uuid,
        task_id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Task>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(task) = inner
            .tasks
            .get_mut(&task_id)
            .filter(|t| t.project_id == project_id)
        else {
            return Ok(None);
        };

        task.status = status;
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }
}
