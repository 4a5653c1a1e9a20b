/// Project model
///
/// A project has exactly one owner and an ordered list of participants.
/// The owner is never stored in `participants`; role checks treat the owner
/// as satisfying every role.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY,
///     owner_id UUID NOT NULL REFERENCES users(id),
///     name VARCHAR(200) NOT NULL,
///     image TEXT,
///     participants UUID[] NOT NULL DEFAULT '{}',
///     tasks UUID[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role a user holds on a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    /// Full control, including membership
    Owner,

    /// Read access and limited writes (tasks)
    Participant,
}

impl ProjectRole {
    /// Checks if this role satisfies the required role
    ///
    /// Hierarchy: Owner > Participant
    pub fn satisfies(&self, required: ProjectRole) -> bool {
        self.level() >= required.level()
    }

    fn level(&self) -> u8 {
        match self {
            ProjectRole::Owner => 2,
            ProjectRole::Participant => 1,
        }
    }
}

/// Stored project record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub image: Option<String>,
    /// Participant user IDs in the order they were added
    pub participants: Vec<Uuid>,
    /// Task IDs in creation order
    pub tasks: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Role `user_id` holds on this project, if any
    pub fn role_of(&self, user_id: Uuid) -> Option<ProjectRole> {
        if self.owner_id == user_id {
            Some(ProjectRole::Owner)
        } else if self.participants.contains(&user_id) {
            Some(ProjectRole::Participant)
        } else {
            None
        }
    }

    /// Owner followed by participants
    pub fn members(&self) -> Vec<Uuid> {
        std::iter::once(self.owner_id)
            .chain(self.participants.iter().copied())
            .collect()
    }
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct NewProject {
    pub owner_id: Uuid,
    pub name: String,
    pub image: Option<String>,
}

/// Partial update; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub image: Option<String>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.image.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(owner: Uuid, participants: Vec<Uuid>) -> Project {
        Project {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: "Apollo".to_string(),
            image: None,
            participants,
            tasks: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_hierarchy() {
        assert!(ProjectRole::Owner.satisfies(ProjectRole::Owner));
        assert!(ProjectRole::Owner.satisfies(ProjectRole::Participant));
        assert!(ProjectRole::Participant.satisfies(ProjectRole::Participant));
        assert!(!ProjectRole::Participant.satisfies(ProjectRole::Owner));
    }

    #[test]
    fn test_role_of() {
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        let p = project(owner, vec![member]);

        assert_eq!(p.role_of(owner), Some(ProjectRole::Owner));
        assert_eq!(p.role_of(member), Some(ProjectRole::Participant));
        assert_eq!(p.role_of(Uuid::new_v4()), None);
    }

    #[test]
    fn test_members_lists_owner_first() {
        let owner = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(project(owner, vec![a, b]).members(), vec![owner, a, b]);
    }

    #[test]
    fn test_project_update_is_empty() {
        assert!(ProjectUpdate::default().is_empty());
        assert!(!ProjectUpdate {
            name: Some("x".to_string()),
            image: None
        }
        .is_empty());
    }
}
