/// Project-scoped access control
///
/// Every project read or write goes through [`authorize_project_access`]
/// after the project has been loaded and before the handler touches data.
///
/// # Permission Model
///
/// | Operation                         | Required role |
/// |-----------------------------------|---------------|
/// | Read project, tasks, member list  | Participant   |
/// | Add task, change task status      | Participant   |
/// | Add workers, update project       | Owner         |
///
/// The owner satisfies every role. A failed check is `Forbidden`: the
/// caller is known but lacks rights, which clients must be able to tell
/// apart from an unauthenticated request.
///
/// # Example
///
/// ```no_run
/// use organiser_shared::auth::authorization::{authorize_project_access, ProjectAction};
/// use organiser_shared::auth::middleware::Identity;
/// use organiser_shared::models::project::Project;
///
/// fn check(identity: &Identity, project: &Project) -> Result<(), Box<dyn std::error::Error>> {
///     authorize_project_access(identity, project, ProjectAction::AddWorkers.required_role())?;
///     Ok(())
/// }
/// ```

use uuid::Uuid;

use super::middleware::Identity;
use crate::models::project::{Project, ProjectRole};

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Caller is neither owner nor participant
    #[error("Not a member of project {0}")]
    NotMember(Uuid),

    /// Caller is a member but the action needs a higher role
    #[error("Insufficient permissions: requires {required:?}, has {actual:?}")]
    InsufficientRole {
        required: ProjectRole,
        actual: ProjectRole,
    },
}

/// Operations guarded by project membership
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAction {
    View,
    ListMembers,
    AddTask,
    UpdateTask,
    AddWorkers,
    UpdateProject,
}

impl ProjectAction {
    /// Minimum role needed for this action
    pub fn required_role(&self) -> ProjectRole {
        match self {
            ProjectAction::View
            | ProjectAction::ListMembers
            | ProjectAction::AddTask
            | ProjectAction::UpdateTask => ProjectRole::Participant,
            ProjectAction::AddWorkers | ProjectAction::UpdateProject => ProjectRole::Owner,
        }
    }
}

/// Checks that `identity` holds at least `required` on `project`
///
/// # Errors
///
/// - `AuthzError::NotMember` if the caller has no role on the project
/// - `AuthzError::InsufficientRole` if the caller's role is too low
pub fn authorize_project_access(
    identity: &Identity,
    project: &Project,
    required: ProjectRole,
) -> Result<(), AuthzError> {
    let actual = project
        .role_of(identity.user_id)
        .ok_or(AuthzError::NotMember(project.id))?;

    if !actual.satisfies(required) {
        return Err(AuthzError::InsufficientRole { required, actual });
    }

    Ok(())
}

/// Convenience wrapper over [`authorize_project_access`] keyed by action
pub fn authorize_action(
    identity: &Identity,
    project: &Project,
    action: ProjectAction,
) -> Result<(), AuthzError> {
    authorize_project_access(identity, project, action.required_role())
}

/// Whether `identity` may read `project`
pub fn can_view(identity: &Identity, project: &Project) -> bool {
    authorize_action(identity, project, ProjectAction::View).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn identity(user_id: Uuid) -> Identity {
        Identity {
            user_id,
            email: format!("{}@x.com", user_id),
        }
    }

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
    fn test_owner_has_every_role() {
        let owner = Uuid::new_v4();
        let p = project(owner, vec![]);

        assert!(authorize_project_access(&identity(owner), &p, ProjectRole::Owner).is_ok());
        assert!(authorize_project_access(&identity(owner), &p, ProjectRole::Participant).is_ok());
    }

    #[test]
    fn test_participant_cannot_act_as_owner() {
        let member = Uuid::new_v4();
        let p = project(Uuid::new_v4(), vec![member]);

        assert!(authorize_project_access(&identity(member), &p, ProjectRole::Participant).is_ok());
        assert_eq!(
            authorize_project_access(&identity(member), &p, ProjectRole::Owner),
            Err(AuthzError::InsufficientRole {
                required: ProjectRole::Owner,
                actual: ProjectRole::Participant,
            })
        );
    }

    #[test]
    fn test_stranger_is_not_member() {
        let p = project(Uuid::new_v4(), vec![Uuid::new_v4()]);
        let stranger = identity(Uuid::new_v4());

        assert_eq!(
            authorize_project_access(&stranger, &p, ProjectRole::Participant),
            Err(AuthzError::NotMember(p.id))
        );
        assert!(!can_view(&stranger, &p));
    }

    #[test]
    fn test_action_roles() {
        assert_eq!(ProjectAction::View.required_role(), ProjectRole::Participant);
        assert_eq!(ProjectAction::AddTask.required_role(), ProjectRole::Participant);
        assert_eq!(ProjectAction::UpdateTask.required_role(), ProjectRole::Participant);
        assert_eq!(ProjectAction::AddWorkers.required_role(), ProjectRole::Owner);
        assert_eq!(ProjectAction::UpdateProject.required_role(), ProjectRole::Owner);
    }

    #[test]
    fn test_participant_can_add_tasks_but_not_workers() {
        let member = Uuid::new_v4();
        let p = project(Uuid::new_v4(), vec![member]);

        assert!(authorize_action(&identity(member), &p, ProjectAction::AddTask).is_ok());
        assert!(authorize_action(&identity(member), &p, ProjectAction::AddWorkers).is_err());
    }
}
