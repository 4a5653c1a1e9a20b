/// Project and task endpoints
///
/// Every handler loads the project first (404 if absent) and runs the
/// access check before reading or writing anything else.
///
/// # Endpoints
///
/// - `POST /api/project/add-project` - Create a project owned by the caller
/// - `GET /api/project/:project_id` - Get a project (participant)
/// - `PATCH /api/project/:project_id` - Rename or change image (owner)
/// - `GET /api/project/:project_id/tasks` - List tasks (participant)
/// - `PATCH /api/project/:project_id/tasks/:task_id` - Change task status (participant)
/// - `GET /api/project/user/:user_id` - Projects of a user visible to the caller
/// - `POST /api/project/add-task` - Create a task (participant)
/// - `POST /api/project/add-workers` - Add participants (owner)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use organiser_shared::{
    auth::{
        authorization::{authorize_action, can_view, ProjectAction},
        middleware::Identity,
    },
    models::{
        project::{NewProject, Project, ProjectUpdate},
        task::{NewTask, Task, TaskStatus},
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct AddProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(max = 2048, message = "Image reference too long"))]
    pub image: Option<String>,
}

/// Update project request; at least one field must be present
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 2048, message = "Image reference too long"))]
    pub image: Option<String>,
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddTaskRequest {
    pub project_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    #[serde(default)]
    pub description: String,

    /// Must be the owner or a participant
    pub assignee: Option<Uuid>,

    #[serde(default)]
    pub status: TaskStatus,
}

/// Add workers request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddWorkersRequest {
    pub project_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "Provide 1-100 workers"))]
    pub workers: Vec<Uuid>,
}

/// Update task status request
#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: TaskStatus,
}

/// Single project response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub project: Project,
}

/// Project list response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectsResponse {
    pub projects: Vec<Project>,
}

/// Single task response
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task: Task,
}

/// Task list response
#[derive(Debug, Serialize, Deserialize)]
pub struct TasksResponse {
    pub tasks: Vec<Task>,
}

async fn load_project(state: &AppState, project_id: Uuid) -> ApiResult<Project> {
    state
        .projects
        .find_project(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

/// Create a project
///
/// # Endpoint
///
/// ```text
/// POST /api/project/add-project
/// Authorization: Bearer <token>
///
/// { "name": "Apollo", "image": "http://localhost:5000/images/<uuid>.png" }
/// ```
///
/// # Response
///
/// `201 Created` with `{ "project": { ... } }`. The caller is the owner and
/// the project is appended to the caller's project list.
pub async fn add_project(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<AddProjectRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    let Json(req) = payload?;
    req.validate().map_err(|e| ApiError::from_validation(&e))?;

    let project = state
        .projects
        .insert_project(NewProject {
            owner_id: identity.user_id,
            name: req.name.trim().to_string(),
            image: req.image,
        })
        .await?;

    info!(project_id = %project.id, owner_id = %identity.user_id, "Project created");

    Ok((StatusCode::CREATED, Json(ProjectResponse { project })))
}

/// Get a project
///
/// # Errors
///
/// - `403 Forbidden`: Caller is neither owner nor participant
/// - `404 Not Found`: No such project
pub async fn get_project(
    State(state): State<AppState>,
    identity: Identity,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ProjectResponse>> {
    let Path(project_id) = path?;
    let project = load_project(&state, project_id).await?;

    authorize_action(&identity, &project, ProjectAction::View)?;

    Ok(Json(ProjectResponse { project }))
}

/// Update project name and/or image (owner only)
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not the owner
/// - `404 Not Found`: No such project
/// - `422 Unprocessable Entity`: Empty update or invalid fields
pub async fn update_project(
    State(state): State<AppState>,
    identity: Identity,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateProjectRequest>, JsonRejection>,
) -> ApiResult<Json<ProjectResponse>> {
    let Path(project_id) = path?;
    let Json(req) = payload?;

    let project = load_project(&state, project_id).await?;
    authorize_action(&identity, &project, ProjectAction::UpdateProject)?;

    req.validate().map_err(|e| ApiError::from_validation(&e))?;

    let update = ProjectUpdate {
        name: req.name.map(|n| n.trim().to_string()),
        image: req.image,
    };
    if update.is_empty() {
        return Err(ApiError::invalid("body", "Provide a name or an image"));
    }

    let project = state
        .projects
        .update_project(project_id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(ProjectResponse { project }))
}

/// List the tasks of a project in creation order
pub async fn list_tasks(
    State(state): State<AppState>,
    identity: Identity,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<TasksResponse>> {
    let Path(project_id) = path?;
    let project = load_project(&state, project_id).await?;

    authorize_action(&identity, &project, ProjectAction::View)?;

    let tasks = state.projects.list_tasks(project.id).await?;

    Ok(Json(TasksResponse { tasks }))
}

/// Change the status of a task
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not a member of the project
/// - `404 Not Found`: No such project, or the task is not in it
pub async fn update_task_status(
    State(state): State<AppState>,
    identity: Identity,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
    payload: Result<Json<UpdateTaskStatusRequest>, JsonRejection>,
) -> ApiResult<Json<TaskResponse>> {
    let Path((project_id, task_id)) = path?;
    let Json(req) = payload?;

    let project = load_project(&state, project_id).await?;
    authorize_action(&identity, &project, ProjectAction::UpdateTask)?;

    let task = state
        .projects
        .update_task_status(project.id, task_id, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(TaskResponse { task }))
}

/// Projects a user owns or participates in, restricted to those the caller
/// may read
///
/// # Errors
///
/// - `404 Not Found`: No such user
pub async fn list_user_projects(
    State(state): State<AppState>,
    identity: Identity,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ProjectsResponse>> {
    let Path(user_id) = path?;

    if state.users.find_user_by_id(user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let projects = state
        .projects
        .list_projects_for_user(user_id)
        .await?
        .into_iter()
        .filter(|project| can_view(&identity, project))
        .collect();

    Ok(Json(ProjectsResponse { projects }))
}

/// Create a task in a project
///
/// # Endpoint
///
/// ```text
/// POST /api/project/add-task
/// Authorization: Bearer <token>
///
/// { "projectId": "uuid", "title": "Write docs", "assignee": "uuid" }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not a member of the project
/// - `404 Not Found`: No such project
/// - `422 Unprocessable Entity`: Invalid fields, or the assignee is not a member
pub async fn add_task(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<AddTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let Json(req) = payload?;

    let project = load_project(&state, req.project_id).await?;
    authorize_action(&identity, &project, ProjectAction::AddTask)?;

    req.validate().map_err(|e| ApiError::from_validation(&e))?;

    if let Some(assignee) = req.assignee {
        if project.role_of(assignee).is_none() {
            return Err(ApiError::invalid(
                "assignee",
                "Assignee must be a member of the project",
            ));
        }
    }

    let task = state
        .projects
        .insert_task(NewTask {
            project_id: project.id,
            title: req.title.trim().to_string(),
            description: req.description,
            status: req.status,
            assignee_id: req.assignee,
        })
        .await?;

    info!(project_id = %project.id, task_id = %task.id, "Task created");

    Ok((StatusCode::CREATED, Json(TaskResponse { task })))
}

/// Add participants to a project (owner only)
///
/// Workers already on the project are skipped. Each added worker gets the
/// project appended to its own project list.
///
/// # Endpoint
///
/// ```text
/// POST /api/project/add-workers
/// Authorization: Bearer <token>
///
/// { "projectId": "uuid", "workers": ["uuid", "uuid"] }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not the owner
/// - `404 Not Found`: No such project, or a worker does not exist
/// - `422 Unprocessable Entity`: Empty list, or the owner is listed
pub async fn add_workers(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<AddWorkersRequest>, JsonRejection>,
) -> ApiResult<Json<ProjectResponse>> {
    let Json(req) = payload?;

    let project = load_project(&state, req.project_id).await?;
    authorize_action(&identity, &project, ProjectAction::AddWorkers)?;

    req.validate().map_err(|e| ApiError::from_validation(&e))?;

    if req.workers.contains(&project.owner_id) {
        return Err(ApiError::invalid(
            "workers",
            "The owner cannot be added as a participant",
        ));
    }

    let project = state
        .projects
        .add_participants(project.id, &req.workers)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    info!(project_id = %project.id, participants = project.participants.len(), "Workers added");

    Ok(Json(ProjectResponse { project }))
}
