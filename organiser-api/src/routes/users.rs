/// User endpoints
///
/// # Endpoints
///
/// - `POST /api/user/signup` - Register and get a session token (public)
/// - `POST /api/user/login` - Login and get a session token (public)
/// - `GET /api/user` - List all users
/// - `GET /api/user/:user_id` - Get one user
/// - `GET /api/user/project/:project_id` - List the members of a project
///
/// Responses carry [`UserProfile`], which has no password field.

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
        authorization::{authorize_action, ProjectAction},
        middleware::Identity,
        service::{AuthSession, LoginInput, SignupInput},
    },
    models::user::UserProfile,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Single user response
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: UserProfile,
}

/// User list response
#[derive(Debug, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<UserProfile>,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/user/signup
/// Content-Type: application/json
///
/// {
///   "name": "Ada",
///   "surname": "Lovelace",
///   "age": 36,
///   "email": "ada@example.com",
///   "password": "pw1",
///   "image": "http://localhost:5000/images/<uuid>.png"
/// }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// { "userId": "uuid", "email": "ada@example.com", "token": "eyJ..." }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed, or email already registered
/// - `500 Internal Server Error`: Server error
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthSession>)> {
    let Json(input) = payload?;

    let session = state.auth.signup(input).await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// Login with email and password
///
/// # Endpoint
///
/// ```text
/// POST /api/user/login
/// Content-Type: application/json
///
/// { "email": "ada@example.com", "password": "pw1" }
/// ```
///
/// # Response
///
/// `201 Created` with the same body as signup
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password (indistinguishable)
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthSession>)> {
    let Json(input) = payload?;

    let session = state.auth.login(input).await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// List all users
///
/// ```text
/// GET /api/user
/// Authorization: Bearer <token>
/// ```
pub async fn list_users(
    State(state): State<AppState>,
    _identity: Identity,
) -> ApiResult<Json<UsersResponse>> {
    let users = state.users.list_users().await?;

    Ok(Json(UsersResponse {
        users: users.into_iter().map(UserProfile::from).collect(),
    }))
}

/// Get a user by ID
///
/// # Errors
///
/// - `404 Not Found`: No such user
pub async fn get_user(
    State(state): State<AppState>,
    _identity: Identity,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Path(user_id) = path?;

    let user = state
        .users
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse {
        user: UserProfile::from(user),
    }))
}

/// List the owner and participants of a project
///
/// The owner comes first, then participants in the order they were added.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not a member of the project
/// - `404 Not Found`: No such project
pub async fn list_project_users(
    State(state): State<AppState>,
    identity: Identity,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<UsersResponse>> {
    let Path(project_id) = path?;

    let project = state
        .projects
        .find_project(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    authorize_action(&identity, &project, ProjectAction::ListMembers)?;

    let users = state.users.find_users_by_ids(&project.members()).await?;

    Ok(Json(UsersResponse {
        users: users.into_iter().map(UserProfile::from).collect(),
    }))
}
