/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use organiser_api::{app::AppState, config::Config};
/// use organiser_shared::{blob::LocalBlobStore, store::memory::MemoryStore};
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let blobs = Arc::new(LocalBlobStore::new("uploads/images", "http://localhost:5000", 500_000));
/// let state = AppState::new(MemoryStore::new(), blobs, config)?;
/// let app = organiser_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    middleware::Next,
    response::Response,
    routing::{get, patch, post},
    Router,
};
use organiser_shared::{
    auth::{
        middleware::authenticate,
        password::{PasswordError, PasswordHasher},
        service::AuthService,
        token::TokenIssuer,
    },
    blob::BlobStore,
    store::{ProjectStore, UserStore},
};
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{debug, Level};

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// User records
    pub users: Arc<dyn UserStore>,

    /// Project and task records
    pub projects: Arc<dyn ProjectStore>,

    /// Signup and login
    pub auth: AuthService,

    /// Token verifier used by the authentication layer
    pub tokens: Arc<TokenIssuer>,

    /// Image storage
    pub blobs: Arc<dyn BlobStore>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state over a single store backend
    ///
    /// # Errors
    ///
    /// Returns an error if the configured password work factor is rejected.
    pub fn new<S>(store: S, blobs: Arc<dyn BlobStore>, config: Config) -> Result<Self, PasswordError>
    where
        S: UserStore + ProjectStore + 'static,
    {
        let store = Arc::new(store);
        let users: Arc<dyn UserStore> = store.clone();
        let projects: Arc<dyn ProjectStore> = store;

        let hasher = PasswordHasher::new(config.password)?;
        let tokens = Arc::new(TokenIssuer::new(
            &config.jwt.secret,
            config.jwt.issuer.clone(),
            config.token_ttl(),
        ));
        let auth = AuthService::new(users.clone(), hasher, tokens.clone());

        Ok(Self {
            users,
            projects,
            auth,
            tokens,
            blobs,
            config: Arc::new(config),
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                              # Health check (public)
/// └── /api/
///     ├── /user/
///     │   ├── POST /signup                 # public
///     │   ├── POST /login                  # public
///     │   ├── GET  /                       # all users
///     │   ├── GET  /:user_id
///     │   └── GET  /project/:project_id    # members of a project
///     ├── /project/
///     │   ├── POST  /add-project
///     │   ├── POST  /add-task
///     │   ├── POST  /add-workers
///     │   ├── GET   /user/:user_id         # projects of a user
///     │   ├── GET   /:project_id
///     │   ├── PATCH /:project_id
///     │   ├── GET   /:project_id/tasks
///     │   └── PATCH /:project_id/tasks/:task_id
///     └── /uploads/
///         └── POST /images                 # public, raw PNG/JPEG body
/// ```
///
/// # Middleware Stack
///
/// 1. Logging (tower-http TraceLayer) on everything
/// 2. Authentication (`authenticate_layer`) on every `/api` route except
///    signup, login and image upload
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_user_routes = Router::new()
        .route("/signup", post(routes::users::signup))
        .route("/login", post(routes::users::login));

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/:user_id", get(routes::users::get_user))
        .route("/project/:project_id", get(routes::users::list_project_users))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            authenticate_layer,
        ));

    let project_routes = Router::new()
        .route("/add-project", post(routes::projects::add_project))
        .route("/add-task", post(routes::projects::add_task))
        .route("/add-workers", post(routes::projects::add_workers))
        .route("/user/:user_id", get(routes::projects::list_user_projects))
        .route(
            "/:project_id",
            get(routes::projects::get_project).patch(routes::projects::update_project),
        )
        .route("/:project_id/tasks", get(routes::projects::list_tasks))
        .route(
            "/:project_id/tasks/:task_id",
            patch(routes::projects::update_task_status),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            authenticate_layer,
        ));

    let upload_routes = Router::new()
        .route("/images", post(routes::uploads::upload_image))
        .layer(DefaultBodyLimit::max(state.config.uploads.max_bytes));

    let api_routes = Router::new()
        .nest("/user", public_user_routes.merge(user_routes))
        .nest("/project", project_routes)
        .nest("/uploads", upload_routes);

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Bearer token authentication middleware layer
///
/// Verifies the token from the Authorization header and injects the
/// caller's `Identity` into request extensions. The credential store is
/// not consulted.
async fn authenticate_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = authenticate(req.headers(), &state.tokens).map_err(|rejection| {
        debug!(reason = %rejection, path = %req.uri().path(), "Request authentication rejected");
        ApiError::from(rejection)
    })?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
