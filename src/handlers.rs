use crate::{
    AppState,
    auth::AuthUser,
    config::AppConfig,
    errors::{ApiError, JsonBody},
    models::{
        BlogChanges, BlogPayload, BlogRecord, BlogView, CommentRequest, ErrorBody, LoginRequest,
        LoginResponse, NewBlog, NewUser, RegisterUserRequest, UserRecord, UserView,
        UserWithBlogs,
    },
    password,
    repository::{RepositoryState, parse_id},
};
use axum::{
    Json,
    extract::{Path, Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};
use uuid::Uuid;

const PASSWORD_MIN_LENGTH: usize = 3;

// --- Population Helpers ---

/// Resolves the owner reference of a single post.
async fn populate(repo: &RepositoryState, blog: &BlogRecord) -> Result<BlogView, ApiError> {
    let owner = match blog.user_id {
        Some(owner_id) => repo.find_user(owner_id).await?,
        None => None,
    };
    Ok(BlogView::populated(blog, owner.as_ref()))
}

/// Resolves the owner references of many posts with one secondary lookup.
async fn populate_all(
    repo: &RepositoryState,
    blogs: &[BlogRecord],
) -> Result<Vec<BlogView>, ApiError> {
    let mut owner_ids: Vec<Uuid> = blogs.iter().filter_map(|blog| blog.user_id).collect();
    owner_ids.sort_unstable();
    owner_ids.dedup();
    let owners = repo.find_users_by_ids(&owner_ids).await?;

    Ok(blogs
        .iter()
        .map(|blog| {
            let owner = owners.iter().find(|user| Some(user.id) == blog.user_id);
            BlogView::populated(blog, owner)
        })
        .collect())
}

/// The response produced when Delete or Add Comment target a post that does
/// not exist: completes without error, without a status of its own and with
/// an empty body. Update answers the same situation with a 404.
fn no_response(action: &str, id: Uuid) -> Response {
    tracing::warn!(blog_id = %id, action, "target blog not found; completing without a response body");
    ().into_response()
}

fn owns(user: &UserRecord, blog: &BlogRecord) -> bool {
    blog.user_id == Some(user.id)
}

// --- Users ---

/// create_user
///
/// [Public Route] Registers a new user. The handler checks the password; the
/// store enforces the username rules (presence, length, uniqueness) and
/// reports them in its own message format.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegisterUserRequest,
    responses(
        (status = 200, description = "Registered", body = UserView),
        (status = 400, description = "Validation failed", body = ErrorBody)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterUserRequest>,
) -> Result<Json<UserView>, ApiError> {
    let password = match payload.password {
        Some(password) if !password.is_empty() => password,
        _ => {
            return Err(ApiError::Validation(
                "User validation failed: password: field is mandatory".to_string(),
            ));
        }
    };
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(ApiError::Validation(
            "User validation failed: password: should be at least 3 characters long".to_string(),
        ));
    }

    let password_hash = password::hash_password(password, state.config.password_cost).await?;

    let user = state
        .repo
        .insert_user(NewUser {
            username: payload.username,
            name: payload.name,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(Json(UserView::from_record(&user)))
}

/// get_users
///
/// [Public Route] Lists every user with its posts populated.
#[utoipa::path(
    get,
    path = "/api/users",
    responses((status = 200, description = "All users", body = [UserWithBlogs]))
)]
pub async fn get_users(State(state): State<AppState>) -> Result<Json<Vec<UserWithBlogs>>, ApiError> {
    let users = state.repo.find_users().await?;
    let blog_ids: Vec<Uuid> = users.iter().flat_map(|user| user.blogs.iter().copied()).collect();
    let blogs = state.repo.find_blogs_by_ids(&blog_ids).await?;

    Ok(Json(
        users
            .iter()
            .map(|user| UserWithBlogs::populated(user, &blogs))
            .collect(),
    ))
}

// --- Login ---

/// login
///
/// [Public Route] Exchanges credentials for a bearer token. Unknown username,
/// wrong password and missing password all fail with the same 401 body.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid username or password", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let password = payload.password.unwrap_or_default();
    let user = match payload.username.as_deref() {
        Some(username) => state.repo.find_user_by_username(username).await?,
        None => None,
    };

    let password_correct = match &user {
        Some(user) => password::verify_password(password, user.password_hash.clone()).await?,
        None => false,
    };

    let user = match user {
        Some(user) if password_correct => user,
        _ => {
            return Err(ApiError::Authorization(
                "Invalid username or password".to_string(),
            ));
        }
    };

    let token = state
        .tokens
        .issue(&user)
        .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))?;

    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        token,
        username: user.username,
        name: user.name,
        id: user.id.to_string(),
    }))
}

// --- Blogs ---

/// get_blogs
///
/// [Public Route] Lists all posts with their owners populated.
#[utoipa::path(
    get,
    path = "/api/blogs",
    responses((status = 200, description = "All blogs", body = [BlogView]))
)]
pub async fn get_blogs(State(state): State<AppState>) -> Result<Json<Vec<BlogView>>, ApiError> {
    let blogs = state.repo.find_blogs().await?;
    Ok(Json(populate_all(&state.repo, &blogs).await?))
}

/// create_blog
///
/// [Authenticated Route] Creates a post owned by the requester and appends it
/// to the requester's post list. Only `title`, `author`, `url` and `likes`
/// are read from the body.
#[utoipa::path(
    post,
    path = "/api/blogs",
    request_body = BlogPayload,
    responses(
        (status = 201, description = "Created", body = BlogView),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 401, description = "Token missing or invalid", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn create_blog(
    AuthUser(mut user): AuthUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<BlogPayload>,
) -> Result<(StatusCode, Json<BlogView>), ApiError> {
    let blog = state
        .repo
        .insert_blog(NewBlog {
            title: payload.title,
            author: payload.author,
            url: payload.url,
            likes: payload.likes,
            user_id: user.id,
        })
        .await?;

    // Read-modify-write on the owner document; not atomic across requests.
    user.blogs.push(blog.id);
    state.repo.save_user(&user).await?;

    tracing::info!(blog_id = %blog.id, user_id = %user.id, "blog created");
    Ok((
        StatusCode::CREATED,
        Json(BlogView::populated(&blog, Some(&user))),
    ))
}

/// delete_blog
///
/// [Authenticated Route] Deletes a post owned by the requester.
///
/// *Authorization*: a post owned by someone else is a 403. A missing post is
/// not an error and produces no response body (see [`no_response`]).
#[utoipa::path(
    delete,
    path = "/api/blogs/{id}",
    params(("id" = String, Path, description = "Blog ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Token missing or invalid", body = ErrorBody),
        (status = 403, description = "Not Owner", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn delete_blog(
    AuthUser(mut user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let Some(blog) = state.repo.find_blog(id).await? else {
        return Ok(no_response("delete", id));
    };
    if !owns(&user, &blog) {
        return Err(ApiError::Permission(
            "user does not have access to modify the requested resource".to_string(),
        ));
    }

    state.repo.delete_blog(id).await?;
    user.blogs.retain(|blog_id| *blog_id != id);
    state.repo.save_user(&user).await?;

    tracing::info!(blog_id = %id, user_id = %user.id, "blog deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// update_blog
///
/// [Authenticated Route] Any authenticated user may change `likes`; the owner
/// may also change `title`, `author` and `url`. Everything else in the body
/// is ignored. A missing post is a 404.
#[utoipa::path(
    put,
    path = "/api/blogs/{id}",
    params(("id" = String, Path, description = "Blog ID")),
    request_body = BlogPayload,
    responses(
        (status = 200, description = "Updated", body = BlogView),
        (status = 401, description = "Token missing or invalid", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn update_blog(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<BlogPayload>,
) -> Result<Json<BlogView>, ApiError> {
    let not_found = || ApiError::Resource("requested resource is not found".to_string());

    let id = parse_id(&id)?;
    let blog = state.repo.find_blog(id).await?.ok_or_else(not_found)?;

    let changes = if owns(&user, &blog) {
        BlogChanges::owner(&payload)
    } else {
        BlogChanges::likes_only(&payload)
    };

    let updated = state
        .repo
        .update_blog(id, changes)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(blog_id = %id, user_id = %user.id, "blog updated");
    Ok(Json(populate(&state.repo, &updated).await?))
}

/// add_comment
///
/// [Authenticated Route] Appends a free-text comment to a post. Any
/// authenticated user may comment; duplicates are kept in order.
#[utoipa::path(
    post,
    path = "/api/blogs/{id}/comments",
    params(("id" = String, Path, description = "Blog ID")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment Added", body = BlogView),
        (status = 400, description = "Comment missing", body = ErrorBody),
        (status = 401, description = "Token missing or invalid", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn add_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<CommentRequest>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let Some(mut blog) = state.repo.find_blog(id).await? else {
        return Ok(no_response("comment", id));
    };

    let comment = match payload.comment {
        Some(comment) if !comment.is_empty() => comment,
        _ => {
            return Err(ApiError::Validation(
                "comment is missing in request".to_string(),
            ));
        }
    };

    // Read-modify-write; two concurrent appends may both start from the same list.
    blog.comments.push(comment);
    state.repo.save_blog(&blog).await?;

    tracing::info!(blog_id = %id, user_id = %user.id, "comment added");
    let view = populate(&state.repo, &blog).await?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

// --- Testing ---

/// reset_database
///
/// [Test Env Only] Empties both collections so end-to-end suites start clean.
pub async fn reset_database(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.repo.clear().await?;
    tracing::info!("database reset");
    Ok(StatusCode::NO_CONTENT)
}

// --- Fallback ---

/// fallback
///
/// Unmatched `/api` paths are a 404 `unknown endpoint`. Every other GET is
/// served from the bundled single-page app, falling back to its `index.html`.
pub async fn fallback(State(config): State<AppConfig>, request: Request) -> Response {
    let path = request.uri().path();
    let is_api = path == "/api" || path.starts_with("/api/");
    let is_read = request.method() == Method::GET || request.method() == Method::HEAD;
    if is_api || !is_read {
        return ApiError::unknown_endpoint().into_response();
    }

    let index = config.static_dir.join("index.html");
    let assets = ServeDir::new(&config.static_dir).fallback(ServeFile::new(index));
    match assets.oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
