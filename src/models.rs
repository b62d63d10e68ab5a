use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Stored Documents ---

/// UserRecord
///
/// A persisted credential record. The digest never leaves the server: every
/// outward representation goes through [`UserView`], [`OwnerView`] or
/// [`UserWithBlogs`], none of which carry it.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub name: Option<String>,
    pub password_hash: String,
    // References to owned posts, in the order they were created.
    pub blogs: Vec<Uuid>,
}

/// BlogRecord
///
/// A persisted post. `user_id` is a weak reference into the credential store:
/// it is resolved on output, and a dangling reference populates as `null`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct BlogRecord {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub url: String,
    pub likes: i64,
    pub comments: Vec<String>,
    pub user_id: Option<Uuid>,
}

// --- Store Inputs ---

/// A user document prior to validation. `username` stays optional so the
/// schema can report it as missing.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Option<String>,
    pub name: Option<String>,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewBlog {
    pub title: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub likes: Option<i64>,
    pub user_id: Uuid,
}

/// BlogChanges
///
/// The allow-listed set of fields a single update may touch. Fields left as
/// `None` are not modified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub likes: Option<i64>,
}

impl BlogChanges {
    /// Changes any authenticated user may apply: the like count only.
    pub fn likes_only(payload: &BlogPayload) -> Self {
        Self {
            likes: payload.likes,
            ..Self::default()
        }
    }

    /// Changes the owner may apply.
    pub fn owner(payload: &BlogPayload) -> Self {
        Self {
            title: payload.title.clone(),
            author: payload.author.clone(),
            url: payload.url.clone(),
            likes: payload.likes,
        }
    }

    pub fn apply(&self, blog: &mut BlogRecord) {
        if let Some(title) = &self.title {
            blog.title = title.clone();
        }
        if let Some(author) = &self.author {
            blog.author = Some(author.clone());
        }
        if let Some(url) = &self.url {
            blog.url = url.clone();
        }
        if let Some(likes) = self.likes {
            blog.likes = likes;
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input payload for `POST /api/users`. Every field is optional at the wire
/// level; presence and length are checked by the handler and the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub username: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// BlogPayload
///
/// Body accepted by create and update. Only these four fields are read; any
/// other field in the request body is dropped during deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct BlogPayload {
    pub title: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub likes: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct CommentRequest {
    #[serde(deserialize_with = "string_or_scalar")]
    pub comment: Option<String>,
}

/// Accepts a string, or casts a number or boolean to its string form.
fn string_or_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(Value::Bool(flag)) => Ok(Some(flag.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "Cast to string failed for value {other} (type {})",
            if other.is_array() { "Array" } else { "Object" }
        ))),
    }
}

// --- Response Schemas (Output DTOs) ---

/// UserView
///
/// A user as returned by registration: digest removed, internal identifier
/// rendered as the string `id`, owned posts as id strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserView {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub blogs: Vec<String>,
    pub id: String,
}

impl UserView {
    pub fn from_record(user: &UserRecord) -> Self {
        Self {
            username: user.username.clone(),
            name: user.name.clone(),
            blogs: user.blogs.iter().map(Uuid::to_string).collect(),
            id: user.id.to_string(),
        }
    }
}

/// OwnerView
///
/// The populated owner of a post. Restricted to `{username, name, id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct OwnerView {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub id: String,
}

impl OwnerView {
    pub fn from_record(user: &UserRecord) -> Self {
        Self {
            username: user.username.clone(),
            name: user.name.clone(),
            id: user.id.to_string(),
        }
    }
}

/// BlogView
///
/// A post with its owner reference populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct BlogView {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub url: String,
    pub likes: i64,
    pub comments: Vec<String>,
    pub user: Option<OwnerView>,
    pub id: String,
}

impl BlogView {
    /// Builds the outward representation from a post and its resolved owner.
    /// `owner` is `None` when the reference is absent or dangling.
    pub fn populated(blog: &BlogRecord, owner: Option<&UserRecord>) -> Self {
        Self {
            title: blog.title.clone(),
            author: blog.author.clone(),
            url: blog.url.clone(),
            likes: blog.likes,
            comments: blog.comments.clone(),
            user: owner.map(OwnerView::from_record),
            id: blog.id.to_string(),
        }
    }
}

/// BlogSummary
///
/// A post nested inside a populated user listing; its own owner stays a bare id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct BlogSummary {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub url: String,
    pub likes: i64,
    pub comments: Vec<String>,
    pub user: Option<String>,
    pub id: String,
}

impl BlogSummary {
    pub fn from_record(blog: &BlogRecord) -> Self {
        Self {
            title: blog.title.clone(),
            author: blog.author.clone(),
            url: blog.url.clone(),
            likes: blog.likes,
            comments: blog.comments.clone(),
            user: blog.user_id.map(|id| id.to_string()),
            id: blog.id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserWithBlogs {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub blogs: Vec<BlogSummary>,
    pub id: String,
}

impl UserWithBlogs {
    /// Pairs a user with the posts its reference list resolves to. References
    /// that no longer resolve are skipped.
    pub fn populated(user: &UserRecord, blogs: &[BlogRecord]) -> Self {
        Self {
            username: user.username.clone(),
            name: user.name.clone(),
            blogs: user
                .blogs
                .iter()
                .filter_map(|id| blogs.iter().find(|blog| blog.id == *id))
                .map(BlogSummary::from_record)
                .collect(),
            id: user.id.to_string(),
        }
    }
}

/// LoginResponse
///
/// Successful login: the signed token and the public identity of its holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub id: String,
}

/// Error body shared by every failure response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}
