use crate::models::{BlogChanges, BlogRecord, NewBlog, NewUser, UserRecord};
use crate::validation;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// StoreError
///
/// Failures surfaced by the document store. Handlers never inspect these; they
/// propagate with `?` into `ApiError`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An identifier that cannot be cast to the store's id type.
    #[error("Cast to id failed for value \"{0}\"")]
    Cast(String),
    /// A schema rule was violated. The message is already in wire format.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Casts a path segment to a document id.
pub fn parse_id(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|_| StoreError::Cast(raw.to_string()))
}

/// Repository Trait
///
/// The document-store collaborator: find / insert / save / update / delete by id
/// for both collections, plus the secondary lookups used to populate
/// references. Schema validation runs inside `insert_*` and `update_blog`.
///
/// `save_*` overwrites the whole document. Callers that append to a list read,
/// modify and save in two steps; concurrent appends to the same document can
/// lose one of the writes.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_users(&self) -> Result<Vec<UserRecord>, StoreError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;
    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<UserRecord>, StoreError>;
    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserRecord>, StoreError>;
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, StoreError>;
    async fn save_user(&self, user: &UserRecord) -> Result<(), StoreError>;

    // --- Blogs ---
    async fn find_blogs(&self) -> Result<Vec<BlogRecord>, StoreError>;
    async fn find_blog(&self, id: Uuid) -> Result<Option<BlogRecord>, StoreError>;
    async fn find_blogs_by_ids(&self, ids: &[Uuid]) -> Result<Vec<BlogRecord>, StoreError>;
    async fn insert_blog(&self, blog: NewBlog) -> Result<BlogRecord, StoreError>;
    async fn save_blog(&self, blog: &BlogRecord) -> Result<(), StoreError>;
    /// Atomic find-and-update. Returns the updated document, or `None` if the
    /// id matched nothing.
    async fn update_blog(
        &self,
        id: Uuid,
        changes: BlogChanges,
    ) -> Result<Option<BlogRecord>, StoreError>;
    /// Returns whether a document was removed.
    async fn delete_blog(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Removes every document from both collections.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Reference and comment lists are stored as
/// `uuid[]` / `text[]` columns so each document stays a single row; `seq`
/// preserves insertion order for listings.
pub struct PostgresRepository {
    pool: PgPool,
}

const USER_COLUMNS: &str = "id, username, name, password_hash, blogs";
const BLOG_COLUMNS: &str = "id, title, author, url, likes, comments, user_id";

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates both collections if they do not exist yet.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                seq BIGSERIAL,
                id UUID PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                name TEXT,
                password_hash TEXT NOT NULL,
                blogs UUID[] NOT NULL DEFAULT '{}'
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS blogs (
                seq BIGSERIAL,
                id UUID PRIMARY KEY,
                title TEXT NOT NULL,
                author TEXT,
                url TEXT NOT NULL,
                likes BIGINT NOT NULL DEFAULT 0,
                comments TEXT[] NOT NULL DEFAULT '{}',
                user_id UUID
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let users = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY seq"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserRecord>, StoreError> {
        let users = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1) ORDER BY seq"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// insert_user
    ///
    /// Runs the schema rules with a uniqueness lookup first. The `UNIQUE`
    /// constraint backs the lookup up against a concurrent registration of the
    /// same name and is reported with the same message.
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let taken = match user.username.as_deref() {
            Some(username) => self.find_user_by_username(username).await?.is_some(),
            None => false,
        };
        validation::validate_new_user(&user, taken)?;

        let username = user.username.unwrap_or_default();
        let result = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (id, username, name, password_hash, blogs) \
             VALUES ($1, $2, $3, $4, '{{}}') RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&username)
        .bind(&user.name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(record) => Ok(record),
            Err(err) if is_unique_violation(&err) => Err(validation::duplicate_username(&username)),
            Err(err) => Err(err.into()),
        }
    }

    async fn save_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET username = $2, name = $3, password_hash = $4, blogs = $5 WHERE id = $1")
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(&user.blogs)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_blogs(&self) -> Result<Vec<BlogRecord>, StoreError> {
        let blogs = sqlx::query_as::<_, BlogRecord>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blogs ORDER BY seq"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(blogs)
    }

    async fn find_blog(&self, id: Uuid) -> Result<Option<BlogRecord>, StoreError> {
        let blog = sqlx::query_as::<_, BlogRecord>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blogs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(blog)
    }

    async fn find_blogs_by_ids(&self, ids: &[Uuid]) -> Result<Vec<BlogRecord>, StoreError> {
        let blogs = sqlx::query_as::<_, BlogRecord>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blogs WHERE id = ANY($1) ORDER BY seq"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(blogs)
    }

    async fn insert_blog(&self, blog: NewBlog) -> Result<BlogRecord, StoreError> {
        validation::validate_new_blog(&blog)?;

        let record = sqlx::query_as::<_, BlogRecord>(&format!(
            "INSERT INTO blogs (id, title, author, url, likes, comments, user_id) \
             VALUES ($1, $2, $3, $4, $5, '{{}}', $6) RETURNING {BLOG_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(blog.title.unwrap_or_default())
        .bind(&blog.author)
        .bind(blog.url.unwrap_or_default())
        .bind(blog.likes.unwrap_or(0))
        .bind(blog.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn save_blog(&self, blog: &BlogRecord) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE blogs SET title = $2, author = $3, url = $4, likes = $5, comments = $6, user_id = $7 \
             WHERE id = $1",
        )
        .bind(blog.id)
        .bind(&blog.title)
        .bind(&blog.author)
        .bind(&blog.url)
        .bind(blog.likes)
        .bind(&blog.comments)
        .bind(blog.user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// update_blog
    ///
    /// Single-statement update; `COALESCE` leaves unset fields untouched.
    async fn update_blog(
        &self,
        id: Uuid,
        changes: BlogChanges,
    ) -> Result<Option<BlogRecord>, StoreError> {
        validation::validate_blog_changes(&changes)?;

        let blog = sqlx::query_as::<_, BlogRecord>(&format!(
            "UPDATE blogs SET \
                title = COALESCE($2, title), \
                author = COALESCE($3, author), \
                url = COALESCE($4, url), \
                likes = COALESCE($5, likes) \
             WHERE id = $1 RETURNING {BLOG_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.author)
        .bind(changes.url)
        .bind(changes.likes)
        .fetch_optional(&self.pool)
        .await?;
        Ok(blog)
    }

    async fn delete_blog(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM blogs").execute(&self.pool).await?;
        sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(())
    }
}
