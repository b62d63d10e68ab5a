use crate::models::{BlogChanges, BlogRecord, NewBlog, NewUser, UserRecord};
use crate::repository::{Repository, StoreError};
use crate::validation;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

/// MemoryRepository
///
/// In-process `Repository` used when no database URL is configured and by the
/// test-suite. Collections are insertion-ordered vectors; every trait method
/// takes the lock once, so each call is atomic on its own while multi-call
/// sequences in handlers are not.
#[derive(Default)]
pub struct MemoryRepository {
    state: RwLock<Collections>,
}

#[derive(Default)]
struct Collections {
    users: Vec<UserRecord>,
    blogs: Vec<BlogRecord>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts fully-formed documents, bypassing validation. Used to seed fixtures.
    pub async fn seed(&self, users: Vec<UserRecord>, blogs: Vec<BlogRecord>) {
        let mut state = self.state.write().await;
        state.users.extend(users);
        state.blogs.extend(blogs);
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.state.read().await.users.clone())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .filter(|user| ids.contains(&user.id))
            .cloned()
            .collect())
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut state = self.state.write().await;
        let taken = user
            .username
            .as_deref()
            .is_some_and(|name| state.users.iter().any(|existing| existing.username == name));
        validation::validate_new_user(&user, taken)?;

        let record = UserRecord {
            id: Uuid::new_v4(),
            username: user.username.unwrap_or_default(),
            name: user.name,
            password_hash: user.password_hash,
            blogs: Vec::new(),
        };
        state.users.push(record.clone());
        Ok(record)
    }

    async fn save_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.users.iter_mut().find(|existing| existing.id == user.id) {
            *existing = user.clone();
        }
        Ok(())
    }

    async fn find_blogs(&self) -> Result<Vec<BlogRecord>, StoreError> {
        Ok(self.state.read().await.blogs.clone())
    }

    async fn find_blog(&self, id: Uuid) -> Result<Option<BlogRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state.blogs.iter().find(|blog| blog.id == id).cloned())
    }

    async fn find_blogs_by_ids(&self, ids: &[Uuid]) -> Result<Vec<BlogRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .blogs
            .iter()
            .filter(|blog| ids.contains(&blog.id))
            .cloned()
            .collect())
    }

    async fn insert_blog(&self, blog: NewBlog) -> Result<BlogRecord, StoreError> {
        validation::validate_new_blog(&blog)?;

        let record = BlogRecord {
            id: Uuid::new_v4(),
            title: blog.title.unwrap_or_default(),
            author: blog.author,
            url: blog.url.unwrap_or_default(),
            likes: blog.likes.unwrap_or(0),
            comments: Vec::new(),
            user_id: Some(blog.user_id),
        };
        self.state.write().await.blogs.push(record.clone());
        Ok(record)
    }

    async fn save_blog(&self, blog: &BlogRecord) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.blogs.iter_mut().find(|existing| existing.id == blog.id) {
            *existing = blog.clone();
        }
        Ok(())
    }

    async fn update_blog(
        &self,
        id: Uuid,
        changes: BlogChanges,
    ) -> Result<Option<BlogRecord>, StoreError> {
        validation::validate_blog_changes(&changes)?;

        let mut state = self.state.write().await;
        Ok(state.blogs.iter_mut().find(|blog| blog.id == id).map(|blog| {
            changes.apply(blog);
            blog.clone()
        }))
    }

    async fn delete_blog(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let before = state.blogs.len();
        state.blogs.retain(|blog| blog.id != id);
        Ok(state.blogs.len() != before)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.users.clear();
        state.blogs.clear();
        Ok(())
    }
}
