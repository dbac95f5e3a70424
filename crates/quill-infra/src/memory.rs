//! In-memory repository implementations - used as fallback when the
//! database is not configured, and as fixtures in tests.
//!
//! The slug and email unique constraints are enforced here the same way the
//! Postgres indexes enforce them, so callers see identical `UniqueViolation`
//! errors in both modes. Note: data is lost on process restart.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{Post, PostContent, User};
use quill_core::error::RepoError;
use quill_core::ports::{Page, PostRepository, UserRepository};

/// `published_at` DESC with nulls last, `created_at` DESC as tiebreak -
/// the same ordering the Postgres listing query produces.
fn published_order(a: &Post, b: &Post) -> Ordering {
    match (&b.published_at, &a.published_at) {
        (Some(x), Some(y)) => x.cmp(y).then(b.created_at.cmp(&a.created_at)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => b.created_at.cmp(&a.created_at),
    }
}

/// In-memory post repository using a HashMap with an async RwLock.
#[derive(Default)]
pub struct InMemoryPostRepository {
    rows: RwLock<HashMap<Uuid, (Post, PostContent)>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let rows = self.rows.read().await;
        Ok(rows.get(&id).map(|(post, _)| post.clone()))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .find(|(post, _)| post.slug == slug)
            .map(|(post, _)| post.clone()))
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool, RepoError> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .any(|(post, _)| post.slug == slug && Some(post.id) != exclude))
    }

    async fn insert(&self, post: Post, content: PostContent) -> Result<Post, RepoError> {
        let mut rows = self.rows.write().await;
        if rows.values().any(|(existing, _)| existing.slug == post.slug) {
            return Err(RepoError::UniqueViolation { field: "slug" });
        }
        rows.insert(post.id, (post.clone(), content));
        Ok(post)
    }

    async fn update(&self, post: Post, content: Option<PostContent>) -> Result<Post, RepoError> {
        let mut rows = self.rows.write().await;
        if rows
            .values()
            .any(|(existing, _)| existing.slug == post.slug && existing.id != post.id)
        {
            return Err(RepoError::UniqueViolation { field: "slug" });
        }
        let row = rows.get_mut(&post.id).ok_or(RepoError::NotFound)?;
        row.0 = post.clone();
        if let Some(content) = content {
            row.1 = content;
        }
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut rows = self.rows.write().await;
        rows.remove(&id).ok_or(RepoError::NotFound)?;
        Ok(())
    }

    async fn content_of(&self, post_id: Uuid) -> Result<Option<PostContent>, RepoError> {
        let rows = self.rows.read().await;
        Ok(rows.get(&post_id).map(|(_, content)| content.clone()))
    }

    async fn list_published(&self, page: Page) -> Result<Vec<Post>, RepoError> {
        let rows = self.rows.read().await;
        let mut posts: Vec<Post> = rows
            .values()
            .filter(|(post, _)| post.published)
            .map(|(post, _)| post.clone())
            .collect();
        posts.sort_by(published_order);
        Ok(posts
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn count_published(&self) -> Result<u64, RepoError> {
        let rows = self.rows.read().await;
        Ok(rows.values().filter(|(post, _)| post.published).count() as u64)
    }
}

/// In-memory user repository.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|existing| existing.email == user.email && existing.id != user.id)
        {
            return Err(RepoError::UniqueViolation { field: "email" });
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }
}
