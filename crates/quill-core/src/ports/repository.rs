use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Post, PostContent, User};
use crate::error::RepoError;

/// Offset-paginated window over a listing. Listings are restartable: the
/// same page always re-runs the query from scratch.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

/// Post repository. A post and its rich-text body travel together: inserts
/// always carry a body, updates may carry a replacement, deletes cascade.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// Uniqueness probe used by validation; `exclude` skips the post being
    /// edited so it does not collide with itself.
    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool, RepoError>;

    async fn insert(&self, post: Post, content: PostContent) -> Result<Post, RepoError>;

    async fn update(&self, post: Post, content: Option<PostContent>) -> Result<Post, RepoError>;

    /// Delete a post and, by cascade, its content row.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    async fn content_of(&self, post_id: Uuid) -> Result<Option<PostContent>, RepoError>;

    /// Published posts ordered by `published_at` descending, posts without a
    /// publish timestamp sorting last.
    async fn list_published(&self, page: Page) -> Result<Vec<Post>, RepoError>;

    async fn count_published(&self) -> Result<u64, RepoError>;
}

/// User repository.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;

    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn save(&self, user: User) -> Result<User, RepoError>;
}
