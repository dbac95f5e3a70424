//! Post lifecycle manager - the validation, slug derivation and publish
//! timestamp rules applied on every create and update.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Post, PostContent};
use crate::error::{DomainError, ValidationErrors};
use crate::ports::{Page, PostRepository};
use crate::slug::{derive_slug, is_valid_slug};

/// Attributes accepted when creating a post. Only `title` is strictly
/// required of callers; a blank slug is derived from the title.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub category: String,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    /// Rich-text body HTML.
    pub body: String,
}

/// Partial update. `None` leaves the field unchanged; an empty `excerpt`
/// string clears the excerpt.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub published: Option<bool>,
    pub published_at: Option<DateTime<Utc>>,
    pub body: Option<String>,
}

/// If the post is live and carries no publish timestamp yet, stamp it with
/// the current wall-clock time. Idempotent: an existing timestamp is never
/// overwritten. Runs immediately before persistence on every save.
pub fn assign_publish_timestamp(post: &mut Post) {
    if post.published && post.published_at.is_none() {
        post.published_at = Some(Utc::now());
    }
}

/// Owns the create/update/delete/lookup rules for posts and their bodies.
///
/// Validation failures never partially persist: the repository is only
/// touched once a post has passed the field checks, and a race-lost
/// duplicate slug coming back from storage is folded into the same
/// field-keyed error shape.
pub struct PostLifecycle {
    posts: Arc<dyn PostRepository>,
}

impl PostLifecycle {
    pub fn new(posts: Arc<dyn PostRepository>) -> Self {
        Self { posts }
    }

    /// Create a post owned by `author_id` from the supplied attributes.
    pub async fn create(&self, author_id: Uuid, draft: PostDraft) -> Result<Post, DomainError> {
        let mut post = Post::new(author_id, draft.title, draft.category);
        post.slug = draft.slug.unwrap_or_default();
        post.excerpt = draft.excerpt.filter(|e| !e.is_empty());
        post.published = draft.published;
        post.published_at = draft.published_at;

        fill_blank_slug(&mut post);
        self.validate(&post).await?;
        assign_publish_timestamp(&mut post);

        let content = PostContent::new(post.id, draft.body);
        Ok(self.posts.insert(post, content).await?)
    }

    /// Apply a patch to an existing post. The author is not re-assignable
    /// here; ownership checks are the caller's concern.
    pub async fn update(&self, post: &Post, patch: PostPatch) -> Result<Post, DomainError> {
        let mut updated = post.clone();
        if let Some(title) = patch.title {
            updated.title = title;
        }
        if let Some(slug) = patch.slug {
            updated.slug = slug;
        }
        if let Some(excerpt) = patch.excerpt {
            updated.excerpt = if excerpt.is_empty() {
                None
            } else {
                Some(excerpt)
            };
        }
        if let Some(category) = patch.category {
            updated.category = category;
        }
        if let Some(published) = patch.published {
            updated.published = published;
        }
        if let Some(published_at) = patch.published_at {
            updated.published_at = Some(published_at);
        }
        updated.updated_at = Utc::now();

        fill_blank_slug(&mut updated);
        self.validate(&updated).await?;
        assign_publish_timestamp(&mut updated);

        let content = patch.body.map(|body| PostContent::new(updated.id, body));
        Ok(self.posts.update(updated, content).await?)
    }

    /// Delete a post; the content row goes with it by cascade.
    pub async fn delete(&self, post: &Post) -> Result<(), DomainError> {
        self.posts
            .delete(post.id)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))
    }

    /// Dual-mode lookup: slug match first, then identifier-as-id. Public
    /// links carry slugs while internal links may carry raw ids.
    pub async fn resolve(&self, identifier: &str) -> Result<Post, DomainError> {
        if let Some(post) = self.posts.find_by_slug(identifier).await? {
            return Ok(post);
        }
        if let Ok(id) = Uuid::parse_str(identifier) {
            if let Some(post) = self.posts.find_by_id(id).await? {
                return Ok(post);
            }
        }
        Err(DomainError::NotFound {
            entity: "post",
            ident: identifier.to_string(),
        })
    }

    /// Published posts, most recently published first. Restartable: each
    /// page re-runs the query.
    pub async fn list_published(&self, page: Page) -> Result<Vec<Post>, DomainError> {
        Ok(self.posts.list_published(page).await?)
    }

    pub async fn count_published(&self) -> Result<u64, DomainError> {
        Ok(self.posts.count_published().await?)
    }

    /// Fetch the rich-text body for a post.
    pub async fn content_of(&self, post: &Post) -> Result<Option<PostContent>, DomainError> {
        Ok(self.posts.content_of(post.id).await?)
    }

    /// Field checks: title and category present, slug present, well formed
    /// and unique across every other post. Collects all violations rather
    /// than stopping at the first.
    async fn validate(&self, post: &Post) -> Result<(), DomainError> {
        let mut errors = ValidationErrors::new();
        if post.title.trim().is_empty() {
            errors.add("title", "is required");
        }
        if post.category.trim().is_empty() {
            errors.add("category", "is required");
        }
        if post.slug.is_empty() {
            errors.add("slug", "is required");
        } else if !is_valid_slug(&post.slug) {
            errors.add("slug", "must be lowercase letters, digits and single dashes");
        } else if self.posts.slug_taken(&post.slug, Some(post.id)).await? {
            errors.add("slug", "has already been taken");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }
}

/// Slug derivation applies only when the slug is blank and a title exists.
fn fill_blank_slug(post: &mut Post) {
    if post.slug.trim().is_empty() && !post.title.trim().is_empty() {
        post.slug = derive_slug(&post.title);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::RepoError;

    /// Minimal in-process repository standing in for storage. Enforces the
    /// slug unique constraint the way the real backing index does.
    #[derive(Default)]
    struct MemoryPosts {
        rows: Mutex<Vec<(Post, PostContent)>>,
    }

    #[async_trait]
    impl PostRepository for MemoryPosts {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().find(|(p, _)| p.id == id).map(|(p, _)| p.clone()))
        }

        async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .find(|(p, _)| p.slug == slug)
                .map(|(p, _)| p.clone()))
        }

        async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool, RepoError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .any(|(p, _)| p.slug == slug && Some(p.id) != exclude))
        }

        async fn insert(&self, post: Post, content: PostContent) -> Result<Post, RepoError> {
            let mut rows = self.rows.lock().unwrap();
            if rows.iter().any(|(p, _)| p.slug == post.slug) {
                return Err(RepoError::UniqueViolation { field: "slug" });
            }
            rows.push((post.clone(), content));
            Ok(post)
        }

        async fn update(
            &self,
            post: Post,
            content: Option<PostContent>,
        ) -> Result<Post, RepoError> {
            let mut rows = self.rows.lock().unwrap();
            if rows
                .iter()
                .any(|(p, _)| p.slug == post.slug && p.id != post.id)
            {
                return Err(RepoError::UniqueViolation { field: "slug" });
            }
            let row = rows
                .iter_mut()
                .find(|(p, _)| p.id == post.id)
                .ok_or(RepoError::NotFound)?;
            row.0 = post.clone();
            if let Some(content) = content {
                row.1 = content;
            }
            Ok(post)
        }

        async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|(p, _)| p.id != id);
            if rows.len() == before {
                return Err(RepoError::NotFound);
            }
            Ok(())
        }

        async fn content_of(&self, post_id: Uuid) -> Result<Option<PostContent>, RepoError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .find(|(p, _)| p.id == post_id)
                .map(|(_, c)| c.clone()))
        }

        async fn list_published(&self, page: Page) -> Result<Vec<Post>, RepoError> {
            let rows = self.rows.lock().unwrap();
            let mut posts: Vec<Post> = rows
                .iter()
                .filter(|(p, _)| p.published)
                .map(|(p, _)| p.clone())
                .collect();
            // published_at DESC, nulls last
            posts.sort_by(|a, b| match (&b.published_at, &a.published_at) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => std::cmp::Ordering::Greater,
                (None, Some(_)) => std::cmp::Ordering::Less,
                (None, None) => b.created_at.cmp(&a.created_at),
            });
            Ok(posts
                .into_iter()
                .skip(page.offset as usize)
                .take(page.limit as usize)
                .collect())
        }

        async fn count_published(&self) -> Result<u64, RepoError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().filter(|(p, _)| p.published).count() as u64)
        }
    }

    fn lifecycle() -> (PostLifecycle, Arc<MemoryPosts>) {
        let repo = Arc::new(MemoryPosts::default());
        (PostLifecycle::new(repo.clone()), repo)
    }

    fn draft(title: &str) -> PostDraft {
        PostDraft {
            title: title.to_string(),
            category: "general".to_string(),
            body: "<p>hello</p>".to_string(),
            ..PostDraft::default()
        }
    }

    #[tokio::test]
    async fn create_derives_slug_from_title() {
        let (lifecycle, _) = lifecycle();
        let post = lifecycle
            .create(Uuid::new_v4(), draft("Hello, World!"))
            .await
            .unwrap();
        assert_eq!(post.slug, "hello-world");
        assert!(!post.published);
        assert!(post.published_at.is_none());
    }

    #[tokio::test]
    async fn create_keeps_caller_supplied_slug() {
        let (lifecycle, _) = lifecycle();
        let mut d = draft("Hello, World!");
        d.slug = Some("custom-slug".to_string());
        let post = lifecycle.create(Uuid::new_v4(), d).await.unwrap();
        assert_eq!(post.slug, "custom-slug");
    }

    #[tokio::test]
    async fn create_collects_all_field_violations() {
        let (lifecycle, repo) = lifecycle();
        let result = lifecycle
            .create(Uuid::new_v4(), PostDraft::default())
            .await;
        match result {
            Err(DomainError::Validation(errors)) => {
                assert_eq!(errors.get("title"), Some("is required"));
                assert_eq!(errors.get("category"), Some("is required"));
                assert_eq!(errors.get("slug"), Some("is required"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert!(repo.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_malformed_supplied_slug() {
        let (lifecycle, _) = lifecycle();
        let mut d = draft("A Post");
        d.slug = Some("Not A Slug".to_string());
        let result = lifecycle.create(Uuid::new_v4(), d).await;
        match result {
            Err(DomainError::Validation(errors)) => assert!(errors.get("slug").is_some()),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_slug_fails_validation_without_partial_write() {
        let (lifecycle, repo) = lifecycle();
        let author = Uuid::new_v4();
        lifecycle.create(author, draft("Same Title")).await.unwrap();

        let result = lifecycle.create(author, draft("Same Title")).await;
        match result {
            Err(DomainError::Validation(errors)) => {
                assert_eq!(errors.get("slug"), Some("has already been taken"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert_eq!(repo.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn race_lost_unique_violation_reads_as_validation_error() {
        // Bypass the synchronous check by excluding the winner from it.
        let (lifecycle, repo) = lifecycle();
        let winner = lifecycle
            .create(Uuid::new_v4(), draft("The Slug"))
            .await
            .unwrap();

        // Second writer with the same slug but a repo whose probe lies,
        // mimicking the check-then-write window.
        let loser = Post {
            slug: winner.slug.clone(),
            ..Post::new(Uuid::new_v4(), "The Slug".into(), "general".into())
        };
        let err = repo
            .insert(loser.clone(), PostContent::new(loser.id, String::new()))
            .await
            .unwrap_err();
        let domain: DomainError = err.into();
        match domain {
            DomainError::Validation(errors) => {
                assert_eq!(errors.get("slug"), Some("has already been taken"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn publishing_assigns_timestamp_exactly_once() {
        let (lifecycle, _) = lifecycle();
        let mut d = draft("Launch Day");
        d.published = true;
        let post = lifecycle.create(Uuid::new_v4(), d).await.unwrap();
        let stamped = post.published_at.expect("publish timestamp assigned");

        // A later save leaves the original timestamp alone.
        let updated = lifecycle
            .update(
                &post,
                PostPatch {
                    title: Some("Launch Day, Revised".to_string()),
                    slug: Some(post.slug.clone()),
                    ..PostPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.published_at, Some(stamped));
    }

    #[tokio::test]
    async fn explicit_publish_timestamp_wins() {
        let (lifecycle, _) = lifecycle();
        let when = "2024-03-01T12:00:00Z".parse().unwrap();
        let mut d = draft("Backdated");
        d.published = true;
        d.published_at = Some(when);
        let post = lifecycle.create(Uuid::new_v4(), d).await.unwrap();
        assert_eq!(post.published_at, Some(when));
    }

    #[test]
    fn assign_publish_timestamp_is_idempotent() {
        let mut post = Post::new(Uuid::new_v4(), "T".into(), "c".into());
        post.published = true;
        assign_publish_timestamp(&mut post);
        let first = post.published_at;
        assert!(first.is_some());
        assign_publish_timestamp(&mut post);
        assert_eq!(post.published_at, first);

        // Unpublished posts are never stamped.
        let mut unpublished = Post::new(Uuid::new_v4(), "T".into(), "c".into());
        assign_publish_timestamp(&mut unpublished);
        assert!(unpublished.published_at.is_none());
    }

    #[tokio::test]
    async fn update_rederives_a_blanked_slug() {
        let (lifecycle, _) = lifecycle();
        let post = lifecycle
            .create(Uuid::new_v4(), draft("Original Title"))
            .await
            .unwrap();
        let updated = lifecycle
            .update(
                &post,
                PostPatch {
                    title: Some("Fresh Title".to_string()),
                    slug: Some(String::new()),
                    ..PostPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.slug, "fresh-title");
    }

    #[tokio::test]
    async fn resolve_prefers_slug_then_falls_back_to_id() {
        let (lifecycle, _) = lifecycle();
        let post = lifecycle
            .create(Uuid::new_v4(), draft("Hello, World!"))
            .await
            .unwrap();

        let by_slug = lifecycle.resolve("hello-world").await.unwrap();
        assert_eq!(by_slug.id, post.id);

        let by_id = lifecycle.resolve(&post.id.to_string()).await.unwrap();
        assert_eq!(by_id.id, post.id);

        match lifecycle.resolve("missing-slug").await {
            Err(DomainError::NotFound { entity, ident }) => {
                assert_eq!(entity, "post");
                assert_eq!(ident, "missing-slug");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_published_orders_newest_first_with_nulls_last() {
        let (lifecycle, repo) = lifecycle();
        let author = Uuid::new_v4();

        let mut older = draft("Older Post");
        older.published = true;
        older.published_at = Some("2024-01-01T00:00:00Z".parse().unwrap());
        lifecycle.create(author, older).await.unwrap();

        let mut newer = draft("Newer Post");
        newer.published = true;
        newer.published_at = Some("2025-01-01T00:00:00Z".parse().unwrap());
        lifecycle.create(author, newer).await.unwrap();

        lifecycle.create(author, draft("Draft Post")).await.unwrap();

        // A manually published post with no timestamp: the preserved
        // looseness between the flag and the timestamp.
        let mut dated_never = Post::new(author, "Flagged Only".into(), "general".into());
        dated_never.slug = "flagged-only".into();
        dated_never.published = true;
        repo.insert(
            dated_never.clone(),
            PostContent::new(dated_never.id, String::new()),
        )
        .await
        .unwrap();

        let listed = lifecycle.list_published(Page::default()).await.unwrap();
        let slugs: Vec<&str> = listed.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["newer-post", "older-post", "flagged-only"]);
        assert_eq!(lifecycle.count_published().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn delete_removes_post_and_body_together() {
        let (lifecycle, repo) = lifecycle();
        let post = lifecycle
            .create(Uuid::new_v4(), draft("Short Lived"))
            .await
            .unwrap();
        assert!(repo.content_of(post.id).await.unwrap().is_some());

        lifecycle.delete(&post).await.unwrap();
        assert!(repo.find_by_id(post.id).await.unwrap().is_none());
        assert!(repo.content_of(post.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_replaces_body_only_when_patched() {
        let (lifecycle, repo) = lifecycle();
        let post = lifecycle
            .create(Uuid::new_v4(), draft("Body Talk"))
            .await
            .unwrap();

        lifecycle
            .update(
                &post,
                PostPatch {
                    excerpt: Some("a teaser".to_string()),
                    ..PostPatch::default()
                },
            )
            .await
            .unwrap();
        let body = repo.content_of(post.id).await.unwrap().unwrap();
        assert_eq!(body.body, "<p>hello</p>");

        lifecycle
            .update(
                &post,
                PostPatch {
                    body: Some("<p>rewritten</p>".to_string()),
                    ..PostPatch::default()
                },
            )
            .await
            .unwrap();
        let body = repo.content_of(post.id).await.unwrap().unwrap();
        assert_eq!(body.body, "<p>rewritten</p>");
    }
}
