//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::{NullOrdering, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use quill_core::domain::{Post, PostContent, User};
use quill_core::error::RepoError;
use quill_core::ports::{Page, PostRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_content::{self, Entity as ContentEntity};
use super::entity::user::{self, Entity as UserEntity};

fn query_err(e: sea_orm::DbErr) -> RepoError {
    RepoError::Query(e.to_string())
}

/// Map a save-time error, attributing unique violations to the named
/// column's index. This is the last-resort guard for the check-then-write
/// race: a second concurrent writer loses here, not in validation.
pub(crate) fn save_err(field: &'static str) -> impl Fn(sea_orm::DbErr) -> RepoError {
    move |e| {
        let msg = e.to_string();
        if msg.contains("duplicate") || msg.contains("unique") {
            RepoError::UniqueViolation { field }
        } else {
            RepoError::Query(msg)
        }
    }
}

/// PostgreSQL post repository.
pub struct PostgresPostRepository {
    db: DbConn,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool, RepoError> {
        let mut query = PostEntity::find().filter(post::Column::Slug.eq(slug));
        if let Some(id) = exclude {
            query = query.filter(post::Column::Id.ne(id));
        }
        let count = query.count(&self.db).await.map_err(query_err)?;

        Ok(count > 0)
    }

    async fn insert(&self, post: Post, content: PostContent) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(query_err)?;

        let model = post::ActiveModel::from(post)
            .insert(&txn)
            .await
            .map_err(save_err("slug"))?;
        post_content::ActiveModel::from(content)
            .insert(&txn)
            .await
            .map_err(query_err)?;

        txn.commit().await.map_err(query_err)?;
        Ok(model.into())
    }

    async fn update(&self, post: Post, content: Option<PostContent>) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(query_err)?;

        let model = post::ActiveModel::from(post)
            .update(&txn)
            .await
            .map_err(save_err("slug"))?;
        if let Some(content) = content {
            ContentEntity::insert(post_content::ActiveModel::from(content))
                .on_conflict(
                    OnConflict::column(post_content::Column::PostId)
                        .update_columns([
                            post_content::Column::Body,
                            post_content::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec(&txn)
                .await
                .map_err(query_err)?;
        }

        txn.commit().await.map_err(query_err)?;
        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = PostEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(query_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }

    async fn content_of(&self, post_id: Uuid) -> Result<Option<PostContent>, RepoError> {
        let result = ContentEntity::find_by_id(post_id)
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn list_published(&self, page: Page) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Published.eq(true))
            .order_by_with_nulls(post::Column::PublishedAt, Order::Desc, NullOrdering::Last)
            .order_by(post::Column::CreatedAt, Order::Desc)
            .limit(page.limit)
            .offset(page.offset)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn count_published(&self) -> Result<u64, RepoError> {
        PostEntity::find()
            .filter(post::Column::Published.eq(true))
            .count(&self.db)
            .await
            .map_err(query_err)
    }
}

/// PostgreSQL user repository.
pub struct PostgresUserRepository {
    db: DbConn,
}

impl PostgresUserRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        // Mask email for logging to avoid PII in logs
        let masked = if let Some(at_pos) = email.find('@') {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = if local.len() > 1 {
                format!("{}***", &local[..1])
            } else {
                "***".to_string()
            };
            format!("{}{}", masked_local, domain)
        } else {
            "***".to_string()
        };
        tracing::debug!(user_email = %masked, "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn save(&self, saved: User) -> Result<User, RepoError> {
        let model = user::ActiveModel::from(saved)
            .insert(&self.db)
            .await
            .map_err(save_err("email"))?;

        Ok(model.into())
    }
}
