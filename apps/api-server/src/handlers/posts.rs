//! Post handlers - the admin mutation surface and the public read surface.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use quill_core::domain::Post;
use quill_core::error::DomainError;
use quill_core::lifecycle::{PostDraft, PostPatch};
use quill_core::ports::Page;
use quill_shared::dto::{CreatePostRequest, PostListResponse, PostResponse, UpdatePostRequest};

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn to_response(post: &Post, body: Option<String>) -> PostResponse {
    PostResponse {
        id: post.id.to_string(),
        author_id: post.author_id.to_string(),
        title: post.title.clone(),
        slug: post.slug.clone(),
        excerpt: post.excerpt.clone(),
        category: post.category.clone(),
        published: post.published,
        published_at: post.published_at.map(|t| t.to_rfc3339()),
        created_at: post.created_at.to_rfc3339(),
        updated_at: post.updated_at.to_rfc3339(),
        body,
    }
}

fn parse_timestamp(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, AppError> {
    raw.map(|s| {
        s.parse::<DateTime<Utc>>().map_err(|_| {
            AppError::from(DomainError::invalid(
                "published_at",
                "is not a valid timestamp",
            ))
        })
    })
    .transpose()
}

/// POST /api/admin/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let draft = PostDraft {
        title: req.title,
        slug: req.slug,
        excerpt: req.excerpt,
        category: req.category,
        published: req.published,
        published_at: parse_timestamp(req.published_at.as_deref())?,
        body: req.body,
    };

    let post = state.lifecycle.create(identity.user_id, draft).await?;
    tracing::info!(slug = %post.slug, author = %identity.user_id, "Post created");

    Ok(HttpResponse::Created().json(to_response(&post, None)))
}

/// PUT /api/admin/posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {} not found", id)))?;
    if post.author_id != identity.user_id {
        return Err(AppError::Forbidden);
    }

    let req = body.into_inner();
    let patch = PostPatch {
        title: req.title,
        slug: req.slug,
        excerpt: req.excerpt,
        category: req.category,
        published: req.published,
        published_at: parse_timestamp(req.published_at.as_deref())?,
        body: req.body,
    };

    let updated = state.lifecycle.update(&post, patch).await?;
    tracing::info!(slug = %updated.slug, "Post updated");

    Ok(HttpResponse::Ok().json(to_response(&updated, None)))
}

/// DELETE /api/admin/posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {} not found", id)))?;
    if post.author_id != identity.user_id {
        return Err(AppError::Forbidden);
    }

    state.lifecycle.delete(&post).await?;
    tracing::info!(slug = %post.slug, "Post deleted");

    Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// GET /api/posts
pub async fn list_published(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let page = Page {
        limit: query.limit.unwrap_or(20).min(100),
        offset: query.offset.unwrap_or(0),
    };

    let posts = state.lifecycle.list_published(page).await?;
    let total = state.lifecycle.count_published().await?;

    Ok(HttpResponse::Ok().json(PostListResponse {
        posts: posts.iter().map(|p| to_response(p, None)).collect(),
        limit: page.limit,
        offset: page.offset,
        total,
    }))
}

/// GET /api/posts/{identifier}
///
/// The identifier is a slug for public links but may also be a raw id for
/// internal ones; resolution tries the slug first. Drafts are only visible
/// to their author.
pub async fn show(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let identifier = path.into_inner();
    let post = state.lifecycle.resolve(&identifier).await?;

    let is_owner = identity
        .0
        .as_ref()
        .is_some_and(|i| i.user_id == post.author_id);
    if !post.published && !is_owner {
        return Err(AppError::NotFound(format!("post {} not found", identifier)));
    }

    let body = state.lifecycle.content_of(&post).await?.map(|c| c.body);

    Ok(HttpResponse::Ok().json(to_response(&post, body)))
}
