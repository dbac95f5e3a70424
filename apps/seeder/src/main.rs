//! Seed the blog from a directory of front-matter markdown documents.
//!
//! Usage: `quill-seeder <directory>`
//!
//! Environment: `DATABASE_URL` (required), `SEED_AUTHOR_EMAIL`,
//! `SEED_AUTHOR_PASSWORD` (required the first time, to create the author).

mod front_matter;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use uuid::Uuid;

use quill_core::PostLifecycle;
use quill_core::domain::User;
use quill_core::error::DomainError;
use quill_core::lifecycle::PostDraft;
use quill_core::ports::{PasswordService, PostRepository, UserRepository};
use quill_infra::database::{self, DatabaseConfig};
use quill_infra::{Argon2PasswordService, PostgresPostRepository, PostgresUserRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let dir = std::env::args()
        .nth(1)
        .context("usage: quill-seeder <directory>")?;

    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db = database::connect(&DatabaseConfig {
        url,
        max_connections: 5,
        min_connections: 1,
    })
    .await?;

    let posts: Arc<dyn PostRepository> = Arc::new(PostgresPostRepository::new(db.clone()));
    let users = PostgresUserRepository::new(db);
    let lifecycle = PostLifecycle::new(posts);

    let author = seed_author(&users).await?;

    let mut loaded = 0usize;
    let mut skipped = 0usize;

    let mut entries = tokio::fs::read_dir(&dir)
        .await
        .with_context(|| format!("cannot read {dir}"))?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        match seed_file(&lifecycle, author.id, &path).await {
            Ok(slug) => {
                loaded += 1;
                tracing::info!(file = %path.display(), slug = %slug, "Seeded post");
            }
            Err(e) => {
                skipped += 1;
                tracing::warn!(file = %path.display(), error = %e, "Skipped document");
            }
        }
    }

    tracing::info!(loaded, skipped, "Seeding finished");
    Ok(())
}

/// Find or create the author the seeded posts belong to.
async fn seed_author(users: &PostgresUserRepository) -> anyhow::Result<User> {
    let email =
        std::env::var("SEED_AUTHOR_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    if let Some(existing) = users.find_by_email(&email).await? {
        return Ok(existing);
    }

    let password = std::env::var("SEED_AUTHOR_PASSWORD")
        .context("SEED_AUTHOR_PASSWORD must be set to create the seed author")?;
    let hash = Argon2PasswordService::new().hash(&password)?;

    tracing::info!(email = %email, "Creating seed author");
    Ok(users.save(User::new(email, hash)).await?)
}

/// Load one document through the lifecycle manager, so slug derivation and
/// validation apply exactly as they do for interactive creation.
async fn seed_file(
    lifecycle: &PostLifecycle,
    author_id: Uuid,
    path: &Path,
) -> anyhow::Result<String> {
    let raw = tokio::fs::read_to_string(path).await?;
    let doc = front_matter::parse(&raw)?;

    let draft = PostDraft {
        title: doc.title,
        slug: None,
        excerpt: doc.excerpt,
        category: doc.category.unwrap_or_else(|| "general".to_string()),
        published: true,
        published_at: doc.date,
        body: front_matter::render_markdown(&doc.body),
    };

    match lifecycle.create(author_id, draft).await {
        Ok(post) => Ok(post.slug),
        Err(DomainError::Validation(errors)) => bail!("validation failed: {errors}"),
        Err(e) => Err(e.into()),
    }
}
