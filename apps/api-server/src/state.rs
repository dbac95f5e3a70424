//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::PostLifecycle;
use quill_core::ports::{PostRepository, UserRepository};
use quill_infra::database::{self, DatabaseConfig};
use quill_infra::{
    InMemoryPostRepository, InMemoryUserRepository, PostgresPostRepository, PostgresUserRepository,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<PostLifecycle>,
    pub posts: Arc<dyn PostRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(db_config: Option<&DatabaseConfig>) -> Self {
        let (posts, users): (Arc<dyn PostRepository>, Arc<dyn UserRepository>) =
            if let Some(config) = db_config {
                match database::connect(config).await {
                    Ok(db) => (
                        Arc::new(PostgresPostRepository::new(db.clone())),
                        Arc::new(PostgresUserRepository::new(db)),
                    ),
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                        (
                            Arc::new(InMemoryPostRepository::new()),
                            Arc::new(InMemoryUserRepository::new()),
                        )
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                (
                    Arc::new(InMemoryPostRepository::new()),
                    Arc::new(InMemoryUserRepository::new()),
                )
            };

        let lifecycle = Arc::new(PostLifecycle::new(posts.clone()));

        tracing::info!("Application state initialized");

        Self {
            lifecycle,
            posts,
            users,
        }
    }
}
