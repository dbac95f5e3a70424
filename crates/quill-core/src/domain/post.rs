use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - a blog article, publicly addressed by its slug.
///
/// `published` and `published_at` are deliberately independent fields: the
/// timestamp is stamped automatically on first publish but callers may set
/// either one directly, and no cross-field invariant is enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub category: String,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new unpublished post owned by `author_id`.
    pub fn new(author_id: Uuid, title: String, category: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            slug: String::new(),
            excerpt: None,
            category,
            published: false,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
