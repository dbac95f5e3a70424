use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rich-text body of a post, kept as a separate record keyed one-to-one to
/// its post. Created and updated alongside the post; removed with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostContent {
    pub post_id: Uuid,
    /// Rendered HTML document.
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostContent {
    pub fn new(post_id: Uuid, body: String) -> Self {
        let now = Utc::now();
        Self {
            post_id,
            body,
            created_at: now,
            updated_at: now,
        }
    }
}
