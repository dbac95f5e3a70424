#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};

    use quill_core::domain::Post;
    use quill_core::error::RepoError;
    use quill_core::ports::PostRepository;

    use crate::database::entity::post;
    use crate::database::postgres_repo::PostgresPostRepository;

    fn post_model(title: &str, slug: &str) -> post::Model {
        let now = chrono::Utc::now();
        post::Model {
            id: uuid::Uuid::new_v4(),
            author_id: uuid::Uuid::new_v4(),
            title: title.to_owned(),
            slug: slug.to_owned(),
            excerpt: None,
            category: "general".to_owned(),
            published: true,
            published_at: Some(now.into()),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn test_find_post_by_id() {
        let model = post_model("Test Post", "test-post");
        let post_id = model.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

        assert!(result.is_some());
        let found = result.unwrap();
        assert_eq!(found.title, "Test Post");
        assert_eq!(found.id, post_id);
    }

    #[tokio::test]
    async fn test_find_post_by_slug() {
        let model = post_model("Hello, World!", "hello-world");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let result = repo.find_by_slug("hello-world").await.unwrap();
        assert_eq!(result.unwrap().slug, "hello-world");
    }

    #[test]
    fn test_unique_index_error_maps_to_slug_violation() {
        let err = DbErr::Custom(
            "duplicate key value violates unique constraint \"idx-posts-slug\"".to_owned(),
        );
        let mapped = super::super::postgres_repo::save_err("slug")(err);
        assert!(matches!(
            mapped,
            RepoError::UniqueViolation { field: "slug" }
        ));
    }
}
