use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::pagination::PageRequest;
use crate::application::repos::{CreateTagParams, RepoError, TagsRepo, UpdateTagParams};
use crate::domain::entities::TagRecord;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

#[derive(sqlx::FromRow)]
struct TagRow {
    id: i64,
    name: String,
    created_at: OffsetDateTime,
}

impl From<TagRow> for TagRecord {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl TagsRepo for PostgresRepositories {
    async fn create(&self, params: CreateTagParams) -> Result<TagRecord, RepoError> {
        let row = sqlx::query_as::<_, TagRow>(
            "INSERT INTO tags (name, created_at) VALUES ($1, now()) \
             RETURNING id, name, created_at",
        )
        .bind(&params.name)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(TagRecord::from(row))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<TagRecord>, RepoError> {
        let row = sqlx::query_as::<_, TagRow>(
            "SELECT id, name, created_at FROM tags WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(TagRecord::from))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<TagRecord>, RepoError> {
        let row = sqlx::query_as::<_, TagRow>(
            "SELECT id, name, created_at FROM tags WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(TagRecord::from))
    }

    async fn update(&self, params: UpdateTagParams) -> Result<bool, RepoError> {
        let result = sqlx::query("UPDATE tags SET name = $2 WHERE id = $1")
            .bind(params.id)
            .bind(&params.name)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<TagRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TagRow>(
            "SELECT id, name, created_at FROM tags \
             ORDER BY LOWER(name), id \
             LIMIT $1 OFFSET $2",
        )
        .bind(page.size())
        .bind(page.offset())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TagRecord::from).collect())
    }

    async fn add_tag_to_post(&self, tag_id: i64, post_id: i64) -> Result<bool, RepoError> {
        // ON CONFLICT makes re-linking an idempotent no-op; zero rows
        // affected reports the link already existed.
        let result = sqlx::query(
            "INSERT INTO post_tags (post_id, tag_id) VALUES ($1, $2) \
             ON CONFLICT (post_id, tag_id) DO NOTHING",
        )
        .bind(post_id)
        .bind(tag_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_tag_from_post(&self, tag_id: i64, post_id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM post_tags WHERE post_id = $1 AND tag_id = $2")
            .bind(post_id)
            .bind(tag_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_tags_by_post(&self, post_id: i64) -> Result<Vec<TagRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TagRow>(
            "SELECT t.id, t.name, t.created_at \
             FROM tags t \
             INNER JOIN post_tags pt ON pt.tag_id = t.id \
             WHERE pt.post_id = $1 \
             ORDER BY LOWER(t.name), t.id",
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TagRecord::from).collect())
    }
}
