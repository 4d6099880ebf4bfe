use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::application::pagination::PageRequest;
use crate::application::repos::{CreatePostParams, PostsRepo, RepoError, UpdatePostParams};
use crate::domain::entities::PostRecord;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

const POST_COLUMNS: &str = "id, author_id, title, content, published, created_at, updated_at";

/// Neutralize LIKE metacharacters so a keyword is matched literally.
fn escape_like(keyword: &str) -> String {
    keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    author_id: i64,
    title: String,
    content: String,
    published: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            title: row.title,
            content: row.content,
            published: row.published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn create(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            "INSERT INTO posts (author_id, title, content, published, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, now(), now()) \
             RETURNING id, author_id, title, content, published, created_at, updated_at",
        )
        .bind(params.author_id)
        .bind(&params.title)
        .bind(&params.content)
        .bind(params.published)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn update(&self, params: UpdatePostParams) -> Result<bool, RepoError> {
        let result = sqlx::query(
            "UPDATE posts \
             SET title = $2, content = $3, published = $4, updated_at = now() \
             WHERE id = $1",
        )
        .bind(params.id)
        .bind(&params.title)
        .bind(&params.content)
        .bind(params.published)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<PostRecord>, RepoError> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        ))
        .bind(page.size())
        .bind(page.offset())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_by_author(
        &self,
        author_id: i64,
        page: PageRequest,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts \
             WHERE author_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(author_id)
        .bind(page.size())
        .bind(page.offset())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn search(
        &self,
        keyword: &str,
        page: PageRequest,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let pattern = format!("%{}%", escape_like(keyword));

        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {POST_COLUMNS} FROM posts WHERE ("));
        qb.push("title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" ESCAPE '\\'");
        qb.push(" OR content ILIKE ");
        qb.push_bind(pattern);
        qb.push(" ESCAPE '\\'");
        qb.push(") ORDER BY created_at DESC, id DESC LIMIT ");
        qb.push_bind(page.size());
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }
}
