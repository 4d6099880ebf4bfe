//! Repository traits describing persistence adapters.
//!
//! Each entity exposes the same capability set (create, find-by-id,
//! paginated listing, update, delete) regardless of which store backs
//! it. Posts, users and tags are served by the relational store;
//! comments by the document store. Mutations return `Ok(false)` when
//! the target row no longer exists; they never fabricate one.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::{PageRequest, PaginationError};
use crate::domain::DomainError;
use crate::domain::entities::{CommentRecord, PostRecord, TagRecord, UserRecord};
use crate::domain::types::UserRole;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    Validation { message: String },
    #[error("store resources exhausted: {message}")]
    Exhausted { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn exhausted(message: impl Into<String>) -> Self {
        Self::Exhausted {
            message: message.into(),
        }
    }
}

impl From<PaginationError> for RepoError {
    fn from(err: PaginationError) -> Self {
        Self::Validation {
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for RepoError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(_) => Self::NotFound,
            DomainError::Validation { message } => Self::Validation { message },
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

#[derive(Debug, Clone)]
pub struct UpdateUserParams {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn create(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn update(&self, params: UpdateUserParams) -> Result<bool, RepoError>;

    async fn delete(&self, id: i64) -> Result<bool, RepoError>;

    async fn list(&self, page: PageRequest) -> Result<Vec<UserRecord>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub author_id: i64,
    pub title: String,
    pub content: String,
    pub published: bool,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub published: bool,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn create(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError>;

    async fn update(&self, params: UpdatePostParams) -> Result<bool, RepoError>;

    async fn delete(&self, id: i64) -> Result<bool, RepoError>;

    /// All posts, newest first.
    async fn list(&self, page: PageRequest) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_author(
        &self,
        author_id: i64,
        page: PageRequest,
    ) -> Result<Vec<PostRecord>, RepoError>;

    /// Case-insensitive substring match over title and content.
    async fn search(&self, keyword: &str, page: PageRequest)
    -> Result<Vec<PostRecord>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateTagParams {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct UpdateTagParams {
    pub id: i64,
    pub name: String,
}

#[async_trait]
pub trait TagsRepo: Send + Sync {
    async fn create(&self, params: CreateTagParams) -> Result<TagRecord, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<TagRecord>, RepoError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<TagRecord>, RepoError>;

    async fn update(&self, params: UpdateTagParams) -> Result<bool, RepoError>;

    async fn delete(&self, id: i64) -> Result<bool, RepoError>;

    async fn list(&self, page: PageRequest) -> Result<Vec<TagRecord>, RepoError>;

    /// Attach a tag to a post. Returns false when the link already
    /// existed; attaching twice is a no-op, not an error.
    async fn add_tag_to_post(&self, tag_id: i64, post_id: i64) -> Result<bool, RepoError>;

    /// Detach a tag from a post. Returns false when no link existed.
    async fn remove_tag_from_post(&self, tag_id: i64, post_id: i64) -> Result<bool, RepoError>;

    /// Tags currently attached to a post, ordered by name.
    async fn find_tags_by_post(&self, post_id: i64) -> Result<Vec<TagRecord>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: i64,
    pub author_id: i64,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct UpdateCommentParams {
    pub id: String,
    pub body: String,
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    async fn create(&self, params: CreateCommentParams) -> Result<CommentRecord, RepoError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<CommentRecord>, RepoError>;

    async fn update(&self, params: UpdateCommentParams) -> Result<bool, RepoError>;

    async fn delete(&self, id: &str) -> Result<bool, RepoError>;

    /// Comments on a post, ordered by creation time ascending.
    async fn find_by_post(
        &self,
        post_id: i64,
        page: PageRequest,
    ) -> Result<Vec<CommentRecord>, RepoError>;
}
