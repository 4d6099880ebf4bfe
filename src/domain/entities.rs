//! Domain entities mirrored from persistent storage.
//!
//! Post, user and tag records live in the relational store; comments
//! live in the document store and carry a hex ObjectId.

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::types::UserRole;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagRecord {
    pub id: i64,
    pub name: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRecord {
    pub id: String,
    pub post_id: i64,
    pub author_id: i64,
    pub body: String,
    pub created_at: OffsetDateTime,
}
