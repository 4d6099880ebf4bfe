//! Comment repository over the document store.
//!
//! Comments are high-volume and loosely structured; they live in a
//! Mongo collection keyed by the relational post id rather than an
//! ownership join, so no cross-store transactionality exists or is
//! assumed.

use async_trait::async_trait;
use bson::{DateTime, doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};

use crate::application::pagination::PageRequest;
use crate::application::repos::{
    CommentsRepo, CreateCommentParams, RepoError, UpdateCommentParams,
};
use crate::domain::entities::CommentRecord;
use crate::domain::validate;

use super::map_mongo_error;

pub const COMMENT_COLLECTION: &str = "comments";

/// Comment document as persisted in the `comments` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CommentDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    post_id: i64,
    author_id: i64,
    body: String,
    created_at: DateTime,
}

impl CommentDoc {
    fn into_record(self) -> Result<CommentRecord, RepoError> {
        let id = self
            .id
            .ok_or_else(|| RepoError::from_persistence("comment document is missing _id"))?;
        Ok(CommentRecord {
            id: id.to_hex(),
            post_id: self.post_id,
            author_id: self.author_id,
            body: self.body,
            created_at: self.created_at.to_time_0_3(),
        })
    }
}

fn parse_object_id(id: &str) -> Result<ObjectId, RepoError> {
    ObjectId::parse_str(id)
        .map_err(|_| RepoError::validation(format!("malformed comment id `{id}`")))
}

pub struct MongoComments {
    comments: Collection<CommentDoc>,
}

impl MongoComments {
    pub fn new(database: &Database) -> Self {
        Self {
            comments: database.collection(COMMENT_COLLECTION),
        }
    }
}

#[async_trait]
impl CommentsRepo for MongoComments {
    async fn create(&self, params: CreateCommentParams) -> Result<CommentRecord, RepoError> {
        validate::comment_body(&params.body)?;

        let doc = CommentDoc {
            id: None,
            post_id: params.post_id,
            author_id: params.author_id,
            body: params.body,
            created_at: DateTime::now(),
        };

        let result = self
            .comments
            .insert_one(&doc)
            .await
            .map_err(map_mongo_error)?;
        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| RepoError::from_persistence("inserted comment id was not an ObjectId"))?;

        CommentDoc {
            id: Some(id),
            ..doc
        }
        .into_record()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<CommentRecord>, RepoError> {
        let oid = parse_object_id(id)?;
        let found = self
            .comments
            .find_one(doc! { "_id": oid })
            .await
            .map_err(map_mongo_error)?;

        found.map(CommentDoc::into_record).transpose()
    }

    async fn update(&self, params: UpdateCommentParams) -> Result<bool, RepoError> {
        validate::comment_body(&params.body)?;

        let oid = parse_object_id(&params.id)?;
        let result = self
            .comments
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": { "body": &params.body } },
            )
            .await
            .map_err(map_mongo_error)?;

        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool, RepoError> {
        let oid = parse_object_id(id)?;
        let result = self
            .comments
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(map_mongo_error)?;

        Ok(result.deleted_count > 0)
    }

    async fn find_by_post(
        &self,
        post_id: i64,
        page: PageRequest,
    ) -> Result<Vec<CommentRecord>, RepoError> {
        let cursor = self
            .comments
            .find(doc! { "post_id": post_id })
            // _id tiebreak keeps pages stable for same-instant comments.
            .sort(doc! { "created_at": 1, "_id": 1 })
            .skip(page.offset() as u64)
            .limit(page.size())
            .await
            .map_err(map_mongo_error)?;

        let docs: Vec<CommentDoc> = cursor.try_collect().await.map_err(map_mongo_error)?;
        docs.into_iter().map(CommentDoc::into_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_are_validation_errors() {
        assert!(matches!(
            parse_object_id("not-an-oid"),
            Err(RepoError::Validation { .. })
        ));
        assert!(parse_object_id(&ObjectId::new().to_hex()).is_ok());
    }
}
