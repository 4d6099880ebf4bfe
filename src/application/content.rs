//! Cache-fronted content service.
//!
//! The read-through/write-through seam in front of the post and user
//! repositories. Lookups consult the entity cache first and populate
//! it on miss; mutations hit the repository and then invalidate the
//! touched entry, so the cache never serves a stale row after a write.
//! Business validation runs before any write, and privileged
//! operations consult the request context.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::application::context::RequestContext;
use crate::application::pagination::PageRequest;
use crate::application::repos::{
    CreatePostParams, CreateUserParams, PostsRepo, RepoError, UpdatePostParams, UpdateUserParams,
    UsersRepo,
};
use crate::cache::store::CacheStore;
use crate::domain::entities::{PostRecord, UserRecord};
use crate::domain::types::UserRole;
use crate::domain::validate;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("operation `{action}` requires more privileges than the current actor holds")]
    Forbidden { action: &'static str },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl ServiceError {
    fn forbidden(action: &'static str) -> Self {
        Self::Forbidden { action }
    }
}

/// Registration input as callers supply it; the password is plaintext
/// and is hashed before it reaches a repository.
#[derive(Debug, Clone)]
pub struct RegisterUserParams {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Clone)]
pub struct ContentService {
    posts: Arc<dyn PostsRepo>,
    users: Arc<dyn UsersRepo>,
    cache: Arc<CacheStore>,
}

impl ContentService {
    pub fn new(posts: Arc<dyn PostsRepo>, users: Arc<dyn UsersRepo>, cache: Arc<CacheStore>) -> Self {
        Self { posts, users, cache }
    }

    // ------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------

    /// Read-through post lookup.
    pub async fn get_post(&self, id: i64) -> Result<Option<PostRecord>, ServiceError> {
        if let Some(post) = self.cache.posts.get(id) {
            return Ok(Some(post));
        }

        let found = self.posts.find_by_id(id).await?;
        if let Some(post) = found.as_ref() {
            self.cache.posts.put(post.id, post.clone());
        }
        Ok(found)
    }

    /// Create a post. Requires an author or admin actor; the acting
    /// author may only create posts under their own id.
    pub async fn create_post(
        &self,
        ctx: &RequestContext,
        params: CreatePostParams,
    ) -> Result<PostRecord, ServiceError> {
        let actor = ctx
            .current_user()
            .ok_or_else(|| ServiceError::forbidden("post.create"))?;
        if !ctx.is_admin() && !(ctx.is_author() && actor.id == params.author_id) {
            return Err(ServiceError::forbidden("post.create"));
        }
        validate::post_title(&params.title).map_err(RepoError::from)?;

        let post = self.posts.create(params).await?;
        // The authoritative row is already in hand; prime the cache.
        self.cache.posts.put(post.id, post.clone());
        debug!(post_id = post.id, "created post");
        Ok(post)
    }

    /// Update a post. Returns false when the post no longer exists.
    pub async fn update_post(
        &self,
        ctx: &RequestContext,
        params: UpdatePostParams,
    ) -> Result<bool, ServiceError> {
        let Some(existing) = self.posts.find_by_id(params.id).await? else {
            return Ok(false);
        };
        self.require_post_owner(ctx, &existing, "post.update")?;
        validate::post_title(&params.title).map_err(RepoError::from)?;

        let id = params.id;
        let updated = self.posts.update(params).await?;
        if updated {
            self.cache.posts.invalidate(id);
        }
        Ok(updated)
    }

    /// Delete a post. Returns false when nothing was deleted.
    pub async fn delete_post(&self, ctx: &RequestContext, id: i64) -> Result<bool, ServiceError> {
        let Some(existing) = self.posts.find_by_id(id).await? else {
            return Ok(false);
        };
        self.require_post_owner(ctx, &existing, "post.delete")?;

        let deleted = self.posts.delete(id).await?;
        if deleted {
            self.cache.posts.invalidate(id);
            debug!(post_id = id, "deleted post");
        }
        Ok(deleted)
    }

    pub async fn list_posts(&self, page: PageRequest) -> Result<Vec<PostRecord>, ServiceError> {
        Ok(self.posts.list(page).await?)
    }

    pub async fn search_posts(
        &self,
        keyword: &str,
        page: PageRequest,
    ) -> Result<Vec<PostRecord>, ServiceError> {
        Ok(self.posts.search(keyword, page).await?)
    }

    pub async fn posts_by_author(
        &self,
        author_id: i64,
        page: PageRequest,
    ) -> Result<Vec<PostRecord>, ServiceError> {
        Ok(self.posts.find_by_author(author_id, page).await?)
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Read-through user lookup.
    pub async fn get_user(&self, id: i64) -> Result<Option<UserRecord>, ServiceError> {
        if let Some(user) = self.cache.users.get(id) {
            return Ok(Some(user));
        }

        let found = self.users.find_by_id(id).await?;
        if let Some(user) = found.as_ref() {
            self.cache.users.put(user.id, user.clone());
        }
        Ok(found)
    }

    /// Register a user. Open to anonymous callers; uniqueness of
    /// username and email is enforced by the store and surfaces as
    /// [`RepoError::Duplicate`]. The password is strength-checked and
    /// hashed here, so only the digest ever reaches the store.
    pub async fn create_user(
        &self,
        params: RegisterUserParams,
    ) -> Result<UserRecord, ServiceError> {
        validate::username(&params.username).map_err(RepoError::from)?;
        validate::email(&params.email).map_err(RepoError::from)?;
        validate::password(&params.password).map_err(RepoError::from)?;

        let user = self
            .users
            .create(CreateUserParams {
                username: params.username,
                email: params.email,
                password_hash: hash_password(&params.password),
                role: params.role,
            })
            .await?;
        self.cache.users.put(user.id, user.clone());
        debug!(user_id = user.id, "created user");
        Ok(user)
    }

    /// Update a user. The actor must be the user themselves or an
    /// admin. Returns false when the user no longer exists.
    pub async fn update_user(
        &self,
        ctx: &RequestContext,
        params: UpdateUserParams,
    ) -> Result<bool, ServiceError> {
        let self_update = ctx.current_user().is_some_and(|actor| actor.id == params.id);
        if !ctx.is_admin() && !self_update {
            return Err(ServiceError::forbidden("user.update"));
        }
        validate::email(&params.email).map_err(RepoError::from)?;

        let id = params.id;
        let updated = self.users.update(params).await?;
        if updated {
            self.cache.users.invalidate(id);
        }
        Ok(updated)
    }

    /// Delete a user. Admin only. Returns false when nothing was
    /// deleted.
    pub async fn delete_user(&self, ctx: &RequestContext, id: i64) -> Result<bool, ServiceError> {
        if !ctx.is_admin() {
            return Err(ServiceError::forbidden("user.delete"));
        }

        let deleted = self.users.delete(id).await?;
        if deleted {
            self.cache.users.invalidate(id);
        }
        Ok(deleted)
    }

    pub async fn list_users(&self, page: PageRequest) -> Result<Vec<UserRecord>, ServiceError> {
        Ok(self.users.list(page).await?)
    }

    // ------------------------------------------------------------------
    // Cache maintenance
    // ------------------------------------------------------------------

    /// Empty both entity caches. A diagnostics operation, not part of
    /// normal request flow; admin only.
    pub fn flush_caches(&self, ctx: &RequestContext) -> Result<(), ServiceError> {
        if !ctx.is_admin() {
            return Err(ServiceError::forbidden("cache.flush"));
        }
        self.cache.clear_all();
        Ok(())
    }

    fn require_post_owner(
        &self,
        ctx: &RequestContext,
        post: &PostRecord,
        action: &'static str,
    ) -> Result<(), ServiceError> {
        let owns = ctx
            .current_user()
            .is_some_and(|actor| actor.id == post.author_id);
        if ctx.is_admin() || owns {
            Ok(())
        } else {
            Err(ServiceError::forbidden(action))
        }
    }
}

fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::OffsetDateTime;

    use super::*;
    use crate::application::context::Actor;
    use crate::cache::config::CacheConfig;
    use crate::domain::types::UserRole;

    /// In-memory stand-in for the relational post repository.
    #[derive(Default)]
    struct FakePosts {
        rows: Mutex<HashMap<i64, PostRecord>>,
        next_id: Mutex<i64>,
        finds: Mutex<usize>,
    }

    impl FakePosts {
        fn find_count(&self) -> usize {
            *self.finds.lock().unwrap()
        }
    }

    #[async_trait]
    impl PostsRepo for FakePosts {
        async fn create(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let now = OffsetDateTime::now_utc();
            let post = PostRecord {
                id: *next,
                author_id: params.author_id,
                title: params.title,
                content: params.content,
                published: params.published,
                created_at: now,
                updated_at: now,
            };
            self.rows.lock().unwrap().insert(post.id, post.clone());
            Ok(post)
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
            *self.finds.lock().unwrap() += 1;
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn update(&self, params: UpdatePostParams) -> Result<bool, RepoError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&params.id) {
                Some(post) => {
                    post.title = params.title;
                    post.content = params.content;
                    post.published = params.published;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn delete(&self, id: i64) -> Result<bool, RepoError> {
            Ok(self.rows.lock().unwrap().remove(&id).is_some())
        }

        async fn list(&self, page: PageRequest) -> Result<Vec<PostRecord>, RepoError> {
            let mut all: Vec<_> = self.rows.lock().unwrap().values().cloned().collect();
            all.sort_by_key(|p| std::cmp::Reverse(p.id));
            Ok(all
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.size() as usize)
                .collect())
        }

        async fn find_by_author(
            &self,
            author_id: i64,
            page: PageRequest,
        ) -> Result<Vec<PostRecord>, RepoError> {
            let mut mine: Vec<_> = self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.author_id == author_id)
                .cloned()
                .collect();
            mine.sort_by_key(|p| std::cmp::Reverse(p.id));
            Ok(mine
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.size() as usize)
                .collect())
        }

        async fn search(
            &self,
            keyword: &str,
            page: PageRequest,
        ) -> Result<Vec<PostRecord>, RepoError> {
            let needle = keyword.to_lowercase();
            let mut hits: Vec<_> = self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|p| {
                    p.title.to_lowercase().contains(&needle)
                        || p.content.to_lowercase().contains(&needle)
                })
                .cloned()
                .collect();
            hits.sort_by_key(|p| std::cmp::Reverse(p.id));
            Ok(hits
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.size() as usize)
                .collect())
        }
    }

    #[derive(Default)]
    struct FakeUsers {
        rows: Mutex<HashMap<i64, UserRecord>>,
        next_id: Mutex<i64>,
    }

    #[async_trait]
    impl UsersRepo for FakeUsers {
        async fn create(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
            let mut rows = self.rows.lock().unwrap();
            if rows.values().any(|u| u.username == params.username) {
                return Err(RepoError::Duplicate {
                    constraint: "users_username_key".to_string(),
                });
            }
            if rows.values().any(|u| u.email == params.email) {
                return Err(RepoError::Duplicate {
                    constraint: "users_email_key".to_string(),
                });
            }
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let now = OffsetDateTime::now_utc();
            let user = UserRecord {
                id: *next,
                username: params.username,
                email: params.email,
                password_hash: params.password_hash,
                role: params.role,
                created_at: now,
                updated_at: now,
            };
            rows.insert(user.id, user.clone());
            Ok(user)
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|u| u.username == username)
                .cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn update(&self, params: UpdateUserParams) -> Result<bool, RepoError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&params.id) {
                Some(user) => {
                    user.email = params.email;
                    user.password_hash = params.password_hash;
                    user.role = params.role;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn delete(&self, id: i64) -> Result<bool, RepoError> {
            Ok(self.rows.lock().unwrap().remove(&id).is_some())
        }

        async fn list(&self, page: PageRequest) -> Result<Vec<UserRecord>, RepoError> {
            let mut all: Vec<_> = self.rows.lock().unwrap().values().cloned().collect();
            all.sort_by_key(|u| u.id);
            Ok(all
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.size() as usize)
                .collect())
        }
    }

    struct Fixture {
        service: ContentService,
        posts: Arc<FakePosts>,
        cache: Arc<CacheStore>,
    }

    fn fixture() -> Fixture {
        let posts = Arc::new(FakePosts::default());
        let users = Arc::new(FakeUsers::default());
        let cache = Arc::new(CacheStore::new(&CacheConfig::default()));
        let service = ContentService::new(posts.clone(), users.clone(), cache.clone());
        Fixture {
            service,
            posts,
            cache,
        }
    }

    fn author_ctx(id: i64) -> RequestContext {
        RequestContext::for_actor(Actor {
            id,
            username: format!("author-{id}"),
            role: UserRole::Author,
        })
    }

    fn admin_ctx() -> RequestContext {
        RequestContext::for_actor(Actor {
            id: 999,
            username: "root".to_string(),
            role: UserRole::Admin,
        })
    }

    fn post_params(author_id: i64) -> CreatePostParams {
        CreatePostParams {
            author_id,
            title: "Hello World".to_string(),
            content: "This is a sample content".to_string(),
            published: true,
        }
    }

    #[tokio::test]
    async fn read_through_populates_the_cache() {
        let fx = fixture();
        let post = fx
            .service
            .create_post(&author_ctx(1), post_params(1))
            .await
            .expect("create post");

        fx.cache.posts.invalidate(post.id);
        let before = fx.posts.find_count();

        // Miss falls through and primes the cache.
        let first = fx.service.get_post(post.id).await.expect("lookup");
        assert_eq!(first.as_ref().map(|p| p.id), Some(post.id));
        assert_eq!(fx.posts.find_count(), before + 1);

        // Second read is served from cache.
        let second = fx.service.get_post(post.id).await.expect("lookup");
        assert_eq!(second.map(|p| p.id), Some(post.id));
        assert_eq!(fx.posts.find_count(), before + 1);
    }

    #[tokio::test]
    async fn update_invalidates_the_cached_post() {
        let fx = fixture();
        let ctx = author_ctx(1);
        let post = fx
            .service
            .create_post(&ctx, post_params(1))
            .await
            .expect("create post");
        assert!(fx.cache.posts.get(post.id).is_some());

        let updated = fx
            .service
            .update_post(
                &ctx,
                UpdatePostParams {
                    id: post.id,
                    title: "Hello Again".to_string(),
                    content: post.content.clone(),
                    published: true,
                },
            )
            .await
            .expect("update post");
        assert!(updated);
        assert!(fx.cache.posts.get(post.id).is_none());

        let reread = fx.service.get_post(post.id).await.expect("lookup");
        assert_eq!(reread.map(|p| p.title), Some("Hello Again".to_string()));
    }

    #[tokio::test]
    async fn update_on_missing_post_returns_false() {
        let fx = fixture();
        let updated = fx
            .service
            .update_post(
                &admin_ctx(),
                UpdatePostParams {
                    id: 4242,
                    title: "Ghost".to_string(),
                    content: String::new(),
                    published: false,
                },
            )
            .await
            .expect("update should not error");
        assert!(!updated);
    }

    #[tokio::test]
    async fn non_owner_cannot_mutate_a_post() {
        let fx = fixture();
        let post = fx
            .service
            .create_post(&author_ctx(1), post_params(1))
            .await
            .expect("create post");

        let other = author_ctx(2);
        let err = fx
            .service
            .delete_post(&other, post.id)
            .await
            .expect_err("foreign author must be rejected");
        assert!(matches!(err, ServiceError::Forbidden { .. }));

        // Admin may delete anyone's post.
        assert!(fx
            .service
            .delete_post(&admin_ctx(), post.id)
            .await
            .expect("admin delete"));
        assert!(fx.cache.posts.get(post.id).is_none());
    }

    #[tokio::test]
    async fn reader_cannot_create_posts() {
        let fx = fixture();
        let reader = RequestContext::for_actor(Actor {
            id: 5,
            username: "lurker".to_string(),
            role: UserRole::Reader,
        });
        let err = fx
            .service
            .create_post(&reader, post_params(5))
            .await
            .expect_err("readers cannot publish");
        assert!(matches!(err, ServiceError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn empty_title_is_a_validation_error() {
        let fx = fixture();
        let err = fx
            .service
            .create_post(
                &author_ctx(1),
                CreatePostParams {
                    author_id: 1,
                    title: "  ".to_string(),
                    content: "body".to_string(),
                    published: false,
                },
            )
            .await
            .expect_err("blank title");
        assert!(matches!(
            err,
            ServiceError::Repo(RepoError::Validation { .. })
        ));
    }

    fn register_params() -> RegisterUserParams {
        RegisterUserParams {
            username: "teacherAndy".to_string(),
            email: "teacher.andy@example.com".to_string(),
            password: "correcth0rse".to_string(),
            role: UserRole::Author,
        }
    }

    #[tokio::test]
    async fn duplicate_username_surfaces_as_duplicate() {
        let fx = fixture();
        let params = register_params();
        fx.service
            .create_user(params.clone())
            .await
            .expect("first registration");

        let err = fx
            .service
            .create_user(RegisterUserParams {
                email: "different@example.com".to_string(),
                ..params
            })
            .await
            .expect_err("username is taken");
        assert!(matches!(
            err,
            ServiceError::Repo(RepoError::Duplicate { .. })
        ));
    }

    #[tokio::test]
    async fn malformed_email_is_rejected_before_the_store() {
        let fx = fixture();
        let err = fx
            .service
            .create_user(RegisterUserParams {
                email: "not-an-email".to_string(),
                ..register_params()
            })
            .await
            .expect_err("malformed email");
        assert!(matches!(
            err,
            ServiceError::Repo(RepoError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn weak_password_never_reaches_the_store() {
        let fx = fixture();
        let err = fx
            .service
            .create_user(RegisterUserParams {
                password: "nodigits".to_string(),
                ..register_params()
            })
            .await
            .expect_err("weak password");
        assert!(matches!(
            err,
            ServiceError::Repo(RepoError::Validation { .. })
        ));
        assert!(fx
            .service
            .list_users(PageRequest::first(10).expect("valid page"))
            .await
            .expect("list")
            .is_empty());
    }

    #[tokio::test]
    async fn registration_stores_a_digest_not_the_password() {
        let fx = fixture();
        let user = fx
            .service
            .create_user(register_params())
            .await
            .expect("registration");
        assert_ne!(user.password_hash, "correcth0rse");
        assert_eq!(user.password_hash.len(), 64);
        assert_eq!(user.password_hash, hash_password("correcth0rse"));
    }

    #[tokio::test]
    async fn flush_caches_requires_admin() {
        let fx = fixture();
        assert!(matches!(
            fx.service.flush_caches(&author_ctx(1)),
            Err(ServiceError::Forbidden { .. })
        ));
        fx.service.flush_caches(&admin_ctx()).expect("admin flush");
    }

    #[tokio::test]
    async fn search_matches_case_insensitively() {
        let fx = fixture();
        fx.service
            .create_post(&author_ctx(1), post_params(1))
            .await
            .expect("create post");

        let page = PageRequest::first(10).expect("valid page");
        let hits = fx.service.search_posts("hello", page).await.expect("search");
        assert_eq!(hits.len(), 1);

        let none = fx
            .service
            .search_posts("nomatch", page)
            .await
            .expect("search");
        assert!(none.is_empty());
    }
}
