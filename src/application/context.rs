//! Request-scoped access context.
//!
//! "Who is acting" travels explicitly through each call chain as a
//! value instead of living in a process-wide slot; a single shared
//! slot is only safe for one logged-in session per process, which a
//! multi-threaded host cannot assume.

use crate::domain::entities::UserRecord;
use crate::domain::types::UserRole;

/// The acting identity carried by a [`RequestContext`].
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
}

impl From<&UserRecord> for Actor {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// Per-request holder of the current actor.
///
/// Role checks derive from the actor's role and are both false when
/// nobody is logged in.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    actor: Option<Actor>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_actor(actor: Actor) -> Self {
        Self { actor: Some(actor) }
    }

    pub fn login(&mut self, actor: Actor) {
        self.actor = Some(actor);
    }

    pub fn logout(&mut self) {
        self.actor = None;
    }

    pub fn current_user(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.actor, Some(Actor { role: UserRole::Admin, .. }))
    }

    pub fn is_author(&self) -> bool {
        matches!(self.actor, Some(Actor { role: UserRole::Author, .. }))
    }
}
