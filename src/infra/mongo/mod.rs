//! Document store client.
//!
//! One `mongodb::Client` per process, built lazily behind a
//! double-checked lock: a read-locked fast path hands out database
//! handles once the client exists, and only the client-construction
//! step takes the write lock. `close` shuts the client down and clears
//! the slot, so a later `database` call reconstructs; the relational
//! pool manager, by contrast, stays closed for good.

mod comments;

pub use comments::{COMMENT_COLLECTION, MongoComments};

use bson::doc;
use mongodb::{Client, Database};
use tokio::sync::RwLock;
use tracing::info;

use crate::application::repos::RepoError;
use crate::infra::error::InfraError;

const SERVER_SELECTION_TIMEOUT_MS: u64 = 3000;

#[derive(Default)]
pub struct DocumentStore {
    client: RwLock<Option<Client>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a handle to the named logical database, constructing
    /// the client on first call.
    pub async fn database(&self, uri: &str, name: &str) -> Result<Database, InfraError> {
        {
            let guard = self.client.read().await;
            if let Some(client) = guard.as_ref() {
                return Ok(client.database(name));
            }
        }

        let mut guard = self.client.write().await;
        // Another caller may have won the race while we waited.
        if let Some(client) = guard.as_ref() {
            return Ok(client.database(name));
        }

        let client = connect(uri, name).await?;
        let database = client.database(name);
        *guard = Some(client);
        Ok(database)
    }

    /// Release the underlying connection and clear the slot; a
    /// subsequent `database` call reconstructs the client.
    pub async fn close(&self) {
        let mut guard = self.client.write().await;
        if let Some(client) = guard.take() {
            client.shutdown().await;
            info!("document store client closed");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.client.read().await.is_some()
    }
}

async fn connect(uri: &str, name: &str) -> Result<Client, InfraError> {
    // Bound server selection so an unreachable store fails fast
    // instead of hanging the caller.
    let timeout_uri = if uri.contains('?') {
        format!("{uri}&serverSelectionTimeoutMS={SERVER_SELECTION_TIMEOUT_MS}&connectTimeoutMS={SERVER_SELECTION_TIMEOUT_MS}")
    } else {
        format!("{uri}?serverSelectionTimeoutMS={SERVER_SELECTION_TIMEOUT_MS}&connectTimeoutMS={SERVER_SELECTION_TIMEOUT_MS}")
    };

    let client = Client::with_uri_str(&timeout_uri)
        .await
        .map_err(|err| InfraError::document_store(format!("failed to connect: {err}")))?;

    client
        .database(name)
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|err| InfraError::document_store(format!("ping failed: {err}")))?;

    info!(database = name, "connected to document store");
    Ok(client)
}

pub(crate) fn map_mongo_error(err: mongodb::error::Error) -> RepoError {
    use mongodb::error::ErrorKind;

    match *err.kind {
        ErrorKind::ServerSelection { ref message, .. } => RepoError::exhausted(message.clone()),
        _ => RepoError::from_persistence(err),
    }
}
