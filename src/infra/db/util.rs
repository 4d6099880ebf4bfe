use crate::application::repos::RepoError;

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::PoolTimedOut => {
            RepoError::exhausted("connection pool exhausted past the acquire timeout")
        }
        sqlx::Error::PoolClosed => RepoError::exhausted("connection pool is closed"),
        sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::Duplicate {
            constraint: db.constraint().unwrap_or("unknown").to_string(),
        },
        // A missing referenced row (post, user, tag) surfaces from the
        // store as a foreign key violation.
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => RepoError::NotFound,
        sqlx::Error::Database(db) if db.is_check_violation() => RepoError::Validation {
            message: db.message().to_string(),
        },
        other => RepoError::from_persistence(other),
    }
}
