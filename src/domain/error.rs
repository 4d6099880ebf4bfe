use std::fmt;

use thiserror::Error;

/// The entities a domain error can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Post,
    User,
    Tag,
    Comment,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Post => "post",
            Entity::User => "user",
            Entity::Tag => "tag",
            Entity::Comment => "comment",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(Entity),
    #[error("{message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_entity() {
        assert_eq!(DomainError::NotFound(Entity::Post).to_string(), "post not found");
        assert_eq!(
            DomainError::NotFound(Entity::Comment).to_string(),
            "comment not found"
        );
    }
}
