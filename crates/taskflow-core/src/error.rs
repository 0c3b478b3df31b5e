use std::fmt;

use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Task,
    Category,
    User,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Task => "Task",
            Self::Category => "Category",
            Self::User => "User",
        };
        f.write_str(name)
    }
}

/// Rejections produced by an entity service or any other backend the
/// view controller talks to.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{kind} not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("{0}")]
    Unavailable(String),
}

impl ServiceError {
    pub fn not_found(kind: EntityKind, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("editor is not open")]
    Closed,

    #[error("Task title is required")]
    TitleRequired,

    #[error("invalid due date: {0}")]
    InvalidDueDate(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// One of the two fetches behind a full refresh failed; nothing from the
/// refresh was applied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to load tasks and categories: {source}")]
pub struct LoadError {
    #[source]
    pub source: ServiceError,
}
