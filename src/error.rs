/// Error type shared by every fallible operation in the crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchematicError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Name collision: {0}")]
    NameCollision(String),
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SchematicError>;

impl SchematicError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SchematicError::InvalidArgument(msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        SchematicError::NotFound(msg.into())
    }

    pub(crate) fn collision(msg: impl Into<String>) -> Self {
        SchematicError::NameCollision(msg.into())
    }
}
