use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    #[error("Database already exists: {0}")]
    DatabaseAlreadyExists(String),

    #[error("Container not found: {0}/{1}")]
    ContainerNotFound(String, String),

    #[error("Container already exists: {0}/{1}")]
    ContainerAlreadyExists(String, String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Invalid store configuration: {0}")]
    InvalidStoreConfig(String),

    #[error("Store client is closed")]
    ClientClosed,

    #[error("Change feed processor error: {0}")]
    ChangeFeed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
