//! DOM errors
//!
//! Only the mutation API and collection lookup can fail. Reads from a live
//! collection never do: out-of-range access yields `None`.

use crate::collection::CollectionType;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// Errors raised by tree mutation and collection lookup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(&'static str),

    #[error("Node not found: {0}")]
    NotFound(&'static str),

    #[error("Invalid character in name: {0:?}")]
    InvalidCharacter(String),

    #[error("Operation not supported on this node type: {0}")]
    InvalidNodeType(&'static str),

    #[error("Wrong document: {0}")]
    WrongDocument(&'static str),

    #[error("Collection {0:?} requires a qualifying name")]
    MissingQualifyingName(CollectionType),

    #[error("Collection {0:?} does not take a qualifying name")]
    UnexpectedQualifyingName(CollectionType),
}
