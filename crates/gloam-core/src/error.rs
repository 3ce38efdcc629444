//! Error types for world construction, mutation and loading.
//!
//! Most "failures" in a running world are ordinary control flow: a query
//! with no match returns `None`, striking an immune node returns `false`,
//! destroying a detached node reports [`crate::world::Destroyed::AlreadyDetached`].
//! The enums here cover the cases a caller has to handle.

use thiserror::Error;

use crate::node::NodeId;

/// Errors raised by structural operations on a [`crate::World`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    /// No node is registered under this id
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// Placing `node` inside `container` would make it its own ancestor
    #[error("cannot place node {node} inside {container}: containment cycle")]
    ContainmentCycle {
        /// The node being moved
        node: NodeId,
        /// The requested container
        container: NodeId,
    },

    /// The root cannot be moved, detached or destroyed
    #[error("node {0} is the world root")]
    RootImmutable(NodeId),

    /// The sprite catalog has no sheet with this name
    #[error("unknown sprite '{0}'")]
    UnknownSprite(String),

    /// The operation needs an entity but the node has no behavior attached
    #[error("node {0} has no behavior")]
    NotAnEntity(NodeId),
}

/// Errors raised while restoring a world from a snapshot.
///
/// A failed load never yields a partial world.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Missing or ill-typed fields
    #[error("malformed world snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Two records in the snapshot share an id
    #[error("duplicate node id {0} in snapshot")]
    DuplicateId(NodeId),

    /// The snapshot references something the world cannot build
    #[error(transparent)]
    World(#[from] WorldError),
}

/// Errors raised while reading a [`crate::WorldConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON or has the wrong shape
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Perception must refresh at least once every so many ticks
    #[error("in_view_update_delay must be at least 1")]
    ZeroRefreshInterval,
}

/// Result alias for world operations.
pub type Result<T, E = WorldError> = std::result::Result<T, E>;
