use crate::entity::EntityId;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur when reading or patching stored entities.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The requested entity ID does not exist in the store.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// An entity with the same name already exists.
    #[error("entity already exists: \"{0}\"")]
    DuplicateName(String),

    /// The stored entity moved on since the caller read it.
    #[error("version conflict on {id}: expected {expected}, found {found}")]
    VersionConflict {
        /// The entity being patched.
        id: EntityId,
        /// The version the caller based its patch on.
        expected: u64,
        /// The version currently stored.
        found: u64,
    },

    /// A patch path does not address a field of the entity.
    #[error("invalid patch path \"{path}\": {reason}")]
    InvalidPath {
        /// The offending dotted path.
        path: String,
        /// Why it could not be applied.
        reason: String,
    },

    /// The patched document no longer describes a valid entity.
    #[error("patch produced an invalid entity: {0}")]
    Serialization(#[from] serde_json::Error),
}
