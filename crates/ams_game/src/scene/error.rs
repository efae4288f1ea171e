use crate::object::ObjectId;
use thiserror::Error;

/// Scene errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// No entity with this id lives in the scene
    #[error("Entity {0} not found in scene")]
    EntityNotFound(ObjectId),

    /// The entity has no such component
    #[error("Entity {entity} has no component {component}")]
    ComponentNotFound {
        /// Entity searched
        entity: ObjectId,
        /// Component type name or id
        component: String,
    },

    /// Entities own exactly one transform
    #[error("Entity {0} already has a Transform")]
    DuplicateTransform(ObjectId),

    /// Reparenting would make an entity its own ancestor
    #[error("Cannot parent {child} under {parent}: it would create a cycle")]
    HierarchyCycle {
        /// Entity being reparented
        child: ObjectId,
        /// Requested parent
        parent: ObjectId,
    },
}
