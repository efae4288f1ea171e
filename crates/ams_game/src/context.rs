//! Process-wide engine context
//!
//! Holds the state that would otherwise be global: the mesh loader registry and
//! the slot recording which [`Application`](crate::Application) is currently
//! alive. Build one at startup and pass it to whatever needs it.

use crate::mesh::{Mesh, MeshError, MeshLoaderRegistry};
use crate::object::ObjectId;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Context errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// Another application still holds the slot
    #[error("Application already exists (id {0})")]
    ApplicationAlreadyExists(ObjectId),
}

/// Shared record of the live application
///
/// Cloning yields another handle to the same slot.
#[derive(Debug, Clone, Default)]
pub struct ApplicationSlot {
    active: Arc<Mutex<Option<ObjectId>>>,
}

impl ApplicationSlot {
    fn lock(&self) -> MutexGuard<'_, Option<ObjectId>> {
        match self.active.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Claim the slot for `id`
    pub fn claim(&self, id: ObjectId) -> Result<(), ContextError> {
        let mut active = self.lock();
        if let Some(existing) = *active {
            log::error!("Application already exists (id {existing})");
            return Err(ContextError::ApplicationAlreadyExists(existing));
        }
        *active = Some(id);
        Ok(())
    }

    /// Release the slot if `id` holds it. Returns whether it was released.
    pub fn release(&self, id: ObjectId) -> bool {
        let mut active = self.lock();
        if *active == Some(id) {
            *active = None;
            true
        } else {
            false
        }
    }

    /// Id of the application holding the slot
    pub fn current(&self) -> Option<ObjectId> {
        *self.lock()
    }
}

/// Engine context: mesh loader registry and the application slot
#[derive(Default)]
pub struct Context {
    mesh_loaders: MeshLoaderRegistry,
    application: ApplicationSlot,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered mesh loaders
    pub const fn mesh_loaders(&self) -> &MeshLoaderRegistry {
        &self.mesh_loaders
    }

    /// Registered mesh loaders, mutable for registration
    pub fn mesh_loaders_mut(&mut self) -> &mut MeshLoaderRegistry {
        &mut self.mesh_loaders
    }

    /// Load a mesh through the registry
    pub fn load_mesh(&mut self, path: impl AsRef<Path>) -> Result<Mesh, MeshError> {
        Mesh::from_file(&mut self.mesh_loaders, path)
    }

    /// Application slot handle
    pub const fn application_slot(&self) -> &ApplicationSlot {
        &self.application
    }

    /// Id of the live application, if any
    pub fn active_application(&self) -> Option<ObjectId> {
        self.application.current()
    }
}
