//! Object identity shared by every engine type
//!
//! Each entity, component, scene and application carries an [`Object`]: a
//! random 64-bit id plus a human readable name. Ids come from one process-wide
//! generator that is seeded once from entropy.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, OnceLock};

static ID_GENERATOR: OnceLock<Mutex<StdRng>> = OnceLock::new();

/// Unique (with high probability) identifier of an engine object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Draw a fresh id from the process-wide generator
    pub fn generate() -> Self {
        let generator = ID_GENERATOR.get_or_init(|| Mutex::new(StdRng::from_entropy()));
        // A poisoned lock still holds a usable generator.
        let mut rng = match generator.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Self(rng.gen())
    }

    /// Wrap a raw id value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id value
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity (id + name) carried by every engine object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    id: ObjectId,
    name: String,
}

impl Object {
    /// Create an object with a fresh id and the default `Object_<id>` name
    pub fn new() -> Self {
        let id = ObjectId::generate();
        Self {
            id,
            name: Self::default_name(id),
        }
    }

    /// Create an object with a fresh id and the given name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: ObjectId::generate(),
            name: name.into(),
        }
    }

    /// Name given to objects created without one
    pub fn default_name(id: ObjectId) -> String {
        format!("Object_{id}")
    }

    /// Object id
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// Object name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the object
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}
