use serde::{Deserialize, Serialize};

use crate::error::{OperationError, Result, TopologyError};
use crate::math::{Matrix3, Point3};

use super::segment::SegmentId;
use super::Level;

slotmap::new_key_type! {
    /// Unique identifier for a placed object in the level.
    pub struct ObjectId;
}

/// Category of a placed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Player,
    Coop,
    Robot,
    Hostage,
    Powerup,
    Reactor,
}

/// An object placed inside a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub kind: ObjectKind,
    /// Robot or powerup type within `kind`.
    pub subtype: u8,
    /// Segment containing the object.
    pub segment: SegmentId,
    pub position: Point3,
    /// Columns are the right, up and forward vectors.
    pub orientation: Matrix3,
}

impl Object {
    /// Creates an object with identity orientation.
    #[must_use]
    pub fn new(kind: ObjectKind, segment: SegmentId, position: Point3) -> Self {
        Self {
            kind,
            subtype: 0,
            segment,
            position,
            orientation: Matrix3::identity(),
        }
    }
}

impl Level {
    /// Places an object.
    ///
    /// # Errors
    ///
    /// Returns an error if its segment does not exist or the object limit is reached.
    pub fn add_object(&mut self, object: Object) -> Result<ObjectId> {
        self.segment(object.segment)?;
        let limit = self.config.limits.objects;
        if self.objects.len() >= limit {
            return Err(OperationError::CapacityExceeded { entity: "objects", limit }.into());
        }
        Ok(self.objects.insert(object))
    }

    /// Removes an object. Returns `false` if it does not exist.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        self.objects.remove(id).is_some()
    }

    /// Returns a reference to the object, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the level.
    pub fn object(&self, id: ObjectId) -> Result<&Object> {
        Ok(self
            .objects
            .get(id)
            .ok_or(TopologyError::EntityNotFound("object"))?)
    }

    /// Returns a mutable reference to the object, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the level.
    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut Object> {
        Ok(self
            .objects
            .get_mut(id)
            .ok_or(TopologyError::EntityNotFound("object"))?)
    }

    /// Iterates over all objects.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.objects.iter()
    }

    /// Objects contained in `segment`.
    #[must_use]
    pub fn objects_in(&self, segment: SegmentId) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|(_, o)| o.segment == segment)
            .map(|(id, _)| id)
            .collect()
    }

    /// Number of objects in the level.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}
