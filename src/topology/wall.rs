use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OperationError, Result, TopologyError};

use super::segment::TextureId;
use super::tag::Tag;
use super::trigger::TriggerId;
use super::Level;

slotmap::new_key_type! {
    /// Unique identifier for a wall in the level.
    pub struct WallId;
}

/// Behaviour of a wall placed on a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallKind {
    Door,
    Destroyable,
    Illusion,
    Closed,
    FlyThroughTrigger,
    WallTrigger,
    Cloaked,
}

impl WallKind {
    /// Returns `true` for walls that exist only to carry a trigger.
    #[must_use]
    pub fn is_trigger_only(self) -> bool {
        matches!(self, WallKind::FlyThroughTrigger | WallKind::WallTrigger)
    }
}

/// Wall state bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WallFlags(pub u8);

impl WallFlags {
    pub const BLASTED: Self = Self(0x01);
    pub const DOOR_OPENED: Self = Self(0x02);
    pub const DOOR_LOCKED: Self = Self(0x08);
    pub const DOOR_AUTO: Self = Self(0x10);
    pub const ILLUSION_OFF: Self = Self(0x20);

    /// Returns `true` if every bit of `other` is set.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for WallFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A wall on exactly one side.
#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    /// Side carrying the wall.
    pub tag: Tag,
    pub kind: WallKind,
    pub flags: WallFlags,
    /// Trigger fired through this wall.
    pub trigger: Option<TriggerId>,
}

impl Level {
    /// Places a wall on a connected side and applies its textures.
    ///
    /// # Errors
    ///
    /// Returns an error if the side does not exist, has no connection,
    /// already carries a wall, or the wall limit is reached.
    pub fn add_wall(
        &mut self,
        tag: Tag,
        kind: WallKind,
        texture: TextureId,
        overlay: Option<TextureId>,
        flags: WallFlags,
    ) -> Result<WallId> {
        let segment = self.segment(tag.segment)?;
        if segment.connection(tag.side).is_none() {
            return Err(TopologyError::SideNotConnected(tag).into());
        }
        if segment.side(tag.side).wall.is_some() {
            return Err(OperationError::InvalidInput(format!("side {tag} already has a wall")).into());
        }
        let limit = self.config.limits.walls;
        if self.walls.len() >= limit {
            return Err(OperationError::CapacityExceeded { entity: "walls", limit }.into());
        }

        let id = self.walls.insert(Wall {
            tag,
            kind,
            flags,
            trigger: None,
        });
        let side = self.segment_mut(tag.segment)?.side_mut(tag.side);
        side.wall = Some(id);
        side.texture = texture;
        side.overlay = overlay;
        self.request_texture(texture);
        if let Some(overlay) = overlay {
            self.request_texture(overlay);
        }
        debug!(?id, %tag, ?kind, "added wall");
        Ok(id)
    }

    /// Removes a wall, the trigger it owns, and trigger targets aimed at its side.
    ///
    /// Returns `false` if the wall does not exist.
    pub fn remove_wall(&mut self, id: WallId) -> bool {
        let Some(wall) = self.walls.remove(id) else {
            return false;
        };
        if let Some(segment) = self.segments.get_mut(wall.tag.segment) {
            let side = segment.side_mut(wall.tag.side);
            if side.wall == Some(id) {
                side.wall = None;
            }
        }
        if let Some(trigger) = wall.trigger {
            let shared = self.walls.values().any(|w| w.trigger == Some(trigger));
            if !shared {
                self.remove_trigger(trigger);
            }
        }
        for trigger in self.triggers.values_mut() {
            trigger.targets.retain(|t| *t != wall.tag);
        }
        debug!(?id, tag = %wall.tag, "removed wall");
        true
    }

    /// Removes the wall on a side, if any. Returns `true` if one was removed.
    pub fn remove_wall_at(&mut self, tag: Tag) -> bool {
        let wall = self
            .segments
            .get(tag.segment)
            .and_then(|s| s.side(tag.side).wall);
        wall.is_some_and(|id| self.remove_wall(id))
    }

    /// Returns a reference to the wall, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the level.
    pub fn wall(&self, id: WallId) -> Result<&Wall> {
        Ok(self
            .walls
            .get(id)
            .ok_or(TopologyError::EntityNotFound("wall"))?)
    }

    /// Returns a mutable reference to the wall, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the level.
    pub fn wall_mut(&mut self, id: WallId) -> Result<&mut Wall> {
        Ok(self
            .walls
            .get_mut(id)
            .ok_or(TopologyError::EntityNotFound("wall"))?)
    }

    /// Iterates over all walls.
    pub fn walls(&self) -> impl Iterator<Item = (WallId, &Wall)> {
        self.walls.iter()
    }

    /// Number of walls in the level.
    #[must_use]
    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }
}
