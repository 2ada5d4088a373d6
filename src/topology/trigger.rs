use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OperationError, Result, TopologyError};

use super::segment::SegmentId;
use super::tag::Tag;
use super::wall::WallId;
use super::Level;

slotmap::new_key_type! {
    /// Unique identifier for a trigger in the level.
    pub struct TriggerId;
}

/// Action performed when a trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerKind {
    OpenDoor,
    CloseDoor,
    UnlockDoor,
    LockDoor,
    OpenWall,
    CloseWall,
    IllusionOn,
    IllusionOff,
    Matcen,
    Exit,
    SecretExit,
}

/// A trigger actuating the walls on its target sides.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub kind: TriggerKind,
    pub flags: u16,
    /// Kind-specific parameter (damage, delay).
    pub value: f64,
    /// Sides whose walls this trigger actuates, in firing order.
    pub targets: Vec<Tag>,
}

impl Trigger {
    /// Creates a trigger with the given targets and zeroed parameters.
    #[must_use]
    pub fn new(kind: TriggerKind, targets: Vec<Tag>) -> Self {
        Self {
            kind,
            flags: 0,
            value: 0.0,
            targets,
        }
    }
}

impl Level {
    /// Adds a trigger and attaches it to `wall`.
    ///
    /// # Errors
    ///
    /// Returns an error if the wall does not exist or already owns a trigger,
    /// a target side does not exist, or the trigger limit is reached.
    pub fn add_trigger(&mut self, wall: WallId, trigger: Trigger) -> Result<TriggerId> {
        if self.wall(wall)?.trigger.is_some() {
            return Err(OperationError::InvalidInput("wall already owns a trigger".into()).into());
        }
        for target in &trigger.targets {
            self.segment(target.segment)?;
        }
        let limit = self.config.limits.triggers;
        if self.triggers.len() >= limit {
            return Err(OperationError::CapacityExceeded { entity: "triggers", limit }.into());
        }
        let id = self.triggers.insert(trigger);
        self.wall_mut(wall)?.trigger = Some(id);
        debug!(?id, ?wall, "added trigger");
        Ok(id)
    }

    /// Removes a trigger and detaches it from every wall.
    ///
    /// Returns `false` if the trigger does not exist.
    pub fn remove_trigger(&mut self, id: TriggerId) -> bool {
        if self.triggers.remove(id).is_none() {
            return false;
        }
        for wall in self.walls.values_mut() {
            if wall.trigger == Some(id) {
                wall.trigger = None;
            }
        }
        debug!(?id, "removed trigger");
        true
    }

    /// Appends a target side to a trigger.
    ///
    /// # Errors
    ///
    /// Returns an error if the trigger or the target segment does not exist.
    pub fn add_trigger_target(&mut self, id: TriggerId, target: Tag) -> Result<()> {
        self.segment(target.segment)?;
        let trigger = self.trigger_mut(id)?;
        if !trigger.targets.contains(&target) {
            trigger.targets.push(target);
        }
        Ok(())
    }

    /// Drops every trigger target on `segment`. Returns the number dropped.
    pub(crate) fn forget_trigger_targets(&mut self, segment: SegmentId) -> usize {
        let mut dropped = 0;
        for trigger in self.triggers.values_mut() {
            let before = trigger.targets.len();
            trigger.targets.retain(|t| t.segment != segment);
            dropped += before - trigger.targets.len();
        }
        dropped
    }

    /// Returns a reference to the trigger, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the level.
    pub fn trigger(&self, id: TriggerId) -> Result<&Trigger> {
        Ok(self
            .triggers
            .get(id)
            .ok_or(TopologyError::EntityNotFound("trigger"))?)
    }

    /// Returns a mutable reference to the trigger, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the level.
    pub fn trigger_mut(&mut self, id: TriggerId) -> Result<&mut Trigger> {
        Ok(self
            .triggers
            .get_mut(id)
            .ok_or(TopologyError::EntityNotFound("trigger"))?)
    }

    /// Iterates over all triggers.
    pub fn triggers(&self) -> impl Iterator<Item = (TriggerId, &Trigger)> {
        self.triggers.iter()
    }

    /// Number of triggers in the level.
    #[must_use]
    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }
}
