use tracing::{debug, instrument};

use crate::error::{Result, TopologyError};
use crate::topology::{Level, Tag};

/// What happens to walls on the two sides of a broken connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WallPolicy {
    /// Remove the walls on both sides.
    #[default]
    Remove,
    /// Leave the walls for the caller to re-home or clean up.
    Keep,
}

/// Breaks the connection on a side and on its paired side.
pub struct Disconnect {
    tag: Tag,
    walls: WallPolicy,
}

impl Disconnect {
    /// Creates a new `Disconnect` operation that removes walls on both sides.
    #[must_use]
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            walls: WallPolicy::Remove,
        }
    }

    /// Sets how walls on the two sides are treated.
    #[must_use]
    pub fn with_walls(mut self, walls: WallPolicy) -> Self {
        self.walls = walls;
        self
    }

    /// Executes the operation, returning the side that used to pair with `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the side does not exist or has no connection.
    #[instrument(skip_all, fields(tag = %self.tag))]
    pub fn execute(&self, level: &mut Level) -> Result<Option<Tag>> {
        let segment = level.segment(self.tag.segment)?;
        if segment.connection(self.tag.side).is_none() {
            return Err(TopologyError::SideNotConnected(self.tag).into());
        }
        let paired = level.find_paired_side(self.tag);

        if self.walls == WallPolicy::Remove {
            level.remove_wall_at(self.tag);
            if let Some(paired) = paired {
                level.remove_wall_at(paired);
            }
        }
        level.segment_mut(self.tag.segment)?.connections[self.tag.side.index()] = None;
        if let Some(paired) = paired {
            level.segment_mut(paired.segment)?.connections[paired.side.index()] = None;
        }
        debug!(paired = ?paired.map(|t| t.to_string()), "disconnected");
        Ok(paired)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{assert_valid, two_cubes};
    use crate::topology::{SideId, TextureId, WallFlags, WallKind};

    #[test]
    fn clears_both_directions_and_walls() {
        let (mut level, a, b) = two_cubes();
        let back = Tag::new(a, SideId::Back);
        let front = Tag::new(b, SideId::Front);
        level.add_wall(back, WallKind::Illusion, TextureId(3), None, WallFlags::default()).unwrap();
        level.add_wall(front, WallKind::Door, TextureId(4), None, WallFlags::default()).unwrap();

        let paired = Disconnect::new(back).execute(&mut level).unwrap();
        assert_eq!(paired, Some(front));
        assert_eq!(level.segment(a).unwrap().connection(SideId::Back), None);
        assert_eq!(level.segment(b).unwrap().connection(SideId::Front), None);
        assert_eq!(level.wall_count(), 0);
        assert_valid(&level);
    }

    #[test]
    fn keeps_walls_when_asked() {
        let (mut level, a, _) = two_cubes();
        let back = Tag::new(a, SideId::Back);
        level.add_wall(back, WallKind::Closed, TextureId(3), None, WallFlags::default()).unwrap();
        Disconnect::new(back)
            .with_walls(WallPolicy::Keep)
            .execute(&mut level)
            .unwrap();
        assert_eq!(level.wall_count(), 1);
    }

    #[test]
    fn open_side_is_an_error() {
        let (mut level, a, _) = two_cubes();
        assert!(Disconnect::new(Tag::new(a, SideId::Top)).execute(&mut level).is_err());
    }
}
