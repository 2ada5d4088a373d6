use tracing::{debug, instrument};

use crate::error::{OperationError, Result, TopologyError};
use crate::topology::{side_key, Level, Tag};

/// Links two open sides that share the same four vertices.
pub struct Connect {
    a: Tag,
    b: Tag,
}

impl Connect {
    /// Creates a new `Connect` operation.
    #[must_use]
    pub fn new(a: Tag, b: Tag) -> Self {
        Self { a, b }
    }

    /// Executes the operation, writing the connection on both segments.
    ///
    /// # Errors
    ///
    /// Returns an error if either side is missing or already connected, both
    /// tags address the same segment, or the sides do not share their vertices.
    #[instrument(skip_all, fields(a = %self.a, b = %self.b))]
    pub fn execute(&self, level: &mut Level) -> Result<()> {
        if self.a.segment == self.b.segment {
            return Err(
                OperationError::InvalidInput("a segment cannot connect to itself".into()).into(),
            );
        }
        let seg_a = level.segment(self.a.segment)?;
        let seg_b = level.segment(self.b.segment)?;
        for (seg, tag) in [(seg_a, self.a), (seg_b, self.b)] {
            if seg.connection(tag.side).is_some() {
                return Err(TopologyError::SideConnected(tag).into());
            }
        }
        if side_key(seg_a.side_vertices(self.a.side)) != side_key(seg_b.side_vertices(self.b.side))
        {
            return Err(TopologyError::InvalidTopology(format!(
                "sides {} and {} do not share their vertices",
                self.a, self.b
            ))
            .into());
        }

        level.segment_mut(self.a.segment)?.connections[self.a.side.index()] = Some(self.b.segment);
        level.segment_mut(self.b.segment)?.connections[self.b.side.index()] = Some(self.a.segment);
        debug!("connected");
        Ok(())
    }
}
