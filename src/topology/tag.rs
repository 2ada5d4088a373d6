use std::fmt;

use super::segment::{SegmentId, SideId};

/// Address of one side of one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    pub segment: SegmentId,
    pub side: SideId,
}

impl Tag {
    /// Creates a new tag.
    #[must_use]
    pub fn new(segment: SegmentId, side: SideId) -> Self {
        Self { segment, side }
    }

    /// The opposite side of the same segment.
    #[must_use]
    pub fn opposite(self) -> Self {
        Self::new(self.segment, self.side.opposite())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{}", self.segment, self.side)
    }
}

/// A [`Tag`] plus a corner position `0..4` within the side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointTag {
    pub tag: Tag,
    pub corner: usize,
}

impl PointTag {
    /// Creates a new point tag; the corner wraps into `0..4`.
    #[must_use]
    pub fn new(tag: Tag, corner: usize) -> Self {
        Self {
            tag,
            corner: corner % 4,
        }
    }

    /// Index of the addressed corner within the segment's eight vertices.
    #[must_use]
    pub fn segment_corner(&self) -> usize {
        self.tag.side.corners()[self.corner]
    }
}
