use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{OperationError, Result};
use crate::math::{Matrix3, Point3};
use crate::topology::{
    ObjectKind, SegmentKind, Side, SideId, TriggerKind, WallFlags, WallKind, SIDE_CORNERS,
};

/// A side addressed inside a clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipTag {
    pub segment: usize,
    pub side: SideId,
}

/// A copied segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipSegment {
    /// Indices into [`Clipboard::vertices`], in segment corner order.
    pub vertices: [usize; 8],
    /// Surface data per side. Walls are carried separately.
    pub sides: [Side; 6],
    /// Neighbour per side, as an index into [`Clipboard::segments`].
    /// Connections leaving the copy are `None`.
    pub connections: [Option<usize>; 6],
    pub kind: SegmentKind,
}

/// A copied wall. Its textures travel with the side it sits on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipWall {
    pub tag: ClipTag,
    pub kind: WallKind,
    pub flags: WallFlags,
    /// Index into [`Clipboard::triggers`]. Several walls may share one.
    pub trigger: Option<usize>,
}

/// A copied trigger. Targets outside the copy are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipTrigger {
    pub kind: TriggerKind,
    pub flags: u16,
    pub value: f64,
    pub targets: Vec<ClipTag>,
}

/// A copied matcen, bound to a segment of kind [`SegmentKind::Matcen`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipMatcen {
    pub segment: usize,
    pub robot_flags: [u32; 2],
}

/// A copied object, positioned in world space before any paste offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipObject {
    pub kind: ObjectKind,
    pub subtype: u8,
    pub segment: usize,
    pub position: Point3,
    pub orientation: Matrix3,
}

/// A detached group of segments with everything they own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clipboard {
    pub vertices: Vec<Point3>,
    pub segments: Vec<ClipSegment>,
    pub walls: Vec<ClipWall>,
    pub triggers: Vec<ClipTrigger>,
    pub matcens: Vec<ClipMatcen>,
    pub objects: Vec<ClipObject>,
}

impl Clipboard {
    /// Returns `true` if no segment was copied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Serializes the payload to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Payload`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self).map_err(OperationError::from)?)
    }

    /// Parses and checks a payload from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Payload`] for invalid JSON and
    /// [`OperationError::InvalidInput`] for a payload whose indices do not
    /// line up.
    pub fn from_json(json: &str) -> Result<Self> {
        let clipboard: Self = serde_json::from_str(json).map_err(OperationError::from)?;
        clipboard.connection_pairs()?;
        Ok(clipboard)
    }

    fn side_key(&self, tag: ClipTag) -> [usize; 4] {
        let segment = &self.segments[tag.segment];
        let mut key = SIDE_CORNERS[tag.side.index()].map(|c| segment.vertices[c]);
        key.sort_unstable();
        key
    }

    /// Checks every local index and returns each internal connection once,
    /// lower segment first.
    pub(crate) fn connection_pairs(&self) -> Result<Vec<(ClipTag, ClipTag)>> {
        let bad = |what: String| -> Result<Vec<(ClipTag, ClipTag)>> {
            Err(OperationError::InvalidInput(format!("clipboard {what}")).into())
        };
        let segments = self.segments.len();
        let tag_ok = |t: &ClipTag| t.segment < segments;

        for (i, segment) in self.segments.iter().enumerate() {
            if segment.vertices.iter().any(|v| *v >= self.vertices.len()) {
                return bad(format!("segment {i} uses a missing vertex"));
            }
            if segment.connections.iter().flatten().any(|n| *n >= segments || *n == i) {
                return bad(format!("segment {i} connects outside the copy"));
            }
        }
        for wall in &self.walls {
            if !tag_ok(&wall.tag) || wall.trigger.is_some_and(|t| t >= self.triggers.len()) {
                return bad("wall has a dangling index".into());
            }
            if self.segments[wall.tag.segment].connections[wall.tag.side.index()].is_none() {
                return bad("wall sits on an open side".into());
            }
        }
        let mut walled = HashSet::new();
        if !self.walls.iter().all(|w| walled.insert(w.tag)) {
            return bad("places two walls on one side".into());
        }
        if self.triggers.iter().flat_map(|t| &t.targets).any(|t| !tag_ok(t)) {
            return bad("trigger targets a missing segment".into());
        }
        if self.matcens.iter().any(|m| m.segment >= segments)
            || self.objects.iter().any(|o| o.segment >= segments)
        {
            return bad("entity sits in a missing segment".into());
        }
        let mut spawners = HashSet::new();
        for matcen in &self.matcens {
            if !spawners.insert(matcen.segment)
                || self.segments[matcen.segment].kind != SegmentKind::Matcen
            {
                return bad(format!("segment {} cannot hold its matcen", matcen.segment));
            }
        }

        let mut pairs = Vec::new();
        for (i, segment) in self.segments.iter().enumerate() {
            for side in SideId::ALL {
                let Some(j) = segment.connections[side.index()] else {
                    continue;
                };
                let a = ClipTag { segment: i, side };
                let key = self.side_key(a);
                let back = SideId::ALL.into_iter().find(|s| {
                    self.segments[j].connections[s.index()] == Some(i)
                        && self.side_key(ClipTag { segment: j, side: *s }) == key
                });
                let Some(back) = back else {
                    return bad(format!("connection {i}/{side} is one-sided"));
                };
                if i < j {
                    pairs.push((a, ClipTag { segment: j, side: back }));
                }
            }
        }
        Ok(pairs)
    }
}
