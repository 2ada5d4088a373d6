use super::segment::SegmentId;
use super::tag::Tag;

/// Light a switchable source adds to the sides it illuminates.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaLight {
    /// Side carrying the light source.
    pub source: Tag,
    /// Illuminated sides with the per-corner light added to each.
    pub affected: Vec<(Tag, [f64; 4])>,
}

impl DeltaLight {
    /// Returns `true` if the source or any affected side lies on `segment`.
    #[must_use]
    pub fn references(&self, segment: SegmentId) -> bool {
        self.source.segment == segment || self.affected.iter().any(|(t, _)| t.segment == segment)
    }

    /// Drops affected sides on `segment`. Returns `false` if the source is on it.
    pub fn forget(&mut self, segment: SegmentId) -> bool {
        self.affected.retain(|(t, _)| t.segment != segment);
        self.source.segment != segment
    }
}
