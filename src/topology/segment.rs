use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::Point2;

use super::matcen::MatcenId;
use super::vertex::VertexId;
use super::wall::WallId;

slotmap::new_key_type! {
    /// Unique identifier for a segment in the level.
    pub struct SegmentId;
}

/// One of the six faces of a segment.
///
/// Sides are named as seen from inside the segment looking out through
/// [`Front`](SideId::Front). Opposite sides differ only in the lowest bit of
/// their index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SideId {
    Left = 0,
    Right = 1,
    Top = 2,
    Bottom = 3,
    Front = 4,
    Back = 5,
}

/// Local axis of the segment's corner lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Across `Left` / `Right`.
    U = 0,
    /// Across `Bottom` / `Top`.
    V = 1,
    /// Across `Front` / `Back`.
    W = 2,
}

/// Lattice coordinates `(u, v, w)` of each of the eight corners.
///
/// Corners `0..4` form the front quad and `4..8` the back quad, with corner
/// `c + 4` directly behind corner `c`.
pub const CORNER_LATTICE: [[u8; 3]; 8] = [
    [0, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [1, 0, 0],
    [0, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
    [1, 0, 1],
];

/// Corner indices of each side, counter-clockwise seen from outside.
pub const SIDE_CORNERS: [[usize; 4]; 6] = [
    [0, 4, 5, 1],
    [3, 2, 6, 7],
    [1, 5, 6, 2],
    [0, 3, 7, 4],
    [0, 1, 2, 3],
    [4, 7, 6, 5],
];

/// `CORNER_FLIP[axis][c]` is the corner across the lattice from `c` along `axis`.
pub const CORNER_FLIP: [[usize; 8]; 3] = [
    [3, 2, 1, 0, 7, 6, 5, 4],
    [1, 0, 3, 2, 5, 4, 7, 6],
    [4, 5, 6, 7, 0, 1, 2, 3],
];

impl SideId {
    /// All sides in index order.
    pub const ALL: [SideId; 6] = [
        SideId::Left,
        SideId::Right,
        SideId::Top,
        SideId::Bottom,
        SideId::Front,
        SideId::Back,
    ];

    /// Returns the side with the given index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Position of this side in per-side arrays.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The side facing away from this one.
    #[must_use]
    pub fn opposite(self) -> Self {
        Self::ALL[self.index() ^ 1]
    }

    /// The lattice axis this side is perpendicular to.
    #[must_use]
    pub fn axis(self) -> Axis {
        match self {
            SideId::Left | SideId::Right => Axis::U,
            SideId::Top | SideId::Bottom => Axis::V,
            SideId::Front | SideId::Back => Axis::W,
        }
    }

    /// Corner indices of this side in winding order.
    #[must_use]
    pub fn corners(self) -> [usize; 4] {
        SIDE_CORNERS[self.index()]
    }

    /// Returns `true` if the two sides share an edge.
    #[must_use]
    pub fn is_adjacent(self, other: SideId) -> bool {
        self.axis() != other.axis()
    }

    /// The four sides sharing an edge with this one.
    pub fn adjacent(self) -> impl Iterator<Item = SideId> {
        Self::ALL.into_iter().filter(move |s| self.is_adjacent(*s))
    }
}

impl fmt::Display for SideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SideId::Left => "left",
            SideId::Right => "right",
            SideId::Top => "top",
            SideId::Bottom => "bottom",
            SideId::Front => "front",
            SideId::Back => "back",
        };
        f.write_str(name)
    }
}

impl Axis {
    /// All axes in index order.
    pub const ALL: [Axis; 3] = [Axis::U, Axis::V, Axis::W];

    /// The two sides perpendicular to this axis, low side first.
    #[must_use]
    pub fn sides(self) -> (SideId, SideId) {
        match self {
            Axis::U => (SideId::Left, SideId::Right),
            Axis::V => (SideId::Bottom, SideId::Top),
            Axis::W => (SideId::Front, SideId::Back),
        }
    }

    /// Corner across the lattice from `corner` along this axis.
    #[must_use]
    pub fn flip(self, corner: usize) -> usize {
        CORNER_FLIP[self as usize][corner]
    }
}

/// Texture index into the game's texture table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TextureId(pub u16);

/// Surface data of one segment side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Side {
    /// Base texture.
    pub texture: TextureId,
    /// Overlay texture drawn on top of the base.
    pub overlay: Option<TextureId>,
    /// Texture coordinates, parallel to the side's corner order.
    pub uvs: [Point2; 4],
    /// Per-corner light values.
    pub lights: [f64; 4],
    /// Wall placed on this side, if any.
    #[serde(skip)]
    pub wall: Option<WallId>,
}

impl Default for Side {
    fn default() -> Self {
        Self {
            texture: TextureId::default(),
            overlay: None,
            uvs: [
                Point2::new(0.0, 0.0),
                Point2::new(0.0, 1.0),
                Point2::new(1.0, 1.0),
                Point2::new(1.0, 0.0),
            ],
            lights: [1.0; 4],
            wall: None,
        }
    }
}

impl Side {
    /// Copies the surface appearance of `other` without its wall.
    #[must_use]
    pub fn surface_of(other: &Side) -> Self {
        Self {
            wall: None,
            ..other.clone()
        }
    }

    /// Textures that must be resident for this side to draw.
    pub fn textures(&self) -> impl Iterator<Item = TextureId> {
        std::iter::once(self.texture).chain(self.overlay)
    }
}

/// Gameplay function of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SegmentKind {
    #[default]
    None,
    Matcen,
    Energy,
    Reactor,
}

/// A hexahedral level cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Corner vertices, addressed through [`SIDE_CORNERS`].
    pub vertices: [VertexId; 8],
    /// Per-side surface data.
    pub sides: [Side; 6],
    /// Per-side neighbour, parallel to `sides`.
    pub connections: [Option<SegmentId>; 6],
    /// Gameplay function.
    pub kind: SegmentKind,
    /// Matcen bound to this segment when `kind` is [`SegmentKind::Matcen`].
    pub matcen: Option<MatcenId>,
}

impl Segment {
    /// Creates an unconnected segment with default sides.
    #[must_use]
    pub fn new(vertices: [VertexId; 8]) -> Self {
        Self {
            vertices,
            sides: Default::default(),
            connections: [None; 6],
            kind: SegmentKind::None,
            matcen: None,
        }
    }

    /// Returns the side record.
    #[must_use]
    pub fn side(&self, side: SideId) -> &Side {
        &self.sides[side.index()]
    }

    /// Returns the side record mutably.
    pub fn side_mut(&mut self, side: SideId) -> &mut Side {
        &mut self.sides[side.index()]
    }

    /// Neighbour across `side`.
    #[must_use]
    pub fn connection(&self, side: SideId) -> Option<SegmentId> {
        self.connections[side.index()]
    }

    /// Vertex ids of `side` in winding order.
    #[must_use]
    pub fn side_vertices(&self, side: SideId) -> [VertexId; 4] {
        side.corners().map(|c| self.vertices[c])
    }

    /// Sides currently carrying a connection, with their neighbour.
    pub fn connected_sides(&self) -> impl Iterator<Item = (SideId, SegmentId)> + '_ {
        SideId::ALL
            .into_iter()
            .filter_map(|s| self.connection(s).map(|n| (s, n)))
    }

    /// Sides without a connection.
    pub fn open_sides(&self) -> impl Iterator<Item = SideId> + '_ {
        SideId::ALL
            .into_iter()
            .filter(|s| self.connection(*s).is_none())
    }

    /// Returns `true` if any corner references `vertex`.
    #[must_use]
    pub fn uses_vertex(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }
}

/// Sorted copy of a side's vertex ids, used to match coincident sides.
#[must_use]
pub fn side_key(vertices: [VertexId; 4]) -> [VertexId; 4] {
    let mut key = vertices;
    key.sort_unstable();
    key
}
