//! Tunable tolerances and capacity limits shared by every editing operation.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::topology::TextureId;

/// Default distance under which two vertices are considered the same point.
pub const DEFAULT_WELD_TOLERANCE: f64 = 1.0;

/// Default edge length of a freshly created segment.
pub const DEFAULT_SEGMENT_SIZE: f64 = 20.0;

/// Default dot product above which two adjacent side normals count as folded flat.
pub const DEFAULT_COPLANAR_THRESHOLD: f64 = 0.90;

/// Per-level capacity limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub segments: usize,
    pub vertices: usize,
    pub walls: usize,
    pub triggers: usize,
    pub objects: usize,
    pub matcens: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            segments: 900,
            vertices: 3600,
            walls: 254,
            triggers: 100,
            objects: 350,
            matcens: 20,
        }
    }
}

/// Editor configuration carried by a [`Level`](crate::topology::Level).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Vertices closer than this are merged by weld passes.
    pub weld_tolerance: f64,
    /// Open sides whose corners are closer than this are joined after edits.
    pub join_tolerance: f64,
    /// Edge length used when inserting a segment in normal mode.
    pub default_segment_size: f64,
    /// Adjacent side normals with a dot product at or above this are rejected.
    pub coplanar_threshold: f64,
    /// Sides with a flatness ratio at or below this are rejected.
    pub min_flatness: f64,
    /// Capacity limits.
    pub limits: Limits,
    /// Textures animated as door clips; never inherited by inserted sides.
    pub door_clip_textures: Vec<TextureId>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            weld_tolerance: DEFAULT_WELD_TOLERANCE,
            join_tolerance: DEFAULT_WELD_TOLERANCE,
            default_segment_size: DEFAULT_SEGMENT_SIZE,
            coplanar_threshold: DEFAULT_COPLANAR_THRESHOLD,
            min_flatness: 0.0,
            limits: Limits::default(),
            door_clip_textures: Vec::new(),
        }
    }
}

impl EditorConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] for invalid JSON and
    /// [`ConfigError::OutOfRange`] when a tolerance is negative or a size is
    /// not positive.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self).map_err(ConfigError::from)?)
    }

    /// Checks that every numeric setting is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] naming the first bad value.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("weld_tolerance", self.weld_tolerance, self.weld_tolerance >= 0.0),
            ("join_tolerance", self.join_tolerance, self.join_tolerance >= 0.0),
            (
                "default_segment_size",
                self.default_segment_size,
                self.default_segment_size > 0.0,
            ),
            (
                "coplanar_threshold",
                self.coplanar_threshold,
                (-1.0..=1.0).contains(&self.coplanar_threshold),
            ),
            (
                "min_flatness",
                self.min_flatness,
                (-1.0..1.0).contains(&self.min_flatness),
            ),
        ];
        for (name, value, ok) in checks {
            if !ok || !value.is_finite() {
                return Err(ConfigError::OutOfRange { name, value }.into());
            }
        }
        Ok(())
    }

    /// Returns `true` if the texture animates as a door clip.
    #[must_use]
    pub fn is_door_clip(&self, texture: TextureId) -> bool {
        self.door_clip_textures.contains(&texture)
    }
}
