//! Editing session: runs named commands against a level and keeps the
//! outside world informed.

use tracing::{info, instrument, warn};

use crate::error::{LevelError, Result};
use crate::math::{Point3, Vector3};
use crate::operations::clipboard::{
    Clipboard, CopySegments, MirrorClipboard, PasteReport, PasteSegments,
};
use crate::operations::creation::{ExtrudeDrag, ExtrudeSides, InsertMode, InsertSegment};
use crate::operations::join::{BridgeSides, JoinSides};
use crate::operations::modification::{
    DeleteSegment, DetachSegment, DetachSide, MergeSegments, SplitPattern, SplitSegment,
};
use crate::operations::query::ValidateLevel;
use crate::topology::{Level, ObjectId, SegmentId, Tag, TextureId, VertexId};

/// Callbacks into the collaborators around the editing core.
///
/// Every method has an empty default. The level passed to the history
/// callbacks is always consistent.
pub trait EditorHooks {
    /// Called before a command touches the level.
    fn before_command(&mut self, _name: &str, _level: &Level) {}

    /// Called after a command completed successfully.
    fn after_command(&mut self, _name: &str, _level: &Level) {}

    /// Called instead of [`after_command`](Self::after_command) when a command failed.
    fn command_failed(&mut self, _name: &str, _error: &LevelError) {}

    /// Asks the renderer to load a texture. Fire and forget.
    fn ensure_texture_resident(&mut self, _texture: TextureId) {}

    /// Fired once per successful command.
    fn level_changed(&mut self) {}

    /// Fired once per successful command that assigned textures.
    fn textures_changed(&mut self) {}
}

/// Hooks that ignore every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl EditorHooks for NoHooks {}

/// In-progress tunnel between two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunnelBuilder {
    pub start: Tag,
    pub end: Option<Tag>,
}

/// What the user has selected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub segments: Vec<SegmentId>,
    pub sides: Vec<Tag>,
    pub points: Vec<VertexId>,
    pub objects: Vec<ObjectId>,
    pub tunnel: Option<TunnelBuilder>,
}

impl Selection {
    /// Drops every entry whose key no longer resolves. Returns how many were dropped.
    pub fn purge(&mut self, level: &Level) -> usize {
        let before = self.len();
        self.segments.retain(|id| level.contains_segment(*id));
        self.sides.retain(|tag| level.contains_segment(tag.segment));
        self.points.retain(|id| level.contains_vertex(*id));
        self.objects.retain(|id| level.object(*id).is_ok());
        let stale_tunnel = self.tunnel.is_some_and(|t| {
            !level.contains_segment(t.start.segment)
                || t.end.is_some_and(|end| !level.contains_segment(end.segment))
        });
        if stale_tunnel {
            self.tunnel = None;
        }
        before - self.len() + usize::from(stale_tunnel)
    }

    fn len(&self) -> usize {
        self.segments.len() + self.sides.len() + self.points.len() + self.objects.len()
    }

    /// Returns `true` if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.tunnel.is_none()
    }
}

/// An editing session over one level.
pub struct Editor<H: EditorHooks = NoHooks> {
    level: Level,
    selection: Selection,
    hooks: H,
}

impl<H: EditorHooks> Editor<H> {
    /// Starts a session.
    pub fn new(level: Level, hooks: H) -> Self {
        Self {
            level,
            selection: Selection::default(),
            hooks,
        }
    }

    #[must_use]
    pub fn level(&self) -> &Level {
        &self.level
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    #[must_use]
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    /// Ends the session and returns the level.
    pub fn into_level(self) -> Level {
        self.level
    }

    /// Runs one named command.
    ///
    /// Queued texture requests are forwarded, stale selection entries are
    /// dropped, and listeners hear about the change exactly once.
    ///
    /// # Errors
    ///
    /// Returns the command's error. Commands leave the level untouched when
    /// they fail, so no change event is sent.
    #[instrument(skip(self, command))]
    pub fn run<T>(
        &mut self,
        name: &str,
        command: impl FnOnce(&mut Level, &mut Selection) -> Result<T>,
    ) -> Result<T> {
        self.hooks.before_command(name, &self.level);
        let result = command(&mut self.level, &mut self.selection);

        let textures = self.level.take_texture_requests();
        for texture in &textures {
            self.hooks.ensure_texture_resident(*texture);
        }
        self.selection.purge(&self.level);

        match &result {
            Ok(_) => {
                debug_assert!(
                    ValidateLevel::new().execute(&self.level).is_empty(),
                    "command {name} left the level inconsistent: {:?}",
                    ValidateLevel::new().execute(&self.level)
                );
                self.hooks.level_changed();
                if !textures.is_empty() {
                    self.hooks.textures_changed();
                }
                self.hooks.after_command(name, &self.level);
                info!(segments = self.level.segment_count(), "command completed");
            }
            Err(err) => {
                warn!(%err, "command failed");
                self.hooks.command_failed(name, err);
            }
        }
        result
    }

    /// Inserts a segment on a side and selects it.
    ///
    /// # Errors
    ///
    /// See [`InsertSegment::execute`].
    pub fn insert_segment(&mut self, tag: Tag, mode: InsertMode) -> Result<SegmentId> {
        self.run("insert segment", |level, selection| {
            let id = InsertSegment::new(tag, mode).execute(level)?;
            selection.segments = vec![id];
            Ok(id)
        })
    }

    /// Extrudes sides and returns the drag handle for the new far sides.
    ///
    /// # Errors
    ///
    /// See [`ExtrudeSides::execute`].
    pub fn extrude(&mut self, tags: Vec<Tag>, offset: Vector3) -> Result<ExtrudeDrag> {
        self.run("extrude sides", |level, selection| {
            let drag = ExtrudeSides::new(tags, offset).execute(level)?;
            selection.sides = drag.sides().to_vec();
            Ok(drag)
        })
    }

    /// Moves an extrusion's far sides to `offset` for one drag frame.
    ///
    /// Frames do not emit change events; release the drag with
    /// [`finish_drag`](Self::finish_drag).
    ///
    /// # Errors
    ///
    /// See [`ExtrudeDrag::apply`].
    pub fn drag(&mut self, drag: &ExtrudeDrag, offset: Vector3) -> Result<()> {
        drag.apply(&mut self.level, offset)
    }

    /// Places the far sides at their final offset and commits the drag.
    ///
    /// # Errors
    ///
    /// See [`ExtrudeDrag::apply`].
    pub fn finish_drag(&mut self, drag: &ExtrudeDrag, offset: Vector3) -> Result<()> {
        self.run("drag extrusion", |level, selection| {
            drag.apply(level, offset)?;
            selection.sides = drag.sides().to_vec();
            Ok(())
        })
    }

    /// Fills the gap between two open sides with a new segment.
    ///
    /// # Errors
    ///
    /// See [`BridgeSides::execute`].
    pub fn bridge(&mut self, from: Tag, to: Tag) -> Result<SegmentId> {
        self.run("bridge sides", |level, selection| {
            let id = BridgeSides::new(from, to).execute(level)?;
            selection.segments = vec![id];
            Ok(id)
        })
    }

    /// Absorbs a connected neighbour into `keep`.
    ///
    /// # Errors
    ///
    /// See [`MergeSegments::execute`].
    pub fn merge(&mut self, keep: SegmentId, absorb: SegmentId) -> Result<()> {
        self.run("merge segments", |level, selection| {
            MergeSegments::new(keep, absorb).execute(level)?;
            selection.segments = vec![keep];
            Ok(())
        })
    }

    /// Cuts a segment loose from all its neighbours.
    ///
    /// # Errors
    ///
    /// See [`DetachSegment::execute`].
    pub fn detach_segment(&mut self, segment: SegmentId) -> Result<Vec<Tag>> {
        self.run("detach segment", |level, _| DetachSegment::new(segment).execute(level))
    }

    /// Breaks the connection on one side.
    ///
    /// # Errors
    ///
    /// See [`DetachSide::execute`].
    pub fn detach_side(&mut self, tag: Tag) -> Result<Option<Tag>> {
        self.run("detach side", |level, _| DetachSide::new(tag).execute(level))
    }

    /// Joins one open side onto another.
    ///
    /// # Errors
    ///
    /// See [`JoinSides::execute`].
    pub fn join(&mut self, moving: Tag, target: Tag) -> Result<()> {
        self.run("join sides", |level, _| JoinSides::new(moving, target).execute(level))
    }

    /// Splits a segment and selects the pieces.
    ///
    /// # Errors
    ///
    /// See [`SplitSegment::execute`].
    pub fn split(&mut self, segment: SegmentId, pattern: SplitPattern) -> Result<Vec<SegmentId>> {
        self.run("split segment", |level, selection| {
            let ids = SplitSegment::new(segment, pattern).execute(level)?;
            selection.segments.clone_from(&ids);
            Ok(ids)
        })
    }

    /// Deletes a segment.
    ///
    /// # Errors
    ///
    /// See [`DeleteSegment::execute`].
    pub fn delete_segment(&mut self, segment: SegmentId) -> Result<()> {
        self.run("delete segment", |level, _| DeleteSegment::new(segment).execute(level))
    }

    /// Copies the selected segments.
    ///
    /// # Errors
    ///
    /// See [`CopySegments::execute`].
    pub fn copy_selection(&self) -> Result<Clipboard> {
        CopySegments::new(self.selection.segments.clone()).execute(&self.level)
    }

    /// Pastes a clipboard and selects the pasted segments.
    ///
    /// # Errors
    ///
    /// See [`PasteSegments::execute`].
    pub fn paste(&mut self, clipboard: &Clipboard, offset: Vector3) -> Result<PasteReport> {
        self.run("paste segments", |level, selection| {
            let report = PasteSegments::new(clipboard).with_offset(offset).execute(level)?;
            selection.segments.clone_from(&report.segments);
            Ok(report)
        })
    }

    /// Pastes a clipboard reflected across a plane.
    ///
    /// The clipboard itself is left as it was.
    ///
    /// # Errors
    ///
    /// See [`MirrorClipboard::execute`] and [`PasteSegments::execute`].
    pub fn paste_mirrored(
        &mut self,
        clipboard: &Clipboard,
        plane_origin: Point3,
        plane_normal: Vector3,
        offset: Vector3,
    ) -> Result<PasteReport> {
        let mut mirrored = clipboard.clone();
        MirrorClipboard::new(plane_origin, plane_normal).execute(&mut mirrored)?;
        self.paste(&mirrored, offset)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{one_cube, v};
    use crate::topology::SideId;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        textures: Vec<TextureId>,
    }

    impl EditorHooks for Recorder {
        fn before_command(&mut self, name: &str, _level: &Level) {
            self.events.push(format!("before {name}"));
        }
        fn after_command(&mut self, name: &str, _level: &Level) {
            self.events.push(format!("after {name}"));
        }
        fn command_failed(&mut self, name: &str, _error: &LevelError) {
            self.events.push(format!("failed {name}"));
        }
        fn ensure_texture_resident(&mut self, texture: TextureId) {
            self.textures.push(texture);
        }
        fn level_changed(&mut self) {
            self.events.push("changed".into());
        }
        fn textures_changed(&mut self) {
            self.events.push("textures".into());
        }
    }

    fn editor() -> (Editor<Recorder>, SegmentId) {
        let (level, a) = one_cube();
        (Editor::new(level, Recorder::default()), a)
    }

    #[test]
    fn one_change_event_per_command() {
        let (mut editor, a) = editor();
        editor.level_mut_for_test().segment_mut(a).unwrap().side_mut(SideId::Left).texture = TextureId(12);
        editor.insert_segment(Tag::new(a, SideId::Front), InsertMode::Normal).unwrap();
        assert_eq!(
            editor.hooks().events,
            vec!["before insert segment", "changed", "textures", "after insert segment"]
        );
        assert!(editor.hooks().textures.contains(&TextureId(12)));
    }

    #[test]
    fn failed_command_sends_no_change() {
        let (mut editor, a) = editor();
        assert!(editor.delete_segment(a).is_err());
        assert_eq!(editor.hooks().events, vec!["before delete segment", "failed delete segment"]);
    }

    #[test]
    fn deletion_purges_the_selection() {
        let (mut editor, a) = editor();
        let b = editor.insert_segment(Tag::new(a, SideId::Back), InsertMode::Normal).unwrap();
        let selection = editor.selection_mut();
        selection.segments = vec![a, b];
        selection.sides = vec![Tag::new(b, SideId::Top), Tag::new(a, SideId::Top)];
        selection.tunnel = Some(TunnelBuilder {
            start: Tag::new(a, SideId::Left),
            end: Some(Tag::new(b, SideId::Back)),
        });
        editor.delete_segment(b).unwrap();
        let selection = editor.selection();
        assert_eq!(selection.segments, vec![a]);
        assert_eq!(selection.sides, vec![Tag::new(a, SideId::Top)]);
        assert_eq!(selection.tunnel, None);
    }

    #[test]
    fn drag_frames_are_silent() {
        let (mut editor, a) = editor();
        let drag = editor.extrude(vec![Tag::new(a, SideId::Front)], v(0.0, 0.0, 4.0)).unwrap();
        let events = editor.hooks().events.len();
        for step in 1..=5 {
            editor.drag(&drag, v(0.0, 0.0, f64::from(step) * 4.0)).unwrap();
        }
        assert_eq!(editor.hooks().events.len(), events);
        let far = editor.level().face(drag.sides()[0]).unwrap();
        assert!((far.center().z - 30.0).abs() < 1e-9);

        editor.finish_drag(&drag, v(0.0, 0.0, 24.0)).unwrap();
        assert_eq!(
            editor.hooks().events[events..],
            ["before drag extrusion", "changed", "after drag extrusion"]
        );
        let far = editor.level().face(drag.sides()[0]).unwrap();
        assert!((far.center().z - 34.0).abs() < 1e-9);
    }

    #[test]
    fn structural_commands_run_through_the_session() {
        let (mut editor, a) = editor();
        let c = editor.level_mut_for_test().add_cube(Point3::new(0.0, 0.0, 60.0), 20.0).unwrap();
        let b = editor.bridge(Tag::new(a, SideId::Front), Tag::new(c, SideId::Back)).unwrap();
        assert_eq!(editor.selection().segments, vec![b]);
        assert_eq!(editor.level().segment_count(), 3);

        let freed = editor.detach_segment(c).unwrap();
        assert_eq!(freed, vec![Tag::new(b, SideId::Front)]);
        assert_eq!(editor.level().segment(b).unwrap().connection(SideId::Front), None);

        editor.merge(a, b).unwrap();
        assert_eq!(editor.level().segment_count(), 2);
        assert_eq!(editor.selection().segments, vec![a]);
        assert_eq!(editor.hooks().events.iter().filter(|e| *e == "changed").count(), 3);
    }

    #[test]
    fn mirrored_paste_lands_across_the_plane() {
        let (mut editor, a) = editor();
        editor.selection_mut().segments = vec![a];
        let clipboard = editor.copy_selection().unwrap();
        let report = editor
            .paste_mirrored(&clipboard, Point3::new(0.0, 0.0, 30.0), v(0.0, 0.0, 1.0), Vector3::zeros())
            .unwrap();
        let center = editor.level().hexahedron(report.segments[0]).unwrap().center();
        assert!((center.z - 60.0).abs() < 1e-9);
        assert_eq!(clipboard, CopySegments::new(vec![a]).execute(editor.level()).unwrap());
    }

    #[test]
    fn copy_and_paste_through_the_session() {
        let (mut editor, a) = editor();
        editor.selection_mut().segments = vec![a];
        let clipboard = editor.copy_selection().unwrap();
        let report = editor.paste(&clipboard, v(0.0, 40.0, 0.0)).unwrap();
        assert_eq!(editor.level().segment_count(), 2);
        assert_eq!(editor.selection().segments, report.segments);
    }

    impl<H: EditorHooks> Editor<H> {
        fn level_mut_for_test(&mut self) -> &mut Level {
            &mut self.level
        }
    }
}
