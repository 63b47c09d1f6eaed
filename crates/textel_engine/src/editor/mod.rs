//! The editing session: owns the document, the undo/redo stacks and the
//! tool state, and turns already-decided gesture boundaries into document
//! mutations. All input decoding, rendering, zoom and timing concerns
//! (e.g. double-click detection for polygons) live outside; callers hand
//! this layer integer cell coordinates and explicit calls.

mod undo;
pub use undo::*;

mod tools;
pub use tools::*;

mod selection_ops;

use crate::{Color, Document, EngineError, EngineResult, Position, Region, BLACK, WHITE};

pub struct EditSession {
    image: Document,
    /// Snapshot of the document at gesture start; undo data for the open
    /// action is always re-sliced from here, never from the live image.
    image_at_start: Document,

    undos: Vec<Action>,
    redos: Vec<Action>,
    /// At most one uncommitted preview exists at a time. It is fully
    /// reverted before any real edit and never reaches the undo stack.
    preview_action: Option<Action>,

    tool: Tool,
    glyph: char,
    fg: Color,
    bg: Color,

    tool_points: Vec<Position>,
    mouse_at_start: Position,
    mouse_previous: Position,
    selection_drag_offset: Option<Position>,
    selecting_text: bool,
    color_eraser_mode: bool,
    gesture_cancelled: bool,

    dirty: Option<Region>,
}

impl EditSession {
    /// Creates a session with a blank white canvas.
    ///
    /// # Errors
    ///
    /// Fails on non-positive dimensions.
    pub fn new(width: i32, height: i32) -> EngineResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(EngineError::InvalidCanvasSize { width, height }.into());
        }
        Ok(Self::from_document(Document::new(width, height)))
    }

    pub fn from_document(image: Document) -> Self {
        Self {
            image,
            image_at_start: Document::new(0, 0),
            undos: Vec::new(),
            redos: Vec::new(),
            preview_action: None,
            tool: Tool::Pencil,
            glyph: ' ',
            fg: BLACK,
            bg: WHITE,
            tool_points: Vec::new(),
            mouse_at_start: Position::default(),
            mouse_previous: Position::default(),
            selection_drag_offset: None,
            selecting_text: false,
            color_eraser_mode: false,
            gesture_cancelled: false,
            dirty: None,
        }
    }

    /// Replaces the canvas with a blank document, discarding all edit
    /// history and preview state.
    ///
    /// # Errors
    ///
    /// Fails on non-positive dimensions.
    pub fn new_document(&mut self, width: i32, height: i32) -> EngineResult<()> {
        if width <= 0 || height <= 0 {
            return Err(EngineError::InvalidCanvasSize { width, height }.into());
        }
        self.image = Document::new(width, height);
        self.undos.clear();
        self.redos.clear();
        self.preview_action = None;
        self.tool_points.clear();
        self.selection_drag_offset = None;
        self.selecting_text = false;
        let bounds = self.bounds();
        self.mark_dirty(bounds);
        Ok(())
    }

    pub fn get_image(&self) -> &Document {
        &self.image
    }

    /// Mutable access to the document, for codecs populating the grids
    /// directly. Writes through here bypass the action machinery and are
    /// not undoable.
    pub fn get_image_mut(&mut self) -> &mut Document {
        &mut self.image
    }

    pub fn get_tool(&self) -> Tool {
        self.tool
    }

    /// Switches tools. Ends the activity of the previous tool: the preview
    /// is reverted and any selection (including a text box) is melded.
    pub fn set_tool(&mut self, tool: Tool) {
        self.stop_action_in_progress();
        self.tool = tool;
    }

    pub fn get_glyph(&self) -> char {
        self.glyph
    }

    pub fn set_glyph(&mut self, glyph: char) {
        self.glyph = glyph;
    }

    pub fn get_foreground(&self) -> Color {
        self.fg
    }

    pub fn set_foreground(&mut self, color: Color) {
        self.fg = color;
    }

    pub fn get_background(&self) -> Color {
        self.bg
    }

    pub fn set_background(&mut self, color: Color) {
        self.bg = color;
    }

    pub fn get_selection(&self) -> Option<&crate::Selection> {
        self.image.selection.as_deref()
    }

    pub fn has_preview(&self) -> bool {
        self.preview_action.is_some()
    }

    pub(crate) fn bounds(&self) -> Region {
        Region::from(0, 0, self.image.width, self.image.height)
    }

    /// Takes the accumulated region needing redraw, if any. The rendering
    /// layer drains this after every call into the session.
    pub fn take_dirty(&mut self) -> Option<Region> {
        self.dirty.take()
    }

    pub(crate) fn mark_dirty(&mut self, region: Region) {
        self.dirty = Some(match self.dirty {
            Some(dirty) => dirty.union(&region),
            None => region,
        });
    }

    /// Reverts the current preview, restoring the exact pixel state its
    /// region had before the preview was drawn.
    pub fn cancel_preview(&mut self) {
        if let Some(mut preview) = self.preview_action.take() {
            if let Err(err) = preview.undo(&mut self.image) {
                log::warn!("failed to revert preview: {err}");
            }
            if let Some(region) = preview.region {
                self.mark_dirty(region);
            }
        }
    }

    /// Previews the result of a draw operation through a temporary action
    /// that is reverted rather than committed.
    pub(crate) fn make_preview<F: FnOnce(&mut Self) -> Region>(&mut self, draw: F) {
        self.cancel_preview();
        let mut image_before = Document::new(self.image.width, self.image.height);
        image_before.copy_region(&self.image, None, None, None);
        let affected_region = draw(self);
        let mut preview = Action::new(self.tool.name());
        preview.region = Some(affected_region.intersect(&self.bounds()));
        preview.update(&image_before);
        self.preview_action = Some(preview);
        self.mark_dirty(affected_region);
    }

    /// Ends the current tool activity: reverts the preview, melds any
    /// selection, forgets accumulated shape points and ignores the rest of
    /// the gesture.
    pub fn cancel_gesture(&mut self) {
        self.stop_action_in_progress();
    }

    pub(crate) fn stop_action_in_progress(&mut self) {
        self.cancel_preview();
        self.meld_selection();
        self.tool_points.clear();
        self.gesture_cancelled = true;
    }

    /// Resizes the document as an undoable step. Because the shape itself
    /// changes, the action snapshots the whole document rather than a
    /// region patch. An undo step is created even when the size is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Fails on non-positive dimensions.
    pub fn resize_document(&mut self, width: i32, height: i32) -> EngineResult<()> {
        if width <= 0 || height <= 0 {
            return Err(EngineError::InvalidCanvasSize { width, height }.into());
        }
        self.cancel_preview();

        let mut action = Action::new("Attributes");
        action.region = Some(self.bounds());
        action.is_resize = true;
        action.update(&self.image);
        self.add_action(action);

        self.image.resize(width, height, self.bg, self.fg);
        let bounds = self.bounds();
        self.mark_dirty(bounds);
        Ok(())
    }
}
