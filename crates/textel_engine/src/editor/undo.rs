use crate::{Document, EngineError, EngineResult, Region};

use super::EditSession;

/// One undoable edit, recorded as the pre-edit pixel content of the region
/// it touched.
///
/// Resize actions store the whole document state instead of a region
/// patch, because the shape itself changed. Image data from *after* the
/// edit is never stored; an action exists only for undoing, and the redo
/// counterpart is synthesized from the live document at undo time.
#[derive(Debug, Default, Clone)]
pub struct Action {
    /// Display name of the edit.
    pub name: String,
    /// The region of the document that was modified. Widened with `union`
    /// while a gesture is in progress; an explicitly empty region records
    /// an edit that touched nothing (e.g. a no-op flood fill).
    pub region: Option<Region>,
    /// Whether this action resizes the document and therefore restores a
    /// whole-document snapshot instead of a region patch.
    pub is_resize: bool,
    /// The pixel content of `region` before the edit.
    pub sub_image_before: Option<Document>,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Action {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_region(name: impl Into<String>, region: Region) -> Self {
        Action {
            name: name.into(),
            region: Some(region),
            ..Default::default()
        }
    }

    /// Re-captures `sub_image_before` over the current region.
    ///
    /// `document` must be the document state at gesture start, not the
    /// live, already-mutated document: each time the region widens the
    /// snapshot is re-sliced from the same start-of-gesture state.
    ///
    /// # Panics
    ///
    /// Panics if no region was set; widening a region-less action is a
    /// caller bug.
    pub fn update(&mut self, document: &Document) {
        let region = self.region.expect("Action::update called without a region");
        let mut sub_image = Document::new(region.size.width, region.size.height);
        sub_image.copy_region(document, Some(region), None, None);
        self.sub_image_before = Some(sub_image);
    }

    /// Applies the stored before-image back onto `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the action was never finalized (no region, or a
    /// non-empty region with no snapshot) — an invariant violation in the
    /// gesture handling, not a recoverable condition.
    pub fn undo(&mut self, target: &mut Document) -> EngineResult<()> {
        if self.is_resize {
            let before = self.sub_image_before.as_ref().ok_or(EngineError::ActionMissingSnapshot)?;
            target.copy(before);
            return Ok(());
        }
        let region = self.region.ok_or(EngineError::ActionMissingRegion)?;
        if region.is_empty() {
            // An edit that touched nothing reverts to nothing.
            return Ok(());
        }
        let before = self.sub_image_before.as_ref().ok_or(EngineError::ActionMissingSnapshot)?;
        target.copy_region(before, None, Some(region), None);
        Ok(())
    }
}

impl EditSession {
    /// Pushes a finalized action onto the undo stack. Any new edit
    /// invalidates future history, so the redo stack is cleared.
    pub(crate) fn add_action(&mut self, action: Action) {
        if !self.redos.is_empty() {
            self.redos.clear();
        }
        self.undos.push(action);
    }

    pub fn can_undo(&self) -> bool {
        !self.undos.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redos.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undos.last().map(|action| action.name.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redos.last().map(|action| action.name.as_str())
    }

    pub fn undo_stack_len(&self) -> usize {
        self.undos.len()
    }

    /// Undoes the last committed action. Before reverting, a mirror-image
    /// action over the same region is snapshotted from the current state
    /// and pushed onto the redo stack.
    pub fn undo(&mut self) {
        self.stop_action_in_progress();
        if let Some(mut action) = self.undos.pop() {
            let redo_region = if action.is_resize { Some(self.bounds()) } else { action.region };
            let mut redo_action = Action::new(format!("Undo {}", action.name));
            redo_action.region = redo_region;
            redo_action.is_resize = action.is_resize;
            redo_action.update(&self.image);
            if let Err(err) = action.undo(&mut self.image) {
                log::warn!("undo of '{}' failed: {err}", action.name);
            }
            self.redos.push(redo_action);
            let bounds = self.bounds();
            self.mark_dirty(if action.is_resize { bounds } else { redo_region.unwrap_or_default() });
        }
    }

    /// Redoes the last undone action, the mirror image of [`Self::undo`].
    pub fn redo(&mut self) {
        self.stop_action_in_progress();
        if let Some(mut action) = self.redos.pop() {
            let undo_region = if action.is_resize { Some(self.bounds()) } else { action.region };
            let mut undo_action = Action::new(action.name.clone());
            undo_action.region = undo_region;
            undo_action.is_resize = action.is_resize;
            undo_action.update(&self.image);
            if let Err(err) = action.undo(&mut self.image) {
                log::warn!("redo of '{}' failed: {err}", action.name);
            }
            self.undos.push(undo_action);
            let bounds = self.bounds();
            self.mark_dirty(if action.is_resize { bounds } else { undo_region.unwrap_or_default() });
        }
    }
}
