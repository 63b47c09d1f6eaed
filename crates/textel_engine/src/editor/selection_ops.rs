use crate::{Document, EngineError, EngineResult, Position, Region, Selection};

use super::{Action, EditSession, Tool};

fn offset_to_text_index(width: i32, offset: Position) -> i32 {
    offset.y * width + offset.x
}

fn text_index_to_offset(width: i32, index: i32) -> Position {
    Position::new(index % width, index / width)
}

impl EditSession {
    /// Captures the document state used for the open action's undo data.
    pub(crate) fn capture_image_at_start(&mut self) {
        let mut snapshot = Document::new(self.image.width, self.image.height);
        snapshot.copy_region(&self.image, None, None, None);
        self.image_at_start = snapshot;
    }

    /// Cuts the image data under the selection out of the document and
    /// into the selection, creating an undo state. With `erase_underlying`
    /// the source cells are cleared (a move); without it they stay (a
    /// copy).
    ///
    /// # Errors
    ///
    /// Fails if there is no selection or its image was already extracted.
    pub fn extract_to_selection(&mut self, erase_underlying: bool) -> EngineResult<()> {
        let Some(mut sel) = self.image.selection.take() else {
            return Err(EngineError::NoSelection.into());
        };
        if sel.contained_image.is_some() {
            self.image.selection = Some(sel);
            return Err(EngineError::SelectionAlreadyExtracted.into());
        }

        self.capture_image_at_start();
        let mut action = Action::new(self.tool.name());

        sel.copy_from_document(&self.image);
        if erase_underlying {
            self.erase_region(sel.region, sel.mask.as_deref());
        }

        // The action covers the whole canvas: when the selection is later
        // melded, the meld implicitly extends this same undo step, and the
        // selection can land anywhere by then.
        let affected_region = self.bounds();
        action.region = Some(affected_region);
        action.update(&self.image_at_start);
        self.add_action(action);

        self.image.selection = Some(sel);
        self.mark_dirty(affected_region);
        Ok(())
    }

    /// Stamps the contained image back into the document and dissolves the
    /// selection.
    pub fn meld_selection(&mut self) {
        self.meld_or_clear_selection(true);
    }

    /// Dissolves the selection, erasing its region if nothing was cut out
    /// yet.
    pub fn clear_selection(&mut self) {
        self.meld_or_clear_selection(false);
    }

    fn meld_or_clear_selection(&mut self, meld: bool) {
        let Some(sel) = self.image.selection.take() else {
            return;
        };
        let mut meld = meld;

        let make_undo_state = if sel.textbox_mode {
            // A text box that was never typed into is discarded instead of
            // melded, so repositioning an empty box stays cheap. An edited
            // box is melded even if all its text was backspaced away.
            if !sel.textbox_edited {
                meld = false;
            }
            meld
        } else {
            // Dragging a selection already created an undo state when it
            // was cut out; a never-dragged selection being cleared, or a
            // pasted one, still needs its own.
            (sel.contained_image.is_none() && !meld) || sel.pasted
        };

        if make_undo_state {
            self.capture_image_at_start();
            self.add_action(Action::new(self.tool.name()));
        }

        let region = sel.region;
        if meld {
            sel.copy_to_document(&mut self.image);
        } else if sel.contained_image.is_none() {
            self.erase_region(region, sel.mask.as_deref());
        }
        self.mark_dirty(region);
        self.selection_drag_offset = None;
        self.selecting_text = false;

        if make_undo_state {
            let affected_region = region.intersect(&self.bounds());
            let action = self.undos.last_mut().expect("undo state was just created");
            action.region = Some(affected_region);
            action.update(&self.image_at_start);
        }
    }

    /// Positions the selection absolutely, cutting it out first if it was
    /// never dragged. Constrained so at least one row and column stay
    /// within the document; it is useless to park a selection entirely
    /// off-canvas.
    pub fn move_selection_absolute(&mut self, x: i32, y: i32) {
        if self.image.selection.is_none() {
            return;
        }
        if self.image.selection.as_ref().is_some_and(|sel| sel.contained_image.is_none()) {
            if let Err(err) = self.extract_to_selection(true) {
                log::warn!("failed to cut out selection for dragging: {err}");
                return;
            }
        }
        let (image_width, image_height) = (self.image.width, self.image.height);
        let Some(sel) = self.image.selection.as_mut() else {
            return;
        };
        let offset = Position::new(
            x.min(image_width - 1).max(1 - sel.region.size.width),
            y.min(image_height - 1).max(1 - sel.region.size.height),
        );
        let old_region = sel.region;
        sel.region = Region::new(offset, sel.region.size);
        let combined_region = old_region.union(&sel.region);
        self.mark_dirty(combined_region);
    }

    pub fn move_selection_relative(&mut self, delta_x: i32, delta_y: i32) {
        if let Some(start) = self.image.selection.as_ref().map(|sel| sel.region.start) {
            self.move_selection_absolute(start.x + delta_x, start.y + delta_y);
        }
    }

    /// Stamps a copy of the selection's image in place without dissolving
    /// the selection (Ctrl-dragging leaves a trail of stamps).
    pub fn stamp_selection(&mut self) {
        let Some(mut sel) = self.image.selection.take() else {
            return;
        };
        if sel.contained_image.is_some() {
            if sel.pasted {
                // A pasted selection has no undo state yet; stamping is
                // the first time it touches the document.
                sel.pasted = false;
                let mut action = Action::new("Paste");
                action.region = Some(self.bounds());
                action.update(&self.image);
                self.add_action(action);
            }
            sel.copy_to_document(&mut self.image);
        }
        self.image.selection = Some(sel);
    }

    /// Selects the whole canvas, or all text when editing a text box.
    pub fn select_all(&mut self) {
        let in_textbox = self.image.selection.as_ref().is_some_and(|sel| sel.textbox_mode);
        if in_textbox {
            self.textbox_select_all();
            return;
        }
        self.stop_action_in_progress();
        let bounds = self.bounds();
        self.image.selection = Some(Box::new(Selection::new(bounds)));
        self.tool = Tool::Select;
        self.mark_dirty(bounds);
    }

    /// Places `image` as a floating pasted selection with its top-left at
    /// `pos` (clamped onto the canvas) and switches to the Select tool.
    /// The undo state is created when the paste first touches the
    /// document, at meld or stamp time.
    pub fn paste_image(&mut self, mut image: Document, pos: impl Into<Position>) {
        self.stop_action_in_progress();
        let pos = pos.into();
        let x = pos.x.min(self.image.width - 1).max(0);
        let y = pos.y.min(self.image.height - 1).max(0);

        // A selection's contained image never nests a selection.
        image.selection = None;

        let region = Region::from(x, y, image.width, image.height);
        let mut sel = Selection::new(region);
        sel.contained_image = Some(image);
        sel.pasted = true;
        self.image.selection = Some(Box::new(sel));
        self.tool = Tool::Select;
        self.mark_dirty(region);
    }

    /// Types one character at the text cursor, advancing and wrapping it.
    pub fn type_char(&mut self, ch: char) {
        let Some(sel) = self.image.selection.as_mut() else {
            return;
        };
        if !sel.textbox_mode {
            return;
        }
        let Some(image) = sel.contained_image.as_mut() else {
            return;
        };
        if image.width <= 0 || image.height <= 0 {
            return;
        }
        let Position { mut x, mut y } = sel.text_selection_end;
        image.ch[y as usize][x as usize] = ch;
        x += 1;
        if x >= image.width {
            x = 0;
            y += 1;
            if y >= image.height {
                y = image.height - 1;
                x = image.width - 1;
            }
        }
        sel.textbox_edited = true;
        sel.text_selection_start = Position::new(x, y);
        sel.text_selection_end = Position::new(x, y);
        let region = sel.region;
        self.mark_dirty(region);
    }

    /// Deletes backwards from the cursor, or deletes the selected text
    /// range.
    pub fn textbox_backspace(&mut self) {
        let Some(sel) = self.image.selection.as_mut() else {
            return;
        };
        if !sel.textbox_mode {
            return;
        }
        let Some(image) = sel.contained_image.as_mut() else {
            return;
        };
        if image.width <= 0 || image.height <= 0 {
            return;
        }
        if sel.text_selection_start == sel.text_selection_end {
            let Position { mut x, y } = sel.text_selection_end;
            x = (x - 1).max(0);
            image.ch[y as usize][x as usize] = ' ';
            sel.text_selection_start = Position::new(x, y);
            sel.text_selection_end = Position::new(x, y);
        } else {
            Self::delete_selected_text(sel);
        }
        sel.textbox_edited = true;
        let region = sel.region;
        self.mark_dirty(region);
    }

    /// Deletes the character under the cursor, or the selected text range.
    pub fn textbox_delete(&mut self) {
        let Some(sel) = self.image.selection.as_mut() else {
            return;
        };
        if !sel.textbox_mode {
            return;
        }
        let Some(image) = sel.contained_image.as_mut() else {
            return;
        };
        if image.width <= 0 || image.height <= 0 {
            return;
        }
        if sel.text_selection_start == sel.text_selection_end {
            let Position { mut x, y } = sel.text_selection_end;
            image.ch[y as usize][x as usize] = ' ';
            x = (x + 1).min(image.width - 1);
            sel.text_selection_start = Position::new(x, y);
            sel.text_selection_end = Position::new(x, y);
        } else {
            Self::delete_selected_text(sel);
        }
        sel.textbox_edited = true;
        let region = sel.region;
        self.mark_dirty(region);
    }

    /// Selects all text in the text box.
    pub fn textbox_select_all(&mut self) {
        let Some(sel) = self.image.selection.as_mut() else {
            return;
        };
        if !sel.textbox_mode {
            return;
        }
        let Some(image) = sel.contained_image.as_ref() else {
            return;
        };
        if image.width <= 0 || image.height <= 0 {
            return;
        }
        sel.text_selection_start = Position::new(0, 0);
        sel.text_selection_end = Position::new(image.width - 1, image.height - 1);
        let region = sel.region;
        self.mark_dirty(region);
    }

    /// Blanks the selected text range (reading order between the two
    /// cursor ends) and collapses the cursor to its start.
    fn delete_selected_text(sel: &mut Selection) {
        let image = sel.contained_image.as_mut().expect("text box has image data");
        let width = image.width;
        let start = offset_to_text_index(width, sel.text_selection_start);
        let end = offset_to_text_index(width, sel.text_selection_end);
        for index in start.min(end)..=start.max(end) {
            let pos = text_index_to_offset(width, index);
            image.ch[pos.y as usize][pos.x as usize] = ' ';
        }
        sel.textbox_edited = true;
        let cursor = text_index_to_offset(width, start.min(end));
        sel.text_selection_start = cursor;
        sel.text_selection_end = cursor;
    }
}
