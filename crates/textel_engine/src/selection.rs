use crate::{Document, Position, Region};

/// A region of interest over a [`Document`].
///
/// When a selection is created it holds no image data; once it is dragged
/// (or pasted, or created as a text box) it gets its own cut-out copy of
/// the underlying cells. The contained image is itself a `Document`, but it
/// never holds a nested selection: nothing in the selection machinery ever
/// touches `contained_image.selection`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Selection {
    /// Placement of the selection within the outer document. May extend
    /// partially or fully outside the document bounds.
    pub region: Region,
    /// The cut-out image data. `None` until the selection is dragged,
    /// except for pasted selections and text boxes.
    pub contained_image: Option<Document>,
    /// Whether the selection was pasted, and thus still needs an undo
    /// state created for it when melding.
    pub pasted: bool,
    /// Whether this selection is a text box.
    pub textbox_mode: bool,
    /// Whether any character was ever typed into the text box. An
    /// untouched text box is discarded instead of melded.
    pub textbox_edited: bool,
    /// Start of the text cursor/selection within the contained image.
    /// May be before or after the end.
    pub text_selection_start: Position,
    /// End of the text cursor/selection within the contained image.
    pub text_selection_end: Position,
    /// Inclusion mask for free-form selections, relative to `region`;
    /// `true` where the lasso polygon covers the cell.
    pub mask: Option<Vec<Vec<bool>>>,
}

impl Selection {
    pub fn new(region: Region) -> Self {
        Selection {
            region,
            ..Default::default()
        }
    }

    /// Cuts the image data under `region` out of the document into this
    /// selection (the document cells themselves are left for the caller to
    /// erase).
    pub fn copy_from_document(&mut self, document: &Document) {
        let mut image = Document::new(self.region.size.width, self.region.size.height);
        image.copy_region(document, Some(self.region), None, None);
        self.contained_image = Some(image);
    }

    /// Melds the contained image back onto the document, respecting the
    /// free-form mask if present. A selection that is partially or fully
    /// off-canvas is silently clipped. No-op if nothing was ever cut out.
    pub fn copy_to_document(&self, document: &mut Document) {
        let Some(contained_image) = &self.contained_image else {
            return;
        };

        // Clip the target to the document and shift the source region by
        // the amount the clamp moved the target.
        let target_region = self.region.intersect(&Region::from(0, 0, document.width, document.height));
        let offset = target_region.offset() - self.region.offset();
        let source_region = Region::from(offset.x, offset.y, contained_image.width, contained_image.height);

        // The mask is indexed relative to the unclipped region, so the
        // clipped copy needs an equally shifted sub-mask. Out-of-bounds
        // samples are not selected.
        let sub_mask: Option<Vec<Vec<bool>>> = self.mask.as_ref().map(|mask| {
            (0..source_region.size.height)
                .map(|y| {
                    (0..source_region.size.width)
                        .map(|x| {
                            mask.get((y + offset.y) as usize)
                                .and_then(|row| row.get((x + offset.x) as usize))
                                .copied()
                                .unwrap_or(false)
                        })
                        .collect()
                })
                .collect()
        });

        document.copy_region(contained_image, Some(source_region), Some(target_region), sub_mask.as_deref());
    }
}
