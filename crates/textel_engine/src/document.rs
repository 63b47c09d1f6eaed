use crate::{Cell, CellPane, Color, Position, Region, Selection, BLACK, WHITE};

/// A width×height grid of cells plus at most one selection.
///
/// The glyph, foreground and background grids are stored column-parallel;
/// semantically they form one grid of [`Cell`]s. Every row of every grid
/// holds exactly `width` entries and there are exactly `height` rows after
/// every public operation. The grids are public: they are the sole
/// serialization surface for external codecs, which populate them directly
/// and never go through the selection or undo machinery.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Document {
    pub width: i32,
    pub height: i32,
    pub ch: Vec<Vec<char>>,
    pub fg: Vec<Vec<Color>>,
    pub bg: Vec<Vec<Color>>,
    pub selection: Option<Box<Selection>>,
}

impl Document {
    /// Creates a blank document with white background and black foreground.
    pub fn new(width: i32, height: i32) -> Self {
        Self::with_colors(width, height, WHITE, BLACK)
    }

    /// Creates a blank document filled with the given colors. Zero-sized
    /// documents are allowed (they back empty-region snapshots); callers
    /// creating an actual canvas must guard for positive dimensions.
    pub fn with_colors(width: i32, height: i32, default_bg: Color, default_fg: Color) -> Self {
        debug_assert!(width >= 0 && height >= 0, "negative document dimensions");
        let w = width.max(0) as usize;
        let h = height.max(0) as usize;
        Self {
            width,
            height,
            ch: vec![vec![' '; w]; h],
            fg: vec![vec![default_fg; w]; h],
            bg: vec![vec![default_bg; w]; h],
            selection: None,
        }
    }

    /// Replaces this document's size and contents with a full copy of
    /// `source`. Drops this document's selection; selections are never
    /// copied transitively.
    pub fn copy(&mut self, source: &Document) {
        self.width = source.width;
        self.height = source.height;
        self.ch = source.ch.clone();
        self.fg = source.fg.clone();
        self.bg = source.bg.clone();
        self.selection = None;
    }

    /// Copies a region from another document into this one.
    ///
    /// For every target cell in `target_region` (default: the shape of
    /// `source_region`, which defaults to all of `source`), the cell is
    /// overwritten iff the corresponding source cell lies inside
    /// `source_region` and the mask (indexed by target-relative
    /// coordinates) is absent or true. All other target cells are left
    /// untouched, which is what lets a masked meld affect only the polygon
    /// interior and a partially off-canvas paste affect only the overlap.
    ///
    /// Both regions must already be clamped to this document's bounds by
    /// the caller; out-of-range coordinates are a caller bug and panic as
    /// an index error.
    pub fn copy_region(&mut self, source: &Document, source_region: Option<Region>, target_region: Option<Region>, mask: Option<&[Vec<bool>]>) {
        let source_region = source_region.unwrap_or_else(|| Region::from(0, 0, source.width, source.height));
        let target_region = target_region.unwrap_or_else(|| Region::from(0, 0, source_region.size.width, source_region.size.height));
        let source_offset = source_region.offset();
        let target_offset = target_region.offset();
        for y in 0..target_region.size.height {
            for x in 0..target_region.size.width {
                if source_region.contains(x + source_offset.x, y + source_offset.y) && mask.is_none_or(|m| m[y as usize][x as usize]) {
                    let ty = (y + target_offset.y) as usize;
                    let tx = (x + target_offset.x) as usize;
                    let sy = (y + source_offset.y) as usize;
                    let sx = (x + source_offset.x) as usize;
                    self.ch[ty][tx] = source.ch[sy][sx];
                    self.fg[ty][tx] = source.fg[sy][sx];
                    self.bg[ty][tx] = source.bg[sy][sx];
                }
            }
        }
    }

    /// Resizes the document, keeping the overlapping top-left rectangle and
    /// filling new cells with the given colors. No-op if the size is
    /// unchanged. Does not preserve the selection.
    pub fn resize(&mut self, width: i32, height: i32, default_bg: Color, default_fg: Color) {
        if width == self.width && height == self.height {
            return;
        }
        let w = width.max(0) as usize;
        let h = height.max(0) as usize;
        let mut new_ch = vec![vec![' '; w]; h];
        let mut new_fg = vec![vec![default_fg; w]; h];
        let mut new_bg = vec![vec![default_bg; w]; h];
        for y in 0..height.min(self.height).max(0) as usize {
            for x in 0..width.min(self.width).max(0) as usize {
                new_ch[y][x] = self.ch[y][x];
                new_fg[y][x] = self.fg[y][x];
                new_bg[y][x] = self.bg[y][x];
            }
        }
        self.width = width;
        self.height = height;
        self.ch = new_ch;
        self.fg = new_fg;
        self.bg = new_bg;
        self.selection = None;
    }

    /// Inverts the foreground and background colors of the whole document.
    pub fn invert(&mut self) {
        self.invert_region(Region::from(0, 0, self.width, self.height));
    }

    /// Inverts the foreground and background colors in the given region.
    /// The region must lie within the document bounds.
    pub fn invert_region(&mut self, region: Region) {
        for y in region.y_range() {
            for x in region.x_range() {
                let (y, x) = (y as usize, x as usize);
                self.fg[y][x] = self.fg[y][x].invert();
                self.bg[y][x] = self.bg[y][x].invert();
            }
        }
    }

    pub fn is_in_bounds(&self, pos: impl Into<Position>) -> bool {
        let pos = pos.into();
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Writes a cell, ignoring out-of-bounds positions.
    pub fn set_cell(&mut self, pos: impl Into<Position>, cell: Cell) {
        let pos = pos.into();
        if !self.is_in_bounds(pos) {
            return;
        }
        let (y, x) = (pos.y as usize, pos.x as usize);
        self.ch[y][x] = cell.ch;
        self.fg[y][x] = cell.fg;
        self.bg[y][x] = cell.bg;
    }
}

impl CellPane for Document {
    fn get_cell(&self, pos: Position) -> Cell {
        if !self.is_in_bounds(pos) {
            return Cell::default();
        }
        let (y, x) = (pos.y as usize, pos.x as usize);
        Cell::new(self.ch[y][x], self.fg[y][x], self.bg[y][x])
    }

    fn get_width(&self) -> i32 {
        self.width
    }

    fn get_height(&self) -> i32 {
        self.height
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.ch {
            for ch in row {
                f.write_fmt(format_args!("{ch}"))?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cell;

    fn assert_rectangular(doc: &Document) {
        assert_eq!(doc.ch.len(), doc.height as usize);
        assert_eq!(doc.fg.len(), doc.height as usize);
        assert_eq!(doc.bg.len(), doc.height as usize);
        for grid_row_len in doc
            .ch
            .iter()
            .map(Vec::len)
            .chain(doc.fg.iter().map(Vec::len))
            .chain(doc.bg.iter().map(Vec::len))
        {
            assert_eq!(grid_row_len, doc.width as usize);
        }
    }

    #[test]
    fn test_new_fills_defaults() {
        let doc = Document::with_colors(4, 3, WHITE, BLACK);
        assert_rectangular(&doc);
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(doc.get_cell(Position::new(x, y)), Cell::default());
            }
        }
    }

    #[test]
    fn test_grids_stay_rectangular() {
        let mut doc = Document::new(10, 10);
        doc.resize(3, 17, WHITE, BLACK);
        assert_rectangular(&doc);
        doc.resize(25, 2, WHITE, BLACK);
        assert_rectangular(&doc);

        let other = Document::new(5, 5);
        doc.copy_region(&other, None, Some(Region::from(1, 0, 5, 2)), None);
        assert_rectangular(&doc);
        doc.copy(&other);
        assert_rectangular(&doc);
    }

    #[test]
    fn test_resize_keeps_top_left() {
        let mut doc = Document::new(4, 4);
        doc.set_cell((1, 1), Cell::from('a'));
        doc.set_cell((3, 3), Cell::from('z'));
        doc.resize(2, 2, WHITE, BLACK);
        assert_eq!(doc.get_cell(Position::new(1, 1)).ch, 'a');

        doc.resize(5, 5, Color::new(1, 2, 3), BLACK);
        assert_eq!(doc.get_cell(Position::new(1, 1)).ch, 'a');
        // 'z' was cut off by the shrink; new cells carry the new default.
        assert_eq!(doc.get_cell(Position::new(3, 3)).ch, ' ');
        assert_eq!(doc.get_cell(Position::new(4, 4)).bg, Color::new(1, 2, 3));
        assert_eq!(doc.get_cell(Position::new(1, 1)).bg, WHITE);
    }

    #[test]
    fn test_copy_region_defaults_to_full_source() {
        let mut source = Document::new(3, 2);
        source.set_cell((0, 0), Cell::from('x'));
        source.set_cell((2, 1), Cell::from('y'));

        let mut target = Document::new(3, 2);
        target.copy_region(&source, None, None, None);
        assert_eq!(target.get_cell(Position::new(0, 0)).ch, 'x');
        assert_eq!(target.get_cell(Position::new(2, 1)).ch, 'y');
    }

    #[test]
    fn test_copy_region_mask_fidelity() {
        let mut source = Document::new(2, 2);
        for y in 0..2 {
            for x in 0..2 {
                source.set_cell((x, y), Cell::from('#'));
            }
        }
        let mut target = Document::new(2, 2);
        let before = target.clone();
        let mask = vec![vec![true, false], vec![false, true]];
        target.copy_region(&source, None, None, Some(&mask));

        for y in 0..2i32 {
            for x in 0..2i32 {
                let pos = Position::new(x, y);
                if mask[y as usize][x as usize] {
                    assert_eq!(target.get_cell(pos).ch, '#');
                } else {
                    assert_eq!(target.get_cell(pos), before.get_cell(pos));
                }
            }
        }
    }

    #[test]
    fn test_copy_region_leaves_out_of_source_cells_untouched() {
        let mut source = Document::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                source.set_cell((x, y), Cell::from('#'));
            }
        }
        let mut target = Document::new(4, 4);
        // Source region covers only 2x2; the rest of the 4x4 target region
        // has no corresponding source cell and must stay blank.
        target.copy_region(&source, Some(Region::from(0, 0, 2, 2)), Some(Region::from(0, 0, 4, 4)), None);
        assert_eq!(target.get_cell(Position::new(1, 1)).ch, '#');
        assert_eq!(target.get_cell(Position::new(2, 2)).ch, ' ');
        assert_eq!(target.get_cell(Position::new(3, 0)).ch, ' ');
    }

    #[test]
    fn test_copy_drops_selection() {
        let mut doc = Document::new(4, 4);
        doc.selection = Some(Box::new(Selection::new(Region::from(0, 0, 2, 2))));
        let other = Document::new(2, 2);
        doc.copy(&other);
        assert!(doc.selection.is_none());
        assert_eq!(doc.width, 2);
    }

    #[test]
    fn test_invert_region() {
        let mut doc = Document::new(2, 2);
        doc.invert_region(Region::from(0, 0, 1, 1));
        assert_eq!(doc.get_cell(Position::new(0, 0)).bg, BLACK);
        assert_eq!(doc.get_cell(Position::new(0, 0)).fg, WHITE);
        assert_eq!(doc.get_cell(Position::new(1, 1)).bg, WHITE);
        doc.invert_region(Region::from(0, 0, 1, 1));
        assert_eq!(doc.get_cell(Position::new(0, 0)).bg, WHITE);
    }
}
