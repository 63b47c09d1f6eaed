use std::collections::HashSet;

use crate::paint::{bezier_curve_walk, flood_fill, line_walk, midpoint_ellipse, point_in_polygon, polygon_walk, polyline_walk, quadratic_curve_walk};
use crate::{Cell, Document, Position, Region, Selection, BLACK, WHITE};

use super::{Action, EditSession};

/// How close two RGB channels must be for the color eraser to treat them
/// as the same color.
const COLOR_ERASER_THRESHOLD: i32 = 5;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tool {
    FreeFormSelect,
    Select,
    Eraser,
    Fill,
    Pencil,
    Brush,
    Airbrush,
    Text,
    Line,
    Curve,
    Rectangle,
    Polygon,
    Ellipse,
    RoundedRectangle,
}

impl Tool {
    pub fn name(self) -> &'static str {
        match self {
            Tool::FreeFormSelect => "Free-Form Select",
            Tool::Select => "Select",
            Tool::Eraser => "Eraser/Color Eraser",
            Tool::Fill => "Fill With Color",
            Tool::Pencil => "Pencil",
            Tool::Brush => "Brush",
            Tool::Airbrush => "Airbrush",
            Tool::Text => "Text",
            Tool::Line => "Line",
            Tool::Curve => "Curve",
            Tool::Rectangle => "Rectangle",
            Tool::Polygon => "Polygon",
            Tool::Ellipse => "Ellipse",
            Tool::RoundedRectangle => "Rounded Rectangle",
        }
    }

    fn is_select_tool(self) -> bool {
        matches!(self, Tool::Select | Tool::FreeFormSelect | Tool::Text)
    }

    fn is_stroke_tool(self) -> bool {
        matches!(self, Tool::Pencil | Tool::Brush | Tool::Eraser | Tool::Airbrush)
    }

    /// Rubber-band shapes redraw from scratch on every mouse move, so the
    /// open action is replaced rather than extended.
    fn replaces_action(self) -> bool {
        matches!(self, Tool::Line | Tool::Rectangle | Tool::Ellipse | Tool::RoundedRectangle)
    }
}

fn channels_match(a: crate::Color, b: crate::Color) -> bool {
    let (ar, ag, ab) = a.get_rgb();
    let (br, bg, bb) = b.get_rgb();
    (i32::from(ar) - i32::from(br)).abs() < COLOR_ERASER_THRESHOLD
        && (i32::from(ag) - i32::from(bg)).abs() < COLOR_ERASER_THRESHOLD
        && (i32::from(ab) - i32::from(bb)).abs() < COLOR_ERASER_THRESHOLD
}

impl EditSession {
    /// Modifies one cell according to the selected tool.
    pub(crate) fn stamp_char(&mut self, x: i32, y: i32) {
        if x >= self.image.width || y >= self.image.height || x < 0 || y < 0 {
            return;
        }
        let (yi, xi) = (y as usize, x as usize);
        let mut ch = self.glyph;
        let mut fg = self.fg;
        let mut bg = self.bg;
        if self.tool == Tool::Eraser {
            ch = ' ';
            fg = BLACK;
            bg = WHITE;
            if self.color_eraser_mode {
                // The color eraser keeps the glyph and replaces only colors
                // close to the selected foreground with the selected
                // background.
                ch = self.image.ch[yi][xi];
                let cell_fg = self.image.fg[yi][xi];
                let cell_bg = self.image.bg[yi][xi];
                fg = if channels_match(cell_fg, self.fg) { self.bg } else { cell_fg };
                bg = if channels_match(cell_bg, self.fg) { self.bg } else { cell_bg };
            }
        }
        if self.tool == Tool::Airbrush && fastrand::f64() < 0.7 {
            return;
        }
        if self.tool == Tool::FreeFormSelect {
            // The lasso preview inverts the underlying colors instead of
            // painting.
            self.image.fg[yi][xi] = self.image.fg[yi][xi].invert();
            self.image.bg[yi][xi] = self.image.bg[yi][xi].invert();
        } else {
            self.image.ch[yi][xi] = ch;
            self.image.fg[yi][xi] = fg;
            self.image.bg[yi][xi] = bg;
        }
    }

    /// Draws the current brush at the given coordinates and returns the
    /// affected region, merged into `affected_region_base` if given. Brush,
    /// airbrush and eraser stamp a diameter-3 footprint (round except for
    /// the square eraser); everything else stamps a single cell.
    pub(crate) fn stamp_brush(&mut self, x: i32, y: i32, affected_region_base: Option<Region>) -> Region {
        let square = self.tool == Tool::Eraser;
        let brush_diameter: i32 = if matches!(self.tool, Tool::Brush | Tool::Airbrush | Tool::Eraser) { 3 } else { 1 };
        if brush_diameter == 1 {
            self.stamp_char(x, y);
        } else {
            for i in 0..brush_diameter {
                for j in 0..brush_diameter {
                    if square || (i - brush_diameter / 2).pow(2) + (j - brush_diameter / 2).pow(2) <= (brush_diameter / 2).pow(2) {
                        self.stamp_char(x + i - brush_diameter / 2, y + j - brush_diameter / 2);
                    }
                }
            }
        }
        // Widen by a safety margin so the dirty extent always covers the
        // brush footprint.
        let brush_diameter = brush_diameter + 2;
        let affected_region = Region::from(x - brush_diameter / 2, y - brush_diameter / 2, brush_diameter, brush_diameter);
        match affected_region_base {
            Some(base) => base.union(&affected_region),
            None => affected_region,
        }
    }

    /// Clears the region to blank cells with default colors, honoring the
    /// free-form mask if given. Mask coordinates are relative to the
    /// region.
    pub fn erase_region(&mut self, region: Region, mask: Option<&[Vec<bool>]>) {
        for y in 0..region.size.height {
            for x in 0..region.size.width {
                if mask.is_none_or(|m| m[y as usize][x as usize]) {
                    self.image
                        .set_cell((x + region.start.x, y + region.start.y), Cell::new(' ', BLACK, WHITE));
                }
            }
        }
    }

    /// Inverts colors along the lasso polyline for the Free-Form Select
    /// preview. Each cell is inverted at most once, or re-visiting a cell
    /// would toggle it back.
    pub(crate) fn draw_current_free_form_select_polyline(&mut self) -> Region {
        let points = self.tool_points.clone();
        let mut affected_region = Region::default();
        let mut already_inverted: HashSet<Position> = HashSet::new();
        for pos in polyline_walk(&points) {
            if already_inverted.insert(pos) {
                affected_region = self.stamp_brush(pos.x, pos.y, Some(affected_region));
            }
        }
        affected_region
    }

    pub(crate) fn draw_current_polyline(&mut self) -> Region {
        let points = self.tool_points.clone();
        let mut affected_region = Region::default();
        for pos in polyline_walk(&points) {
            affected_region = self.stamp_brush(pos.x, pos.y, Some(affected_region));
        }
        affected_region
    }

    pub(crate) fn draw_current_polygon(&mut self) -> Region {
        let points = self.tool_points.clone();
        let mut affected_region = Region::default();
        for pos in polygon_walk(&points) {
            affected_region = self.stamp_brush(pos.x, pos.y, Some(affected_region));
        }
        affected_region
    }

    /// Draws the in-progress curve: a line with two points, a quadratic
    /// with three, the full cubic with four.
    pub(crate) fn draw_current_curve(&mut self) -> Region {
        let points = self.tool_points.clone();
        let cells: Vec<Position> = match points.len() {
            4 => bezier_curve_walk(
                f64::from(points[0].x),
                f64::from(points[0].y),
                f64::from(points[2].x),
                f64::from(points[2].y),
                f64::from(points[3].x),
                f64::from(points[3].y),
                f64::from(points[1].x),
                f64::from(points[1].y),
            )
            .collect(),
            3 => quadratic_curve_walk(
                f64::from(points[0].x),
                f64::from(points[0].y),
                f64::from(points[2].x),
                f64::from(points[2].y),
                f64::from(points[1].x),
                f64::from(points[1].y),
            )
            .collect(),
            2 => line_walk(points[0], points[1]).collect(),
            _ => points.clone(),
        };
        let mut affected_region = Region::default();
        for pos in cells {
            affected_region = self.stamp_brush(pos.x, pos.y, Some(affected_region));
        }
        affected_region
    }

    /// Starts a gesture. `right_button` enables the color eraser for the
    /// eraser tool; `ctrl` stamps a copy when dragging a selection and
    /// keeps the underlying cells when first cutting one out.
    pub fn tool_down(&mut self, pos: impl Into<Position>, right_button: bool, ctrl: bool) {
        let pos = pos.into();
        self.cancel_preview();
        self.gesture_cancelled = false;
        self.mouse_at_start = pos;
        self.mouse_previous = pos;
        self.color_eraser_mode = self.tool == Tool::Eraser && right_button;

        if matches!(self.tool, Tool::Curve | Tool::Polygon) {
            self.tool_points.push(pos);
            if self.tool == Tool::Curve {
                self.make_preview(Self::draw_current_curve);
            } else {
                // A polyline until the polygon is finalized.
                self.make_preview(Self::draw_current_polyline);
            }
            return;
        }

        if self.tool == Tool::FreeFormSelect {
            self.tool_points = vec![pos];
        }

        if self.tool.is_select_tool() {
            let inside_selection = self
                .image
                .selection
                .as_ref()
                .is_some_and(|sel| sel.region.contains_point(pos));
            if inside_selection {
                if self.tool == Tool::Text {
                    // Place the text cursor at the clicked cell.
                    let sel = self.image.selection.as_mut().unwrap();
                    let offset_in_textbox = pos - sel.region.start;
                    sel.text_selection_start = offset_in_textbox;
                    sel.text_selection_end = offset_in_textbox;
                    let region = sel.region;
                    self.selecting_text = true;
                    self.mark_dirty(region);
                    return;
                }
                let (start, has_image) = {
                    let sel = self.image.selection.as_ref().unwrap();
                    (sel.region.start, sel.contained_image.is_some())
                };
                self.selection_drag_offset = Some(start - pos);
                if has_image {
                    // Already cut out; optionally stamp a copy in place.
                    if ctrl {
                        self.stamp_selection();
                    }
                    return;
                }
                if let Err(err) = self.extract_to_selection(!ctrl) {
                    log::warn!("failed to extract selection: {err}");
                }
                return;
            }
            self.meld_selection();
            return;
        }

        self.capture_image_at_start();
        let mut action = Action::new(self.tool.name());

        let affected_region = match self.tool {
            Tool::Pencil | Tool::Brush => Some(self.stamp_brush(pos.x, pos.y, None)),
            Tool::Fill => flood_fill(&mut self.image, pos.x, pos.y, self.glyph, self.fg, self.bg),
            _ => None,
        };

        if let Some(affected_region) = affected_region {
            action.region = Some(affected_region.intersect(&self.bounds()));
            action.update(&self.image_at_start);
            self.mark_dirty(affected_region);
        } else {
            // Nothing drawn yet: shape tools draw on mouse move, and a
            // no-op fill still gets its undo step, following MS Paint. An
            // explicitly empty region keeps the action applicable.
            action.region = Some(Region::default());
        }
        self.add_action(action);
    }

    /// Continues a gesture.
    pub fn tool_move(&mut self, pos: impl Into<Position>) {
        let pos = pos.into();
        self.cancel_preview();
        if self.gesture_cancelled {
            return;
        }

        if self.tool == Tool::Fill {
            return;
        }

        if self.tool.is_select_tool() {
            if self.selecting_text {
                let image_size = self
                    .image
                    .selection
                    .as_ref()
                    .and_then(|sel| sel.contained_image.as_ref())
                    .map(|image| (image.width, image.height));
                if let (Some(sel), Some((width, height))) = (self.image.selection.as_mut(), image_size) {
                    let offset_in_textbox = pos - sel.region.start;
                    sel.text_selection_end = Position::new(
                        offset_in_textbox.x.clamp(0, width - 1),
                        offset_in_textbox.y.clamp(0, height - 1),
                    );
                    let region = sel.region;
                    self.mark_dirty(region);
                }
            } else if let Some(drag_offset) = self.selection_drag_offset {
                let target = drag_offset + pos;
                self.move_selection_absolute(target.x, target.y);
            } else if self.tool == Tool::FreeFormSelect {
                self.tool_points.push(pos);
                self.make_preview(Self::draw_current_free_form_select_polyline);
            }
            // Rectangular select/text region preview is a rendering
            // concern; nothing changes in the document until mouse up.
            return;
        }

        if matches!(self.tool, Tool::Curve | Tool::Polygon) {
            if self.tool_points.len() < 2 {
                self.tool_points.push(pos);
            }
            *self.tool_points.last_mut().unwrap() = pos;
            if self.tool == Tool::Curve {
                self.make_preview(Self::draw_current_curve);
            } else {
                self.make_preview(Self::draw_current_polyline);
            }
            return;
        }

        // The remaining tools extend the undo state opened on mouse down.
        assert!(!self.undos.is_empty(), "no undo state open for the current gesture");

        let replace_action = self.tool.replaces_action();
        let mut old_region: Option<Region> = None;
        if replace_action {
            let mut old_action = self.undos.pop().unwrap();
            if let Err(err) = old_action.undo(&mut self.image) {
                log::warn!("failed to revert in-progress shape: {err}");
            }
            old_region = old_action.region;
            self.undos.push(Action::new(self.tool.name()));
        }

        let mut affected_region: Option<Region> = None;
        match self.tool {
            tool if tool.is_stroke_tool() => {
                for p in line_walk(self.mouse_previous, pos) {
                    affected_region = Some(self.stamp_brush(p.x, p.y, affected_region));
                }
            }
            Tool::Line => {
                for p in line_walk(self.mouse_at_start, pos) {
                    affected_region = Some(self.stamp_brush(p.x, p.y, affected_region));
                }
            }
            Tool::Rectangle => {
                let (min_x, max_x) = (self.mouse_at_start.x.min(pos.x), self.mouse_at_start.x.max(pos.x));
                let (min_y, max_y) = (self.mouse_at_start.y.min(pos.y), self.mouse_at_start.y.max(pos.y));
                for x in min_x..=max_x {
                    for y in min_y..=max_y {
                        if x > min_x && x < max_x && y > min_y && y < max_y {
                            continue;
                        }
                        affected_region = Some(self.stamp_brush(x, y, affected_region));
                    }
                }
            }
            Tool::RoundedRectangle => {
                let (min_x, max_x) = (self.mouse_at_start.x.min(pos.x), self.mouse_at_start.x.max(pos.x));
                let (min_y, max_y) = (self.mouse_at_start.y.min(pos.y), self.mouse_at_start.y.max(pos.y));
                let arc_radius = 2.min((max_x - min_x) / 2).min((max_y - min_y) / 2);
                for p in midpoint_ellipse(0, 0, arc_radius, arc_radius) {
                    let x = if p.x < 0 { min_x + p.x + arc_radius } else { max_x + p.x - arc_radius };
                    let y = if p.y < 0 { min_y + p.y + arc_radius } else { max_y + p.y - arc_radius };
                    affected_region = Some(self.stamp_brush(x, y, affected_region));
                }
                for x in (min_x + arc_radius)..=(max_x - arc_radius) {
                    affected_region = Some(self.stamp_brush(x, min_y, affected_region));
                    affected_region = Some(self.stamp_brush(x, max_y, affected_region));
                }
                for y in (min_y + arc_radius)..=(max_y - arc_radius) {
                    affected_region = Some(self.stamp_brush(min_x, y, affected_region));
                    affected_region = Some(self.stamp_brush(max_x, y, affected_region));
                }
            }
            Tool::Ellipse => {
                let center_x = (self.mouse_at_start.x + pos.x).div_euclid(2);
                let center_y = (self.mouse_at_start.y + pos.y).div_euclid(2);
                let radius_x = (self.mouse_at_start.x - pos.x).abs() / 2;
                let radius_y = (self.mouse_at_start.y - pos.y).abs() / 2;
                for p in midpoint_ellipse(center_x, center_y, radius_x, radius_y) {
                    affected_region = Some(self.stamp_brush(p.x, p.y, affected_region));
                }
            }
            _ => unreachable!("tool {:?} handled above", self.tool),
        }

        let bounds = self.bounds();
        let action = self.undos.last_mut().unwrap();
        match (action.region, affected_region) {
            (Some(region), Some(affected)) => action.region = Some(region.union(&affected)),
            (None, Some(affected)) => action.region = Some(affected),
            _ => {}
        }
        if let Some(region) = action.region {
            action.region = Some(region.intersect(&bounds));
            action.update(&self.image_at_start);
        }

        if let Some(mut affected) = affected_region {
            if replace_action {
                if let Some(old) = old_region {
                    affected = affected.union(&old);
                }
            }
            self.mark_dirty(affected);
        }
        self.mouse_previous = pos;
    }

    /// Finishes a gesture.
    pub fn tool_up(&mut self, pos: impl Into<Position>) {
        let pos = pos.into();
        self.cancel_preview();
        self.color_eraser_mode = false;
        if self.gesture_cancelled {
            return;
        }

        if self.selection_drag_offset.is_some() {
            self.selection_drag_offset = None;
            if let Some(region) = self.image.selection.as_ref().map(|sel| sel.region) {
                self.mark_dirty(region);
            }
            return;
        }
        if self.selecting_text {
            self.selecting_text = false;
            return;
        }

        match self.tool {
            Tool::Select | Tool::FreeFormSelect | Tool::Text => {
                let select_region = if self.tool == Tool::FreeFormSelect {
                    let min = self.tool_points.iter().copied().reduce(Position::min).unwrap_or(pos);
                    let max = self.tool_points.iter().copied().reduce(Position::max).unwrap_or(pos);
                    Region::from(min.x, min.y, max.x - min.x + 1, max.y - min.y + 1).intersect(&self.bounds())
                } else {
                    self.get_select_region(self.mouse_at_start, pos)
                };
                if self.image.selection.is_some() {
                    // Shouldn't normally happen; mouse down melds first.
                    self.meld_selection();
                }
                let mut selection = Selection::new(select_region);
                selection.textbox_mode = self.tool == Tool::Text;
                if selection.textbox_mode {
                    // A fresh text box gets an image immediately, filled
                    // with the current drawing colors.
                    selection.contained_image = Some(Document::with_colors(
                        select_region.size.width,
                        select_region.size.height,
                        self.bg,
                        self.fg,
                    ));
                }
                if self.tool == Tool::FreeFormSelect {
                    let points = self.tool_points.clone();
                    selection.mask = Some(
                        (0..select_region.size.height)
                            .map(|y| {
                                (0..select_region.size.width)
                                    .map(|x| point_in_polygon(x + select_region.start.x, y + select_region.start.y, &points))
                                    .collect()
                            })
                            .collect(),
                    );
                }
                self.image.selection = Some(Box::new(selection));
                self.mark_dirty(select_region);
            }
            Tool::Curve => {
                if self.tool_points.len() >= 4 {
                    self.finalize_shape();
                } else {
                    self.make_preview(Self::draw_current_curve);
                }
            }
            Tool::Polygon => {
                // Whether to finalize (double click / closed gap) is the
                // caller's decision, via finalize_shape.
                self.make_preview(Self::draw_current_polyline);
            }
            _ => {}
        }
    }

    /// Commits a pending polygon (three or more points) or curve (two or
    /// more). The caller decides when: closing the gap or double-clicking
    /// is detected outside this layer.
    pub fn finalize_shape(&mut self) {
        self.cancel_preview();

        if !matches!(self.tool, Tool::Polygon | Tool::Curve) {
            return;
        }
        if self.tool == Tool::Polygon && self.tool_points.len() < 3 {
            return;
        }
        if self.tool == Tool::Curve && self.tool_points.len() < 2 {
            return;
        }

        self.capture_image_at_start();
        let mut action = Action::new(self.tool.name());

        let affected_region = if self.tool == Tool::Polygon {
            self.draw_current_polygon()
        } else {
            self.draw_current_curve()
        };

        action.region = Some(affected_region.intersect(&self.bounds()));
        action.update(&self.image_at_start);
        self.add_action(action);
        self.mark_dirty(affected_region);

        self.tool_points.clear();
    }

    /// Updates the hover preview for tools that show one.
    pub fn hover(&mut self, pos: impl Into<Position>) {
        let pos = pos.into();
        self.cancel_preview();
        match self.tool {
            Tool::Curve => self.make_preview(Self::draw_current_curve),
            Tool::Polygon => self.make_preview(Self::draw_current_polyline),
            Tool::Brush | Tool::Pencil | Tool::Eraser => {
                self.make_preview(|session| session.stamp_brush(pos.x, pos.y, None));
            }
            _ => {}
        }
    }

    /// The inclusive cell rectangle spanned by two gesture points, clamped
    /// to the document.
    pub(crate) fn get_select_region(&self, start: Position, end: Position) -> Region {
        let (x1, x2) = (start.x.min(end.x), start.x.max(end.x));
        let (y1, y2) = (start.y.min(end.y), start.y.max(end.y));
        Region::from(x1, y1, x2 - x1 + 1, y2 - y1 + 1).intersect(&self.bounds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellPane;

    fn session(width: i32, height: i32) -> EditSession {
        let mut session = EditSession::new(width, height).unwrap();
        session.set_glyph('#');
        session
    }

    #[test]
    fn test_pencil_stroke_walks_between_events() {
        let mut s = session(10, 10);
        s.set_tool(Tool::Pencil);
        s.tool_down((0, 0), false, false);
        // The stroke interpolates even if move events skip cells.
        s.tool_move((4, 0));
        s.tool_up((4, 0));
        for x in 0..=4 {
            assert_eq!(s.get_image().get_cell(Position::new(x, 0)).ch, '#');
        }
        assert_eq!(s.undo_stack_len(), 1);
    }

    #[test]
    fn test_brush_stamps_a_footprint() {
        let mut s = session(10, 10);
        s.set_tool(Tool::Brush);
        s.tool_down((5, 5), false, false);
        s.tool_up((5, 5));
        // Diameter-3 round footprint: plus-shape around the center.
        assert_eq!(s.get_image().get_cell(Position::new(5, 5)).ch, '#');
        assert_eq!(s.get_image().get_cell(Position::new(4, 5)).ch, '#');
        assert_eq!(s.get_image().get_cell(Position::new(5, 4)).ch, '#');
        assert_eq!(s.get_image().get_cell(Position::new(6, 5)).ch, '#');
        assert_eq!(s.get_image().get_cell(Position::new(5, 6)).ch, '#');
    }

    #[test]
    fn test_eraser_clears_to_defaults() {
        let mut s = session(5, 5);
        s.set_tool(Tool::Pencil);
        s.set_foreground(crate::Color::new(200, 0, 0));
        s.tool_down((2, 2), false, false);
        s.tool_up((2, 2));

        s.set_tool(Tool::Eraser);
        s.tool_down((2, 2), false, false);
        s.tool_move((2, 2));
        s.tool_up((2, 2));
        let cell = s.get_image().get_cell(Position::new(2, 2));
        assert_eq!(cell.ch, ' ');
        assert_eq!(cell.fg, BLACK);
        assert_eq!(cell.bg, WHITE);
    }

    #[test]
    fn test_color_eraser_replaces_only_matching_colors() {
        let red = crate::Color::new(200, 10, 10);
        let near_red = crate::Color::new(202, 12, 8);
        let blue = crate::Color::new(10, 10, 200);

        let mut s = session(6, 1);
        s.get_image_mut().ch[0] = vec!['a', 'b', 'c', 'd', 'e', 'f'];
        s.get_image_mut().fg[0][0] = near_red;
        s.get_image_mut().fg[0][1] = blue;

        s.set_tool(Tool::Eraser);
        s.set_foreground(red);
        s.set_background(WHITE);
        s.tool_down((0, 0), true, false);
        s.tool_move((5, 0));
        s.tool_up((5, 0));

        // Glyphs survive the color eraser.
        assert_eq!(s.get_image().ch[0][0], 'a');
        assert_eq!(s.get_image().ch[0][1], 'b');
        // The near-red foreground was close enough and became the
        // background color; blue was untouched.
        assert_eq!(s.get_image().fg[0][0], WHITE);
        assert_eq!(s.get_image().fg[0][1], blue);
    }

    #[test]
    fn test_line_tool_replaces_action_while_dragging() {
        let mut s = session(10, 10);
        s.set_tool(Tool::Line);
        s.tool_down((0, 0), false, false);
        s.tool_move((9, 0));
        s.tool_move((0, 9));
        s.tool_up((0, 9));

        // Only the final line remains.
        assert_eq!(s.get_image().get_cell(Position::new(9, 0)).ch, ' ');
        for y in 0..=9 {
            assert_eq!(s.get_image().get_cell(Position::new(0, y)).ch, '#');
        }
        // And it is one undo step.
        assert_eq!(s.undo_stack_len(), 1);
        s.undo();
        for y in 0..=9 {
            assert_eq!(s.get_image().get_cell(Position::new(0, y)).ch, ' ');
        }
    }

    #[test]
    fn test_rectangle_tool_draws_outline_only() {
        let mut s = session(10, 10);
        s.set_tool(Tool::Rectangle);
        s.tool_down((1, 1), false, false);
        s.tool_move((5, 5));
        s.tool_up((5, 5));
        assert_eq!(s.get_image().get_cell(Position::new(1, 3)).ch, '#');
        assert_eq!(s.get_image().get_cell(Position::new(5, 3)).ch, '#');
        assert_eq!(s.get_image().get_cell(Position::new(3, 1)).ch, '#');
        assert_eq!(s.get_image().get_cell(Position::new(3, 5)).ch, '#');
        assert_eq!(s.get_image().get_cell(Position::new(3, 3)).ch, ' ');
    }

    #[test]
    fn test_ellipse_tool_draws_midpoint_ellipse() {
        let mut s = session(20, 20);
        s.set_tool(Tool::Ellipse);
        s.tool_down((2, 5), false, false);
        s.tool_move((12, 11));
        s.tool_up((12, 11));
        // Center (7, 8), radii (5, 3): the four extremes are drawn.
        assert_eq!(s.get_image().get_cell(Position::new(2, 8)).ch, '#');
        assert_eq!(s.get_image().get_cell(Position::new(12, 8)).ch, '#');
        assert_eq!(s.get_image().get_cell(Position::new(7, 5)).ch, '#');
        assert_eq!(s.get_image().get_cell(Position::new(7, 11)).ch, '#');
        assert_eq!(s.get_image().get_cell(Position::new(7, 8)).ch, ' ');
    }

    #[test]
    fn test_fill_tool_records_noop_as_empty_undo_step() {
        let mut s = session(5, 5);
        s.set_tool(Tool::Fill);
        s.set_glyph(' ');
        s.set_foreground(BLACK);
        s.set_background(WHITE);
        let before = s.get_image().clone();
        s.tool_down((2, 2), false, false);
        s.tool_up((2, 2));
        assert_eq!(s.get_image().ch, before.ch);
        // The undo step exists, and undoing it changes nothing.
        assert_eq!(s.undo_stack_len(), 1);
        s.undo();
        assert_eq!(s.get_image().ch, before.ch);
    }

    #[test]
    fn test_fill_tool_fills_and_undoes() {
        let mut s = session(10, 10);
        s.set_tool(Tool::Fill);
        s.tool_down((5, 5), false, false);
        s.tool_up((5, 5));
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(s.get_image().get_cell(Position::new(x, y)).ch, '#');
            }
        }
        s.undo();
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(s.get_image().get_cell(Position::new(x, y)).ch, ' ');
            }
        }
    }

    #[test]
    fn test_polygon_commits_only_on_finalize() {
        let mut s = session(12, 12);
        s.set_tool(Tool::Polygon);
        s.tool_down((1, 1), false, false);
        s.tool_up((1, 1));
        s.tool_down((9, 1), false, false);
        s.tool_up((9, 1));
        s.tool_down((5, 8), false, false);
        s.tool_up((5, 8));
        // Still only previews; nothing committed.
        assert_eq!(s.undo_stack_len(), 0);

        s.finalize_shape();
        assert_eq!(s.undo_stack_len(), 1);
        assert!(!s.has_preview());
        // The closing edge from (5,8) back to (1,1) was drawn.
        let mut closing_cells = 0;
        for p in crate::paint::line_walk((5, 8), (1, 1)) {
            if s.get_image().get_cell(p).ch == '#' {
                closing_cells += 1;
            }
        }
        assert!(closing_cells > 0);
        s.undo();
        assert_eq!(s.get_image().get_cell(Position::new(1, 1)).ch, ' ');
    }

    #[test]
    fn test_curve_finalizes_on_fourth_point() {
        let mut s = session(20, 20);
        s.set_tool(Tool::Curve);
        s.tool_down((0, 10), false, false);
        s.tool_move((19, 10));
        s.tool_up((19, 10));
        s.tool_down((5, 0), false, false);
        s.tool_up((5, 0));
        assert_eq!(s.undo_stack_len(), 0);
        s.tool_down((15, 0), false, false);
        s.tool_up((15, 0));
        // Four points reached: the curve committed itself.
        assert_eq!(s.undo_stack_len(), 1);
        assert_eq!(s.get_image().get_cell(Position::new(0, 10)).ch, '#');
    }

    #[test]
    fn test_erase_region_with_mask() {
        let mut s = session(4, 2);
        for y in 0..2 {
            for x in 0..4 {
                s.get_image_mut().set_cell((x, y), Cell::from('#'));
            }
        }
        let mask = vec![vec![true, false, true, false], vec![false, true, false, true]];
        s.erase_region(Region::from(0, 0, 4, 2), Some(&mask));
        assert_eq!(s.get_image().ch[0], vec![' ', '#', ' ', '#']);
        assert_eq!(s.get_image().ch[1], vec!['#', ' ', '#', ' ']);
    }

    #[test]
    fn test_stamps_off_canvas_are_ignored() {
        let mut s = session(5, 5);
        s.set_tool(Tool::Pencil);
        s.tool_down((-3, -3), false, false);
        s.tool_move((2, 2));
        s.tool_up((2, 2));
        assert_eq!(s.get_image().get_cell(Position::new(2, 2)).ch, '#');
        s.undo();
        assert_eq!(s.get_image().get_cell(Position::new(2, 2)).ch, ' ');
    }
}
