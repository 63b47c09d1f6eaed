//! Scan conversion: turning tool gestures into sets of grid cells.
//!
//! Everything here is pure except [`flood_fill`], which mutates the
//! document it fills and reports the affected region.

use crate::{Color, Document, Position, Region};

/// Number of fixed parameter steps used to flatten bezier curves.
const CURVE_STEPS: usize = 100;

/// Lazy Bresenham walk from one cell to another, inclusive, one cell per
/// step, in path order.
pub fn line_walk(from: impl Into<Position>, to: impl Into<Position>) -> LineWalk {
    let from = from.into();
    let to = to.into();
    LineWalk {
        x: from.x,
        y: from.y,
        x1: to.x,
        y1: to.y,
        dx: (to.x - from.x).abs(),
        dy: (to.y - from.y).abs(),
        sx: if from.x < to.x { 1 } else { -1 },
        sy: if from.y < to.y { 1 } else { -1 },
        err: (to.x - from.x).abs() - (to.y - from.y).abs(),
        done: false,
    }
}

pub struct LineWalk {
    x: i32,
    y: i32,
    x1: i32,
    y1: i32,
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    err: i32,
    done: bool,
}

impl Iterator for LineWalk {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        if self.done {
            return None;
        }
        let current = Position::new(self.x, self.y);
        if self.x == self.x1 && self.y == self.y1 {
            self.done = true;
        } else {
            let e2 = 2 * self.err;
            if e2 > -self.dy {
                self.err -= self.dy;
                self.x += self.sx;
            }
            if e2 < self.dx {
                self.err += self.dx;
                self.y += self.sy;
            }
        }
        Some(current)
    }
}

/// Cells along an unclosed polyline.
pub fn polyline_walk(points: &[Position]) -> impl Iterator<Item = Position> + '_ {
    points.windows(2).flat_map(|pair| line_walk(pair[0], pair[1]))
}

/// Cells along the perimeter of a polygon, including the closing edge.
pub fn polygon_walk(points: &[Position]) -> impl Iterator<Item = Position> + '_ {
    (0..points.len()).flat_map(move |i| line_walk(points[i], points[(i + 1) % points.len()]))
}

/// Even-odd test via horizontal ray casting. For a non-horizontal edge the
/// crossing is at `(y - p1y)(p2x - p1x)/(p2y - p1y) + p1x`; the parity
/// toggles when `p1x == p2x` or `x <= x_intersection`.
pub fn point_in_polygon(x: i32, y: i32, points: &[Position]) -> bool {
    if points.is_empty() {
        return false;
    }
    let n = points.len();
    let mut inside = false;
    let mut p1 = points[0];
    for i in 0..=n {
        let p2 = points[i % n];
        if y > p1.y.min(p2.y) && y <= p1.y.max(p2.y) && x <= p1.x.max(p2.x) {
            let mut x_intersection = f64::from(x);
            if p1.y != p2.y {
                x_intersection = f64::from(y - p1.y) * f64::from(p2.x - p1.x) / f64::from(p2.y - p1.y) + f64::from(p1.x);
            }
            if p1.x == p2.x || f64::from(x) <= x_intersection {
                inside = !inside;
            }
        }
        p1 = p2;
    }
    inside
}

/// Point on a cubic bezier at parameter `t`.
#[allow(clippy::too_many_arguments)]
pub fn compute_bezier(
    t: f64,
    start_x: f64,
    start_y: f64,
    control_1_x: f64,
    control_1_y: f64,
    control_2_x: f64,
    control_2_y: f64,
    end_x: f64,
    end_y: f64,
) -> (f64, f64) {
    let mt = 1.0 - t;
    let mt2 = mt * mt;
    let t2 = t * t;

    let a = mt2 * mt;
    let b = mt2 * t * 3.0;
    let c = mt * t2 * 3.0;
    let d = t * t2;

    (
        a * start_x + b * control_1_x + c * control_2_x + d * end_x,
        a * start_y + b * control_1_y + c * control_2_y + d * end_y,
    )
}

/// Cells along a cubic bezier, flattened to line walks between samples at
/// `t = i / 100`. This is a piecewise-linear approximation with a fixed
/// step count, not an exact rasterization.
#[allow(clippy::too_many_arguments)]
pub fn bezier_curve_walk(
    start_x: f64,
    start_y: f64,
    control_1_x: f64,
    control_1_y: f64,
    control_2_x: f64,
    control_2_y: f64,
    end_x: f64,
    end_y: f64,
) -> impl Iterator<Item = Position> {
    let mut samples = Vec::with_capacity(CURVE_STEPS + 1);
    samples.push((start_x, start_y));
    for i in 0..CURVE_STEPS {
        let t = i as f64 / CURVE_STEPS as f64;
        samples.push(compute_bezier(
            t, start_x, start_y, control_1_x, control_1_y, control_2_x, control_2_y, end_x, end_y,
        ));
    }
    (1..samples.len()).flat_map(move |i| {
        let (ax, ay) = samples[i - 1];
        let (bx, by) = samples[i];
        line_walk((ax as i32, ay as i32), (bx as i32, by as i32))
    })
}

/// Cells along a quadratic curve, via the cubic with a doubled control
/// point.
pub fn quadratic_curve_walk(start_x: f64, start_y: f64, control_x: f64, control_y: f64, end_x: f64, end_y: f64) -> impl Iterator<Item = Position> {
    bezier_curve_walk(start_x, start_y, control_x, control_y, control_x, control_y, end_x, end_y)
}

/// Midpoint ellipse. Returns the perimeter cells via 4-way symmetry; the
/// result is unordered and may contain duplicates, so consumers must not
/// assume path order.
pub fn midpoint_ellipse(xc: i32, yc: i32, rx: i32, ry: i32) -> Vec<Position> {
    let mut points = Vec::new();
    let mut yield_symmetric = |x: i32, y: i32| {
        points.push(Position::new(x + xc, y + yc));
        points.push(Position::new(-x + xc, y + yc));
        points.push(Position::new(x + xc, -y + yc));
        points.push(Position::new(-x + xc, -y + yc));
    };

    let (rx2, ry2) = (i64::from(rx) * i64::from(rx), i64::from(ry) * i64::from(ry));
    let mut x: i64 = 0;
    let mut y: i64 = i64::from(ry);

    // Region 1
    let mut d1 = ry2 as f64 - (rx2 * i64::from(ry)) as f64 + 0.25 * rx2 as f64;
    let mut dx = 2 * ry2 * x;
    let mut dy = 2 * rx2 * y;
    while dx < dy {
        yield_symmetric(x as i32, y as i32);
        if d1 < 0.0 {
            x += 1;
            dx += 2 * ry2;
            d1 += (dx + ry2) as f64;
        } else {
            x += 1;
            y -= 1;
            dx += 2 * ry2;
            dy -= 2 * rx2;
            d1 += (dx - dy + ry2) as f64;
        }
    }

    // Region 2
    let mut d2 = ry2 as f64 * (x as f64 + 0.5) * (x as f64 + 0.5) + (rx2 * (y - 1) * (y - 1)) as f64 - (rx2 * ry2) as f64;
    while y >= 0 {
        yield_symmetric(x as i32, y as i32);
        if d2 > 0.0 {
            y -= 1;
            dy -= 2 * rx2;
            d2 += (rx2 - dy) as f64;
        } else {
            y -= 1;
            x += 1;
            dx += 2 * ry2;
            dy -= 2 * rx2;
            d2 += (dx - dy + rx2) as f64;
        }
    }
    points
}

/// Combined scan-and-fill span flood fill.
///
/// A cell matches iff its glyph and background equal the seed cell's, and
/// its foreground matches too unless the seed glyph is a space (blank cells
/// are treated as one fillable region regardless of their foreground).
/// Cells already equal to the fill target never match, which guarantees
/// termination when filling with an unchanged color.
///
/// Returns `None` for an out-of-bounds or already-matching seed, otherwise
/// the exact bounding region of the cells that changed.
pub fn flood_fill(document: &mut Document, x: i32, y: i32, fill_ch: char, fill_fg: Color, fill_bg: Color) -> Option<Region> {
    if x < 0 || x >= document.width || y < 0 || y >= document.height {
        return None;
    }
    let original_ch = document.ch[y as usize][x as usize];
    let original_fg = document.fg[y as usize][x as usize];
    let original_bg = document.bg[y as usize][x as usize];

    let inside = move |doc: &Document, x: i32, y: i32| -> bool {
        if x < 0 || x >= doc.width || y < 0 || y >= doc.height {
            return false;
        }
        let (yi, xi) = (y as usize, x as usize);
        doc.ch[yi][xi] == original_ch
            && doc.bg[yi][xi] == original_bg
            && (original_ch == ' ' || doc.fg[yi][xi] == original_fg)
            && (doc.ch[yi][xi] != fill_ch || doc.bg[yi][xi] != fill_bg || doc.fg[yi][xi] != fill_fg)
    };

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);
    let mut set_cell = |doc: &mut Document, x: i32, y: i32| {
        let (yi, xi) = (y as usize, x as usize);
        doc.ch[yi][xi] = fill_ch;
        doc.fg[yi][xi] = fill_fg;
        doc.bg[yi][xi] = fill_bg;
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    };

    if !inside(document, x, y) {
        return None;
    }
    let mut stack: Vec<(i32, i32, i32, i32)> = vec![(x, x, y, 1), (x, x, y - 1, -1)];
    while let Some((start_x1, x2, y, dy)) = stack.pop() {
        let mut x1 = start_x1;
        let mut x = x1;
        if inside(document, x, y) {
            while inside(document, x - 1, y) {
                set_cell(document, x - 1, y);
                x -= 1;
            }
        }
        if x < x1 {
            stack.push((x, x1 - 1, y - dy, -dy));
        }
        while x1 <= x2 {
            while inside(document, x1, y) {
                set_cell(document, x1, y);
                x1 += 1;
                stack.push((x, x1 - 1, y + dy, dy));
                if x1 - 1 > x2 {
                    stack.push((x2 + 1, x1 - 1, y - dy, -dy));
                }
            }
            x1 += 1;
            while x1 < x2 && !inside(document, x1, y) {
                x1 += 1;
            }
            x = x1;
        }
    }

    Some(Region::from(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cell, CellPane, BLACK, WHITE};

    #[test]
    fn test_line_walk_horizontal() {
        let points: Vec<Position> = line_walk((0, 0), (3, 0)).collect();
        assert_eq!(
            points,
            vec![
                Position::new(0, 0),
                Position::new(1, 0),
                Position::new(2, 0),
                Position::new(3, 0)
            ]
        );
    }

    #[test]
    fn test_line_walk_single_cell_and_reverse() {
        assert_eq!(line_walk((5, 5), (5, 5)).collect::<Vec<_>>(), vec![Position::new(5, 5)]);

        let forward: Vec<Position> = line_walk((0, 0), (4, 2)).collect();
        assert_eq!(forward.first(), Some(&Position::new(0, 0)));
        assert_eq!(forward.last(), Some(&Position::new(4, 2)));
        // One cell per step: consecutive cells differ by at most one in
        // each axis.
        for pair in forward.windows(2) {
            assert!((pair[1].x - pair[0].x).abs() <= 1);
            assert!((pair[1].y - pair[0].y).abs() <= 1);
        }
    }

    #[test]
    fn test_line_walk_is_restartable() {
        let first: Vec<Position> = line_walk((2, 1), (-3, 4)).collect();
        let second: Vec<Position> = line_walk((2, 1), (-3, 4)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_polygon_walk_closes_the_loop() {
        let points = [Position::new(0, 0), Position::new(2, 0), Position::new(2, 2)];
        let perimeter: Vec<Position> = polygon_walk(&points).collect();
        assert!(perimeter.contains(&Position::new(1, 1)), "closing edge missing");

        let open: Vec<Position> = polyline_walk(&points).collect();
        assert!(!open.contains(&Position::new(1, 1)));
    }

    #[test]
    fn test_point_in_polygon_centroid_and_outside() {
        let square = [
            Position::new(0, 0),
            Position::new(10, 0),
            Position::new(10, 10),
            Position::new(0, 10),
        ];
        assert!(point_in_polygon(5, 5, &square));
        assert!(!point_in_polygon(100, 100, &square));
        assert!(!point_in_polygon(-5, 5, &square));

        let triangle = [Position::new(0, 0), Position::new(8, 0), Position::new(4, 6)];
        assert!(point_in_polygon(4, 2, &triangle));
        assert!(!point_in_polygon(0, 6, &triangle));
    }

    #[test]
    fn test_quadratic_curve_endpoints() {
        let cells: Vec<Position> = quadratic_curve_walk(0.0, 0.0, 5.0, 0.0, 10.0, 0.0).collect();
        assert_eq!(cells.first(), Some(&Position::new(0, 0)));
        // The fixed-step sampling stops at t = 99/100, so the last emitted
        // cell is near, not necessarily at, the end point.
        let last = cells.last().unwrap();
        assert!((last.x - 10).abs() <= 1 && last.y == 0);
    }

    #[test]
    fn test_midpoint_ellipse_symmetry_and_extent() {
        let points = midpoint_ellipse(10, 10, 4, 3);
        assert!(points.contains(&Position::new(14, 10)));
        assert!(points.contains(&Position::new(6, 10)));
        assert!(points.contains(&Position::new(10, 13)));
        assert!(points.contains(&Position::new(10, 7)));
        for p in &points {
            assert!((p.x - 10).abs() <= 4);
            assert!((p.y - 10).abs() <= 3);
        }
    }

    #[test]
    fn test_midpoint_ellipse_zero_radius() {
        let points = midpoint_ellipse(3, 3, 0, 0);
        assert!(points.iter().all(|p| *p == Position::new(3, 3)));
        assert!(!points.is_empty());
    }

    #[test]
    fn test_flood_fill_whole_blank_document() {
        let mut doc = Document::new(10, 10);
        let region = flood_fill(&mut doc, 5, 5, '#', BLACK, Color::new(0x80, 0x80, 0x80)).unwrap();
        assert_eq!(region, Region::from(0, 0, 10, 10));
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(doc.get_cell(Position::new(x, y)).ch, '#');
            }
        }
    }

    #[test]
    fn test_flood_fill_already_matching_is_none() {
        let mut doc = Document::new(5, 5);
        // Filling blank cells with the exact blank cell is a no-op.
        assert_eq!(flood_fill(&mut doc, 2, 2, ' ', BLACK, WHITE), None);
        assert_eq!(flood_fill(&mut doc, -1, 0, '#', BLACK, WHITE), None);
        assert_eq!(flood_fill(&mut doc, 0, 7, '#', BLACK, WHITE), None);
    }

    #[test]
    fn test_flood_fill_stops_at_boundary() {
        let mut doc = Document::new(7, 7);
        // Vertical wall at x = 3.
        for y in 0..7 {
            doc.set_cell((3, y), Cell::from('|'));
        }
        let region = flood_fill(&mut doc, 1, 1, '#', BLACK, WHITE).unwrap();
        assert_eq!(region, Region::from(0, 0, 3, 7));
        for y in 0..7 {
            assert_eq!(doc.get_cell(Position::new(3, y)).ch, '|');
            assert_eq!(doc.get_cell(Position::new(4, y)).ch, ' ');
            assert_eq!(doc.get_cell(Position::new(2, y)).ch, '#');
        }
    }

    #[test]
    fn test_flood_fill_ignores_foreground_of_blank_cells() {
        let mut doc = Document::new(4, 1);
        // Same glyph and background, differing foregrounds: still one
        // region because the cells are blank.
        doc.fg[0][1] = Color::new(1, 2, 3);
        doc.fg[0][2] = Color::new(4, 5, 6);
        let region = flood_fill(&mut doc, 0, 0, '#', BLACK, WHITE).unwrap();
        assert_eq!(region, Region::from(0, 0, 4, 1));
        for x in 0..4 {
            assert_eq!(doc.get_cell(Position::new(x, 0)).ch, '#');
        }
    }

    #[test]
    fn test_flood_fill_respects_foreground_of_non_blank_cells() {
        let mut doc = Document::new(3, 1);
        for x in 0..3 {
            doc.ch[0][x] = 'x';
        }
        doc.fg[0][2] = Color::new(9, 9, 9);
        let region = flood_fill(&mut doc, 0, 0, '#', BLACK, WHITE).unwrap();
        assert_eq!(region, Region::from(0, 0, 2, 1));
        assert_eq!(doc.get_cell(Position::new(2, 0)).ch, 'x');
    }

    #[test]
    fn test_flood_fill_region_matches_connected_component() {
        let mut doc = Document::new(9, 9);
        // A closed box from (2,2) to (6,6); fill inside it.
        for p in polygon_walk(&[
            Position::new(2, 2),
            Position::new(6, 2),
            Position::new(6, 6),
            Position::new(2, 6),
        ]) {
            doc.set_cell(p, Cell::from('█'));
        }
        let region = flood_fill(&mut doc, 4, 4, '.', BLACK, WHITE).unwrap();
        assert_eq!(region, Region::from(3, 3, 3, 3));
        // Outside the box stays blank.
        assert_eq!(doc.get_cell(Position::new(1, 1)).ch, ' ');
        assert_eq!(doc.get_cell(Position::new(7, 7)).ch, ' ');
    }
}
