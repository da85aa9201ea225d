use std::collections::VecDeque;

use ndarray::ArrayView2;

/// Outer boundary of one region in a binary mask, as `(x, y)` points.
///
/// Points are in tracing order (clockwise on screen) and compressed so that
/// only the ends of straight horizontal, vertical and diagonal runs remain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<(i32, i32)>,
}

impl Contour {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounding rectangle as (x, y, width, height).
    pub fn bounding_rect(&self) -> Option<(i32, i32, u32, u32)> {
        let (&(x0, y0), rest) = self.points.split_first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (x0, y0, x0, y0);
        for &(x, y) in rest {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some((
            min_x,
            min_y,
            (max_x - min_x + 1) as u32,
            (max_y - min_y + 1) as u32,
        ))
    }

    /// Whether `(x, y)` lies inside or on the closed polygon.
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        let n = self.points.len();
        if n == 0 {
            return false;
        }
        if n == 1 {
            return self.points[0] == (x, y);
        }

        let mut inside = false;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            if on_segment(a, b, (x, y)) {
                return true;
            }
            let (ax, ay) = (a.0 as f64, a.1 as f64);
            let (bx, by) = (b.0 as f64, b.1 as f64);
            let py = y as f64;
            if (ay > py) != (by > py) {
                let cross_x = ax + (py - ay) * (bx - ax) / (by - ay);
                if (x as f64) < cross_x {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

fn on_segment(a: (i32, i32), b: (i32, i32), p: (i32, i32)) -> bool {
    let cross = (b.0 - a.0) as i64 * (p.1 - a.1) as i64 - (b.1 - a.1) as i64 * (p.0 - a.0) as i64;
    cross == 0
        && p.0 >= a.0.min(b.0)
        && p.0 <= a.0.max(b.0)
        && p.1 >= a.1.min(b.1)
        && p.1 <= a.1.max(b.1)
}

/// Moore neighbourhood, clockwise on screen (y grows downwards), starting west.
const DIRS_8: [(i32, i32); 8] = [
    (-1, 0),  // W
    (-1, -1), // NW
    (0, -1),  // N
    (1, -1),  // NE
    (1, 0),   // E
    (1, 1),   // SE
    (0, 1),   // S
    (-1, 1),  // SW
];

const DIRS_4: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

struct Mask<'a> {
    data: ArrayView2<'a, u8>,
    width: i32,
    height: i32,
}

impl Mask<'_> {
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn is_foreground(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && self.data[[y as usize, x as usize]] > 0
    }

    fn idx(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }
}

/// Finds the outer boundaries of the regions in a binary mask (non-zero is
/// foreground).
///
/// Regions are 8-connected. Only regions that touch the background connected
/// to the image border are reported; regions nested inside another region's
/// hole are skipped.
pub fn find_external_contours(mask: ArrayView2<'_, u8>) -> Vec<Contour> {
    let (rows, cols) = mask.dim();
    let mask = Mask {
        data: mask,
        width: cols as i32,
        height: rows as i32,
    };
    if rows == 0 || cols == 0 {
        return Vec::new();
    }

    let outside = outside_background(&mask);
    let mut labelled = vec![false; rows * cols];
    let mut contours = Vec::new();

    for y in 0..mask.height {
        for x in 0..mask.width {
            if labelled[mask.idx(x, y)] || !mask.is_foreground(x, y) {
                continue;
            }
            // First pixel in raster order: top-most, then left-most.
            let external = label_region(&mask, &outside, &mut labelled, (x, y));
            if external {
                let traced = trace_boundary(&mask, (x, y));
                contours.push(Contour {
                    points: compress_chain(traced),
                });
            }
        }
    }

    contours
}

/// Background pixels 4-connected to the image border.
fn outside_background(mask: &Mask<'_>) -> Vec<bool> {
    let mut outside = vec![false; (mask.width * mask.height) as usize];
    let mut queue = VecDeque::new();

    let border = (0..mask.width)
        .flat_map(|x| [(x, 0), (x, mask.height - 1)])
        .chain((0..mask.height).flat_map(|y| [(0, y), (mask.width - 1, y)]));
    for (x, y) in border {
        if !mask.is_foreground(x, y) && !outside[mask.idx(x, y)] {
            outside[mask.idx(x, y)] = true;
            queue.push_back((x, y));
        }
    }

    while let Some((x, y)) = queue.pop_front() {
        for (dx, dy) in DIRS_4 {
            let (nx, ny) = (x + dx, y + dy);
            if mask.in_bounds(nx, ny) && !mask.is_foreground(nx, ny) && !outside[mask.idx(nx, ny)] {
                outside[mask.idx(nx, ny)] = true;
                queue.push_back((nx, ny));
            }
        }
    }
    outside
}

/// Flood-labels the 8-connected region containing `seed`; returns whether it
/// borders the outside background or the image edge.
fn label_region(
    mask: &Mask<'_>,
    outside: &[bool],
    labelled: &mut [bool],
    seed: (i32, i32),
) -> bool {
    let mut external = false;
    let mut queue = VecDeque::from([seed]);
    labelled[mask.idx(seed.0, seed.1)] = true;

    while let Some((x, y)) = queue.pop_front() {
        for (dx, dy) in DIRS_4 {
            let (nx, ny) = (x + dx, y + dy);
            if !mask.in_bounds(nx, ny) || outside[mask.idx(nx, ny)] {
                external = true;
            }
        }
        for (dx, dy) in DIRS_8 {
            let (nx, ny) = (x + dx, y + dy);
            if mask.is_foreground(nx, ny) && !labelled[mask.idx(nx, ny)] {
                labelled[mask.idx(nx, ny)] = true;
                queue.push_back((nx, ny));
            }
        }
    }
    external
}

fn direction_index(dx: i32, dy: i32) -> usize {
    DIRS_8
        .iter()
        .position(|&d| d == (dx, dy))
        .unwrap_or(0)
}

/// Next boundary pixel clockwise from the backtrack direction, with the
/// backtrack direction to use from that pixel.
fn moore_step(mask: &Mask<'_>, current: (i32, i32), back: usize) -> Option<((i32, i32), usize)> {
    for k in 1..8 {
        let d = (back + k) % 8;
        let next = (current.0 + DIRS_8[d].0, current.1 + DIRS_8[d].1);
        if mask.is_foreground(next.0, next.1) {
            let prev_dir = DIRS_8[(d + 7) % 8];
            let prev = (current.0 + prev_dir.0, current.1 + prev_dir.1);
            let next_back = direction_index(prev.0 - next.0, prev.1 - next.1);
            return Some((next, next_back));
        }
    }
    None
}

/// Moore-neighbour tracing from the region's first raster pixel.
///
/// Stops when the first move out of `start` is about to repeat, which is
/// exact because the move fully determines the rest of the walk.
fn trace_boundary(mask: &Mask<'_>, start: (i32, i32)) -> Vec<(i32, i32)> {
    let mut points = vec![start];
    let mut current = start;
    // Raster order guarantees the west neighbour of `start` is background.
    let mut back = 0usize;
    let max_steps = 4 * (mask.width as usize * mask.height as usize) + 8;

    for _ in 0..max_steps {
        let Some((next, next_back)) = moore_step(mask, current, back) else {
            break; // isolated pixel
        };
        if current == start && points.len() > 1 && points.get(1) == Some(&next) {
            break;
        }
        points.push(next);
        current = next;
        back = next_back;
    }

    if points.len() > 1 && points.last() == Some(&start) {
        points.pop();
    }
    points
}

/// Drops points that continue the direction of the previous step.
fn compress_chain(points: Vec<(i32, i32)>) -> Vec<(i32, i32)> {
    let n = points.len();
    if n <= 2 {
        return points;
    }
    let step = |a: (i32, i32), b: (i32, i32)| ((b.0 - a.0).signum(), (b.1 - a.1).signum());

    let kept: Vec<(i32, i32)> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect();

    if kept.is_empty() {
        points
    } else {
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn mask_with_rects(width: usize, height: usize, rects: &[(usize, usize, usize, usize)]) -> Array2<u8> {
        let mut mask = Array2::<u8>::zeros((height, width));
        for &(x, y, w, h) in rects {
            for row in y..y + h {
                for col in x..x + w {
                    mask[[row, col]] = 255;
                }
            }
        }
        mask
    }

    #[test]
    fn test_empty_mask_has_no_contours() {
        let mask = Array2::<u8>::zeros((20, 20));
        assert!(find_external_contours(mask.view()).is_empty());
    }

    #[test]
    fn test_square_compresses_to_corners() {
        let mask = mask_with_rects(30, 30, &[(5, 8, 10, 10)]);
        let contours = find_external_contours(mask.view());
        assert_eq!(contours.len(), 1);
        assert_eq!(
            contours[0].points,
            vec![(5, 8), (14, 8), (14, 17), (5, 17)]
        );
        assert_eq!(contours[0].bounding_rect(), Some((5, 8, 10, 10)));
    }

    #[test]
    fn test_single_pixel_region() {
        let mask = mask_with_rects(5, 5, &[(2, 2, 1, 1)]);
        let contours = find_external_contours(mask.view());
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![(2, 2)]);
    }

    #[test]
    fn test_horizontal_line_reports_end_points() {
        let mask = mask_with_rects(8, 5, &[(1, 2, 4, 1)]);
        let contours = find_external_contours(mask.view());
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![(1, 2), (4, 2)]);
    }

    #[test]
    fn test_separate_regions_each_get_a_contour() {
        let mask = mask_with_rects(40, 20, &[(2, 2, 5, 5), (20, 10, 6, 4)]);
        let contours = find_external_contours(mask.view());
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].bounding_rect(), Some((2, 2, 5, 5)));
        assert_eq!(contours[1].bounding_rect(), Some((20, 10, 6, 4)));
    }

    #[test]
    fn test_diagonal_touch_is_one_region() {
        let mask = mask_with_rects(10, 10, &[(1, 1, 3, 3), (4, 4, 3, 3)]);
        let contours = find_external_contours(mask.view());
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bounding_rect(), Some((1, 1, 6, 6)));
    }

    #[test]
    fn test_ring_reports_only_outer_boundary() {
        let mut mask = mask_with_rects(20, 20, &[(2, 2, 12, 12)]);
        for row in 5..11 {
            for col in 5..11 {
                mask[[row, col]] = 0;
            }
        }
        let contours = find_external_contours(mask.view());
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bounding_rect(), Some((2, 2, 12, 12)));
    }

    #[test]
    fn test_region_inside_hole_is_not_external() {
        let mut mask = mask_with_rects(20, 20, &[(2, 2, 14, 14)]);
        for row in 4..14 {
            for col in 4..14 {
                mask[[row, col]] = 0;
            }
        }
        // Island in the middle of the hole
        for row in 8..10 {
            for col in 8..10 {
                mask[[row, col]] = 255;
            }
        }
        let contours = find_external_contours(mask.view());
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bounding_rect(), Some((2, 2, 14, 14)));
    }

    #[test]
    fn test_region_touching_image_edge() {
        let mask = mask_with_rects(10, 10, &[(0, 0, 4, 3)]);
        let contours = find_external_contours(mask.view());
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![(0, 0), (3, 0), (3, 2), (0, 2)]);
    }

    #[test]
    fn test_l_shape_cuts_concave_corner_diagonally() {
        let mask = mask_with_rects(12, 12, &[(2, 2, 3, 6), (2, 5, 6, 3)]);
        let contours = find_external_contours(mask.view());
        assert_eq!(contours.len(), 1);
        // 8-connected tracing steps from (4, 4) straight to (5, 5)
        assert_eq!(
            contours[0].points,
            vec![(2, 2), (4, 2), (4, 4), (5, 5), (7, 5), (7, 7), (2, 7)]
        );
    }

    #[test]
    fn test_contains_point() {
        let contour = Contour {
            points: vec![(5, 8), (14, 8), (14, 17), (5, 17)],
        };
        assert!(contour.contains_point(10, 12));
        assert!(contour.contains_point(5, 8));
        assert!(contour.contains_point(14, 12));
        assert!(!contour.contains_point(4, 12));
        assert!(!contour.contains_point(10, 18));
    }

    #[test]
    fn test_bounding_rect_of_empty_contour() {
        let contour = Contour { points: Vec::new() };
        assert!(contour.is_empty());
        assert_eq!(contour.bounding_rect(), None);
    }
}
