//! External changed-pixel regions.
//!
//! A region is the bounding box of an outermost connected set of changed
//! pixels. Changed pixels connect through all 8 neighbours; unchanged pixels
//! connect through the 4 edge neighbours. A component is outermost when it
//! touches the page edge or the unchanged area that reaches the page edge.
//! Components sitting inside a hole of another component are not reported,
//! since the enclosing box already covers them.

use std::collections::VecDeque;

use crate::pixel_diff::DiffMask;
use crate::report::DiffRegion;

const NEIGHBOURS_4: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const NEIGHBOURS_8: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Bounding boxes of the outermost changed components, ordered
/// top-to-bottom then left-to-right.
pub fn external_regions(mask: &DiffMask) -> Vec<DiffRegion> {
    if mask.is_clear() {
        return Vec::new();
    }

    let outside = border_background(mask);
    let (w, h) = (mask.width(), mask.height());
    let bits = mask.bits();
    let mut visited = vec![false; bits.len()];
    let mut regions = Vec::new();
    let mut queue = VecDeque::new();

    for y in 0..h {
        for x in 0..w {
            let start = mask.index(x, y);
            if !bits[start] || visited[start] {
                continue;
            }

            visited[start] = true;
            queue.push_back((x, y));
            let (mut min_x, mut max_x, mut min_y, mut max_y) = (x, x, y, y);
            let mut external = false;

            while let Some((cx, cy)) = queue.pop_front() {
                min_x = min_x.min(cx);
                max_x = max_x.max(cx);
                min_y = min_y.min(cy);
                max_y = max_y.max(cy);

                if !external {
                    external = cx == 0 || cy == 0 || cx + 1 == w || cy + 1 == h;
                }
                if !external {
                    external = neighbours(cx, cy, w, h, &NEIGHBOURS_4)
                        .any(|(nx, ny)| outside[mask.index(nx, ny)]);
                }

                for (nx, ny) in neighbours(cx, cy, w, h, &NEIGHBOURS_8) {
                    let idx = mask.index(nx, ny);
                    if bits[idx] && !visited[idx] {
                        visited[idx] = true;
                        queue.push_back((nx, ny));
                    }
                }
            }

            if external {
                regions.push(DiffRegion::new(
                    min_x,
                    min_y,
                    max_x - min_x + 1,
                    max_y - min_y + 1,
                ));
            }
        }
    }

    regions.sort_by_key(|r| (r.y, r.x));
    regions
}

/// Unchanged pixels 4-connected to the page edge.
fn border_background(mask: &DiffMask) -> Vec<bool> {
    let (w, h) = (mask.width(), mask.height());
    let bits = mask.bits();
    let mut outside = vec![false; bits.len()];
    let mut queue = VecDeque::new();

    let mut seed = |x: u32, y: u32, outside: &mut Vec<bool>| {
        let idx = mask.index(x, y);
        if !bits[idx] && !outside[idx] {
            outside[idx] = true;
            queue.push_back((x, y));
        }
    };
    for x in 0..w {
        seed(x, 0, &mut outside);
        seed(x, h - 1, &mut outside);
    }
    for y in 0..h {
        seed(0, y, &mut outside);
        seed(w - 1, y, &mut outside);
    }

    while let Some((cx, cy)) = queue.pop_front() {
        for (nx, ny) in neighbours(cx, cy, w, h, &NEIGHBOURS_4) {
            let idx = mask.index(nx, ny);
            if !bits[idx] && !outside[idx] {
                outside[idx] = true;
                queue.push_back((nx, ny));
            }
        }
    }
    outside
}

fn neighbours<'a>(
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    offsets: &'a [(i64, i64)],
) -> impl Iterator<Item = (u32, u32)> + 'a {
    offsets.iter().filter_map(move |(dx, dy)| {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        (nx >= 0 && ny >= 0 && nx < w as i64 && ny < h as i64).then_some((nx as u32, ny as u32))
    })
}
