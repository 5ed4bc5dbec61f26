//! Read-only statistics over a keep-out mask.

use std::collections::VecDeque;

use super::KeepOutMask;

/// One 4-connected keep-out region. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
    pub area: usize,
}

impl Region {
    #[inline]
    pub fn width(&self) -> u32 {
        self.x_max - self.x_min + 1
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.y_max - self.y_min + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapStats {
    pub width: u32,
    pub height: u32,
    pub total_pixels: usize,
    pub keep_out_pixels: usize,
    /// Percentage in `[0, 100]`
    pub coverage: f64,
    /// Largest first; equal areas keep the raster order of their first pixel
    pub regions: Vec<Region>,
}

pub fn analyze(mask: &KeepOutMask) -> MapStats {
    let mut regions = label_regions(mask);
    regions.sort_by(|a, b| b.area.cmp(&a.area));

    MapStats {
        width: mask.width(),
        height: mask.height(),
        total_pixels: mask.pixel_count(),
        keep_out_pixels: mask.count(),
        coverage: mask.coverage(),
        regions,
    }
}

/// Breadth-first flood fill over 4-neighbours.
fn label_regions(mask: &KeepOutMask) -> Vec<Region> {
    let width = mask.width() as usize;
    let height = mask.height() as usize;
    let cells = mask.cells();
    let mut visited = vec![false; cells.len()];
    let mut queue = VecDeque::new();
    let mut regions = Vec::new();

    for start in 0..cells.len() {
        if visited[start] || !cells[start] {
            continue;
        }
        visited[start] = true;
        queue.push_back(start);

        let (mut min_x, mut min_y) = (width, height);
        let (mut max_x, mut max_y) = (0usize, 0usize);
        let mut area = 0usize;

        while let Some(idx) = queue.pop_front() {
            let x = idx % width;
            let y = idx / width;
            area += 1;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);

            let mut visit = |n: usize| {
                if !visited[n] && cells[n] {
                    visited[n] = true;
                    queue.push_back(n);
                }
            };
            if x > 0 {
                visit(idx - 1);
            }
            if x + 1 < width {
                visit(idx + 1);
            }
            if y > 0 {
                visit(idx - width);
            }
            if y + 1 < height {
                visit(idx + width);
            }
        }

        regions.push(Region {
            x_min: min_x as u32,
            y_min: min_y as u32,
            x_max: max_x as u32,
            y_max: max_y as u32,
            area,
        });
    }

    regions
}
