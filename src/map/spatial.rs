use std::collections::HashMap;

/// Pixel bounding box (min_x, min_y, max_x, max_y)
pub type PixelBounds = (f64, f64, f64, f64);

/// Coarse pixel-space index of feature bounding boxes.
/// Each feature is inserted into every on-canvas cell its bbox overlaps, so queries
/// inside the canvas have no false negatives; false positives are removed by the
/// caller's exact test. Points outside the canvas never match.
#[derive(Clone, Debug, Default)]
pub struct FeatureGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl FeatureGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            cell_size: cell_size.max(1.0),
        }
    }

    #[inline(always)]
    fn to_cell(&self, x: f64, y: f64) -> (i32, i32) {
        ((x / self.cell_size).floor() as i32, (y / self.cell_size).floor() as i32)
    }

    /// Index bounding boxes by position on a `width` x `height` dot canvas.
    /// `None` entries keep their index but are never returned.
    pub fn build(
        bounds: impl Iterator<Item = Option<PixelBounds>>,
        cell_size: f64,
        width: f64,
        height: f64,
    ) -> Self {
        let mut grid = Self::new(cell_size);
        if !(width > 0.0 && height > 0.0) {
            return grid;
        }
        for (idx, bbox) in bounds.enumerate() {
            let Some(clamped) = bbox.and_then(|b| clamp_to_canvas(b, width, height)) else {
                continue;
            };
            let (min_x, min_y, max_x, max_y) = clamped;
            let min_cell = grid.to_cell(min_x, min_y);
            let max_cell = grid.to_cell(max_x, max_y);
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    grid.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        grid
    }

    /// Candidate features whose bbox may contain the point
    pub fn query_point(&self, x: f64, y: f64) -> &[usize] {
        self.cells
            .get(&self.to_cell(x, y))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Total number of (cell, feature) entries
    pub fn entry_count(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }
}

/// Intersect a bbox with `[0, width) x [0, height)`; `None` when it lies entirely outside
fn clamp_to_canvas(
    (min_x, min_y, max_x, max_y): PixelBounds,
    width: f64,
    height: f64,
) -> Option<PixelBounds> {
    if !(max_x >= 0.0 && max_y >= 0.0 && min_x < width && min_y < height) {
        return None;
    }
    // Far edges stop at the last dot row/column
    let right = (width - 1.0).max(0.0);
    let bottom = (height - 1.0).max(0.0);
    Some((min_x.max(0.0), min_y.max(0.0), max_x.min(right), max_y.min(bottom)))
}
