/// Braille Unicode canvas for high-resolution terminal graphics.
/// Each character cell holds a 2x4 dot grid; patterns live at U+2800..U+28FF.
#[derive(Clone, Debug)]
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    cells: Vec<u8>,
}

/// Dot bit for (x % 2, y % 4) inside a cell
const DOT_BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

impl BrailleCanvas {
    /// Canvas of `width` x `height` characters (`width*2` x `height*4` dots)
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0u8; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Dot resolution
    pub fn pixel_size(&self) -> (usize, usize) {
        (self.width * 2, self.height * 4)
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    #[inline(always)]
    fn cell_index(&self, x: usize, y: usize) -> Option<usize> {
        let (cx, cy) = (x / 2, y / 4);
        (cx < self.width && cy < self.height).then_some(cy * self.width + cx)
    }

    /// Set a dot. Out-of-range coordinates are ignored.
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    #[inline(always)]
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        if let Some(idx) = self.cell_index(x, y) {
            self.cells[idx] |= DOT_BITS[x % 2][y % 4];
        }
    }

    /// Set a dot using signed coordinates (negative values are ignored)
    #[inline(always)]
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.cell_index(x, y)
            .is_some_and(|idx| self.cells[idx] & DOT_BITS[x % 2][y % 4] != 0)
    }

    /// Number of dots set
    pub fn dot_count(&self) -> usize {
        self.cells.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// One character row as braille glyphs
    pub fn row_to_string(&self, row: usize) -> String {
        if row >= self.height {
            return String::new();
        }
        self.cells[row * self.width..(row + 1) * self.width]
            .iter()
            .map(|&b| char::from_u32(0x2800 + b as u32).unwrap_or(' '))
            .collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.height).map(|i| self.row_to_string(i))
    }
}
