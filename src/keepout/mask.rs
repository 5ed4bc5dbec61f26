use crate::error::KeepOutError;

/// Dense `width x height` grid of keep-out flags, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepOutMask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl KeepOutMask {
    /// All-clear mask
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    /// Wrap existing row-major cells.
    pub fn from_cells(width: u32, height: u32, cells: Vec<bool>) -> Result<Self, KeepOutError> {
        let expected = width as usize * height as usize;
        if cells.len() != expected {
            return Err(KeepOutError::Dimension(format!(
                "{}x{} mask needs {} cells, got {}",
                width,
                height,
                expected,
                cells.len()
            )));
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Out-of-bounds coordinates read as clear.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.cells[self.index(x, y)]
    }

    /// Out-of-bounds coordinates are ignored.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.cells[idx] = value;
        }
    }

    /// Mark the half-open rectangle `[x0, x1) x [y0, y1)`, clipped to the mask.
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64) {
        let x0 = x0.clamp(0, self.width as i64) as usize;
        let x1 = x1.clamp(0, self.width as i64) as usize;
        let y0 = y0.clamp(0, self.height as i64) as usize;
        let y1 = y1.clamp(0, self.height as i64) as usize;
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let w = self.width as usize;
        for y in y0..y1 {
            self.cells[y * w + x0..y * w + x1].fill(true);
        }
    }

    /// Logical OR of `other` into `self`.
    pub fn union_with(&mut self, other: &KeepOutMask) -> Result<(), KeepOutError> {
        if (self.width, self.height) != (other.width, other.height) {
            return Err(KeepOutError::Dimension(format!(
                "cannot merge {}x{} mask into {}x{} mask",
                other.width, other.height, self.width, self.height
            )));
        }
        for (a, &b) in self.cells.iter_mut().zip(&other.cells) {
            *a |= b;
        }
        Ok(())
    }

    /// Number of keep-out pixels
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Percentage of keep-out pixels, 0 for an empty mask.
    pub fn coverage(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.count() as f64 / self.cells.len() as f64 * 100.0
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}
