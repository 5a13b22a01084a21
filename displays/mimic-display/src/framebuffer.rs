//! Panel pixel memory
//!
//! One byte per pixel, row-major, `PIXEL_ON` or `PIXEL_OFF`. Controllers
//! write it a page at a time: each data byte covers one column of a page,
//! bit 0 being the top row of that page.

use heapless::Vec;

/// Largest panel supported (full SH1106 RAM, 132 x 64)
pub const MAX_PIXELS: usize = 132 * 64;

/// Lit pixel
pub const PIXEL_ON: u8 = 0xFF;

/// Dark pixel
pub const PIXEL_OFF: u8 = 0x00;

/// Rows per page
pub const PAGE_HEIGHT: usize = 8;

/// Invalid panel geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GeometryError {
    /// Width or height is zero
    Empty,
    /// Height is not a whole number of pages
    PartialPage,
    /// More pixels than [`MAX_PIXELS`]
    TooLarge,
}

/// Panel pixel memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u8, MAX_PIXELS>,
}

impl PixelBuffer {
    /// Create a dark panel of the given size
    pub fn new(width: u16, height: u16) -> Result<Self, GeometryError> {
        let (width, height) = (width as usize, height as usize);
        if width == 0 || height == 0 {
            return Err(GeometryError::Empty);
        }
        if height % PAGE_HEIGHT != 0 {
            return Err(GeometryError::PartialPage);
        }

        let mut pixels = Vec::new();
        pixels
            .resize(width * height, PIXEL_OFF)
            .map_err(|_| GeometryError::TooLarge)?;

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pages
    pub fn pages(&self) -> usize {
        self.height / PAGE_HEIGHT
    }

    /// Pixel at column `x`, row `y`
    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    /// All pixels, row-major
    pub fn as_slice(&self) -> &[u8] {
        &self.pixels
    }

    /// Write one page from column data
    ///
    /// `columns[x]` sets the 8 pixels of column `x` in `page`, LSB on top.
    /// Columns past the panel width are ignored. Returns false if `page` is
    /// off the panel.
    pub fn write_page(&mut self, page: usize, columns: &[u8]) -> bool {
        if page >= self.pages() {
            return false;
        }

        for (x, &bits) in columns.iter().take(self.width).enumerate() {
            for bit in 0..PAGE_HEIGHT {
                let y = page * PAGE_HEIGHT + bit;
                self.pixels[y * self.width + x] = if bits & (1 << bit) != 0 {
                    PIXEL_ON
                } else {
                    PIXEL_OFF
                };
            }
        }
        true
    }

    /// Darken every pixel
    pub fn clear(&mut self) {
        self.pixels.fill(PIXEL_OFF);
    }
}
