//! Two-dimensional bit raster produced by the writer.

use core::fmt;

use image::{ImageBuffer, Luma};

use crate::bitarray::BitArray;
use crate::error::ArgumentError;

/// A `width x height` grid of pixels, one [`BitArray`] per row.
///
/// Every pixel starts unset (light). `x` is the column and `y` the row, with `(0, 0)` at the
/// top-left corner.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    rows: Vec<BitArray>,
}

impl BitMatrix {
    /// Creates a matrix of unset pixels.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::InvalidDimensions`] if either dimension is zero.
    pub fn new(width: usize, height: usize) -> Result<Self, ArgumentError> {
        if width < 1 || height < 1 {
            return Err(ArgumentError::InvalidDimensions {
                width: i32::try_from(width).unwrap_or(i32::MAX),
                height: i32::try_from(height).unwrap_or(i32::MAX),
            });
        }
        let rows = (0..height)
            .map(|_| BitArray::with_size(width))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            width,
            height,
            rows,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns `true` if the pixel at `(x, y)` is set (dark).
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the matrix.
    pub fn get(&self, x: usize, y: usize) -> bool {
        assert!(x < self.width && y < self.height, "Pixel out of bounds");
        self.rows[y].get(x)
    }

    /// Sets the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the matrix.
    pub fn set(&mut self, x: usize, y: usize) {
        assert!(x < self.width && y < self.height, "Pixel out of bounds");
        self.rows[y].set(x, true);
    }

    /// Sets every pixel of the rectangle whose top-left corner is `(left, top)`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::InvalidRegion`] if the rectangle is empty or does not fit.
    pub fn set_region(
        &mut self,
        left: usize,
        top: usize,
        width: usize,
        height: usize
    ) -> Result<(), ArgumentError> {
        let right = left.checked_add(width);
        let bottom = top.checked_add(height);
        let fits = matches!(
            (right, bottom),
            (Some(r), Some(b)) if r <= self.width && b <= self.height
        );
        if width < 1 || height < 1 || !fits {
            return Err(ArgumentError::InvalidRegion {
                left,
                top,
                width,
                height,
            });
        }
        for row in &mut self.rows[top..top + height] {
            row.set_range(left, left + width)?;
        }
        Ok(())
    }

    /// The pixels of row `y`.
    pub fn row(&self, y: usize) -> &BitArray {
        &self.rows[y]
    }

    /// Number of set pixels.
    pub fn count_set(&self) -> usize {
        self.rows
            .iter()
            .map(|row| (0..self.width).filter(|&x| row.get(x)).count())
            .sum()
    }

    /// Converts the matrix to an 8-bit grayscale image: set pixels are black, the rest white.
    pub fn to_image(&self) -> ImageBuffer<Luma<u8>, Vec<u8>> {
        let mut img = ImageBuffer::new(self.width as u32, self.height as u32);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = if self.get(x as usize, y as usize) {
                Luma([0u8]) // Black
            } else {
                Luma([255u8]) // White
            };
        }
        img
    }
}

impl fmt::Display for BitMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            for x in 0..self.width {
                f.write_str(if row.get(x) { "X " } else { "  " })?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}
