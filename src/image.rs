//! Image buffer types for distance aggregation.
//!
//! A distance map is a single [`ImageF`] plane; a colour image is an
//! [`Image3F`] of three same-sized planes. Rows are stored with a stride
//! padded to 16 floats so every row starts at the same alignment relative to
//! the buffer.

use crate::PnormError;
use imgref::ImgRef;
use rgb::{RGB, RGB8};
use std::ops::{Index, IndexMut};

/// Row stride granularity in floats.
const STRIDE_ALIGN: usize = 16;

#[inline]
fn padded_stride(width: usize) -> usize {
    (width + STRIDE_ALIGN - 1) & !(STRIDE_ALIGN - 1)
}

/// Single-channel floating point image.
#[derive(Debug, Clone)]
pub struct ImageF {
    data: Vec<f32>,
    width: usize,
    height: usize,
    stride: usize, // pixels per row (may be > width for alignment)
}

impl ImageF {
    /// Creates a new image filled with zeros.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0.0)
    }

    /// Creates an image filled with a constant value.
    #[must_use]
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        let stride = padded_stride(width);
        Self {
            data: vec![value; stride * height],
            width,
            height,
            stride,
        }
    }

    /// Creates an image from tightly packed row-major data.
    ///
    /// # Panics
    /// Panics if data length doesn't match width * height.
    #[must_use]
    pub fn from_vec(data: Vec<f32>, width: usize, height: usize) -> Self {
        match Self::try_from_vec(data, width, height) {
            Ok(img) => img,
            Err(e) => panic!("{e}"),
        }
    }

    /// Creates an image from tightly packed row-major data.
    ///
    /// # Errors
    /// Returns [`PnormError::InvalidBufferSize`] if data length doesn't match
    /// width * height.
    pub fn try_from_vec(data: Vec<f32>, width: usize, height: usize) -> Result<Self, PnormError> {
        let expected = width * height;
        if data.len() != expected {
            return Err(PnormError::InvalidBufferSize {
                expected,
                actual: data.len(),
            });
        }
        // For imported data, don't add padding
        Ok(Self {
            data,
            width,
            height,
            stride: width,
        })
    }

    /// Copies an `imgref` buffer (e.g. a butteraugli diffmap) into an
    /// aligned image. The source may have its own stride.
    #[must_use]
    pub fn from_imgref(src: ImgRef<'_, f32>) -> Self {
        let mut img = Self::new(src.width(), src.height());
        for (y, row) in src.rows().enumerate() {
            img.row_mut(y).copy_from_slice(row);
        }
        img
    }

    /// Image width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels per row (may include padding).
    #[inline]
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Total number of pixels, excluding padding.
    #[inline]
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Returns a reference to a row.
    #[inline]
    #[must_use]
    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Returns a mutable reference to a row.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    /// Gets a pixel value.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.stride + x]
    }

    /// Sets a pixel value.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.stride + x] = value;
    }

    /// Checks if two images have the same dimensions.
    #[must_use]
    pub fn same_size(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Fills the image with a constant value.
    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }
}

impl Index<(usize, usize)> for ImageF {
    type Output = f32;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.data[y * self.stride + x]
    }
}

impl IndexMut<(usize, usize)> for ImageF {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        &mut self.data[y * self.stride + x]
    }
}

/// Three-channel floating point image in the canonical encoding.
///
/// Plane 1 is the luma-like plane; planes 0 and 2 are chroma-like.
#[derive(Debug, Clone)]
pub struct Image3F {
    planes: [ImageF; 3],
}

impl Image3F {
    /// Creates a new 3-channel image filled with zeros.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            planes: [
                ImageF::new(width, height),
                ImageF::new(width, height),
                ImageF::new(width, height),
            ],
        }
    }

    /// Creates from three separate planes.
    ///
    /// # Panics
    /// Panics if the planes differ in size.
    #[must_use]
    pub fn from_planes(plane0: ImageF, plane1: ImageF, plane2: ImageF) -> Self {
        assert!(plane0.same_size(&plane1));
        assert!(plane0.same_size(&plane2));
        Self {
            planes: [plane0, plane1, plane2],
        }
    }

    /// Splits 8-bit sRGB pixels into R/G/B planes scaled to [0, 1].
    ///
    /// The pixels are taken as already being in the canonical encoding;
    /// no colour-space conversion happens here.
    #[must_use]
    pub fn from_srgb8(src: ImgRef<'_, RGB8>) -> Self {
        let mut img = Self::new(src.width(), src.height());
        for (y, row) in src.rows().enumerate() {
            for (x, px) in row.iter().enumerate() {
                img.planes[0].set(x, y, f32::from(px.r) / 255.0);
                img.planes[1].set(x, y, f32::from(px.g) / 255.0);
                img.planes[2].set(x, y, f32::from(px.b) / 255.0);
            }
        }
        img
    }

    /// Splits float RGB pixels into R/G/B planes, values unchanged.
    #[must_use]
    pub fn from_rgb_f32(src: ImgRef<'_, RGB<f32>>) -> Self {
        let mut img = Self::new(src.width(), src.height());
        for (y, row) in src.rows().enumerate() {
            for (x, px) in row.iter().enumerate() {
                img.planes[0].set(x, y, px.r);
                img.planes[1].set(x, y, px.g);
                img.planes[2].set(x, y, px.b);
            }
        }
        img
    }

    /// Image width.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.planes[0].width()
    }

    /// Image height.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.planes[0].height()
    }

    /// Checks if two images have the same dimensions.
    ///
    /// Compares plane by plane, since [`Image3F::plane_mut`] allows a plane to
    /// be replaced.
    #[must_use]
    pub fn same_size(&self, other: &Self) -> bool {
        self.planes
            .iter()
            .zip(&other.planes)
            .all(|(a, b)| a.same_size(b))
    }

    /// Returns a reference to a specific plane.
    #[inline]
    #[must_use]
    pub fn plane(&self, index: usize) -> &ImageF {
        &self.planes[index]
    }

    /// Returns a mutable reference to a specific plane.
    #[inline]
    pub fn plane_mut(&mut self, index: usize) -> &mut ImageF {
        &mut self.planes[index]
    }

    /// Returns a row from a specific plane.
    #[inline]
    #[must_use]
    pub fn plane_row(&self, plane: usize, y: usize) -> &[f32] {
        self.planes[plane].row(y)
    }
}

impl Index<usize> for Image3F {
    type Output = ImageF;

    fn index(&self, index: usize) -> &Self::Output {
        &self.planes[index]
    }
}

impl IndexMut<usize> for Image3F {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.planes[index]
    }
}
