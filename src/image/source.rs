// src/image/source.rs

//! Image sources feeding the encoder.
//!
//! The encoder does not decode file formats. Anything that can report its
//! dimensions, whether it carries one or three components, and a floating-point
//! sample per `(component, x, y)` can be encoded. Samples are taken as-is: for
//! color sources component 0 is luma and components 1 and 2 are the chroma
//! channels, already in the working color representation.

use crate::encode::container::MAX_STAGES;
use crate::utils::error::{ImsError, Result};
use ::image::{GrayImage, ImageBuffer, RgbImage};

pub trait ImageSource {
    /// Logical width in samples.
    fn width(&self) -> usize;

    /// Logical height in samples.
    fn height(&self) -> usize;

    /// `true` for three components, `false` for one.
    fn is_color(&self) -> bool;

    /// Sample of `component` at `(x, y)`; only called inside the logical bounds.
    fn sample(&self, component: usize, x: usize, y: usize) -> f32;

    /// Number of wavelet decomposition stages to apply.
    fn num_stages(&self) -> u32 {
        default_num_stages(self.width(), self.height())
    }

    fn num_components(&self) -> usize {
        if self.is_color() { 3 } else { 1 }
    }
}

/// Decomposes until the smaller side is exhausted, capped at [`MAX_STAGES`].
///
/// A 32x32 image gets 5 stages, leaving a single root coefficient.
pub fn default_num_stages(width: usize, height: usize) -> u32 {
    let min_side = width.min(height);
    if min_side < 2 {
        return 0;
    }
    min_side.ilog2().min(MAX_STAGES)
}

/// Planar in-memory image with `f32` samples in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarImage {
    width: usize,
    height: usize,
    planes: Vec<Vec<f32>>,
    num_stages: Option<u32>,
}

impl PlanarImage {
    /// Single-component image.
    pub fn gray(width: usize, height: usize, samples: Vec<f32>) -> Result<Self> {
        Self::from_planes(width, height, vec![samples])
    }

    /// Three-component image (luma, chroma 1, chroma 2).
    pub fn color(width: usize, height: usize, planes: [Vec<f32>; 3]) -> Result<Self> {
        Self::from_planes(width, height, planes.into())
    }

    fn from_planes(width: usize, height: usize, planes: Vec<Vec<f32>>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ImsError::InvalidImage(format!(
                "empty image {}x{}",
                width, height
            )));
        }
        for (component, plane) in planes.iter().enumerate() {
            if plane.len() != width * height {
                return Err(ImsError::InvalidImage(format!(
                    "component {} has {} samples, expected {}",
                    component,
                    plane.len(),
                    width * height
                )));
            }
        }
        Ok(Self {
            width,
            height,
            planes,
            num_stages: None,
        })
    }

    /// Overrides the default stage count.
    pub fn with_num_stages(mut self, num_stages: u32) -> Self {
        self.num_stages = Some(num_stages);
        self
    }

    pub fn from_gray_image(img: &GrayImage) -> Self {
        let (w, h) = img.dimensions();
        Self {
            width: w as usize,
            height: h as usize,
            planes: vec![img.as_raw().iter().map(|&v| v as f32).collect()],
            num_stages: None,
        }
    }

    /// Splits an RGB buffer into three planes without any color conversion.
    pub fn from_rgb_image(img: &RgbImage) -> Self {
        let (w, h) = img.dimensions();
        let pixels: &[[u8; 3]] = bytemuck::cast_slice(img.as_raw());
        let mut planes = vec![Vec::with_capacity(pixels.len()); 3];
        for px in pixels {
            for (plane, &v) in planes.iter_mut().zip(px) {
                plane.push(v as f32);
            }
        }
        Self {
            width: w as usize,
            height: h as usize,
            planes,
            num_stages: None,
        }
    }
}

impl ImageSource for PlanarImage {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn is_color(&self) -> bool {
        self.planes.len() == 3
    }

    #[inline]
    fn sample(&self, component: usize, x: usize, y: usize) -> f32 {
        self.planes[component][y * self.width + x]
    }

    fn num_stages(&self) -> u32 {
        self.num_stages
            .unwrap_or_else(|| default_num_stages(self.width, self.height))
    }
}

impl ImageSource for GrayImage {
    fn width(&self) -> usize {
        ImageBuffer::width(self) as usize
    }

    fn height(&self) -> usize {
        ImageBuffer::height(self) as usize
    }

    fn is_color(&self) -> bool {
        false
    }

    #[inline]
    fn sample(&self, _component: usize, x: usize, y: usize) -> f32 {
        self.get_pixel(x as u32, y as u32)[0] as f32
    }
}

impl ImageSource for RgbImage {
    fn width(&self) -> usize {
        ImageBuffer::width(self) as usize
    }

    fn height(&self) -> usize {
        ImageBuffer::height(self) as usize
    }

    fn is_color(&self) -> bool {
        true
    }

    #[inline]
    fn sample(&self, component: usize, x: usize, y: usize) -> f32 {
        self.get_pixel(x as u32, y as u32)[component] as f32
    }
}
