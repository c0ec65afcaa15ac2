// src/image/raster.rs

//! Padded floating-point component planes.

use super::source::ImageSource;
use crate::encode::container::{MAX_DIMENSION, MAX_STAGES};
use crate::utils::error::{ImsError, Result};
use log::debug;

/// One component's samples over the padded grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl Plane {
    pub fn new(width: usize, height: usize) -> Self {
        Plane {
            data: vec![0.0; width * height],
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "sample ({}, {}) outside {}x{} plane",
            x,
            y,
            self.width,
            self.height
        );
        y * self.width + x
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub fn at_mut(&mut self, x: usize, y: usize) -> &mut f32 {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    pub fn row(&self, y: usize) -> &[f32] {
        let start = self.index(0, y);
        &self.data[start..start + self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = self.index(0, y);
        &mut self.data[start..start + self.width]
    }

    pub fn samples(&self) -> &[f32] {
        &self.data
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

/// The component buffer: logical size, padding, and one [`Plane`] per component.
///
/// `size + extra` is a multiple of `2^num_stages` in both directions, so every
/// decomposition stage works on an even-sized region.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    size_x: usize,
    size_y: usize,
    extra_x: usize,
    extra_y: usize,
    planes: Vec<Plane>,
}

impl Raster {
    /// Zero-filled raster with the given geometry.
    pub fn new(is_color: bool, size_x: usize, size_y: usize, extra_x: usize, extra_y: usize) -> Self {
        let components = if is_color { 3 } else { 1 };
        let plane = Plane::new(size_x + extra_x, size_y + extra_y);
        Raster {
            size_x,
            size_y,
            extra_x,
            extra_y,
            planes: vec![plane; components],
        }
    }

    /// Scratch raster with the same geometry and component count.
    pub fn like(&self) -> Self {
        Self::new(
            self.is_color(),
            self.size_x,
            self.size_y,
            self.extra_x,
            self.extra_y,
        )
    }

    /// Padding needed to make `size` divisible by `2^num_stages`.
    pub fn padding_for(size: usize, num_stages: u32) -> usize {
        let block = 1usize << num_stages;
        (block - size % block) % block
    }

    /// Copies `source` into a raster padded for `num_stages`, replicating the
    /// last column and row into the padding.
    pub fn from_source<S: ImageSource + ?Sized>(source: &S, num_stages: u32) -> Result<Self> {
        let (width, height) = (source.width(), source.height());
        if width == 0 || height == 0 {
            return Err(ImsError::InvalidImage(format!(
                "empty image {}x{}",
                width, height
            )));
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(ImsError::InvalidImage(format!(
                "{}x{} exceeds the {} sample limit",
                width, height, MAX_DIMENSION
            )));
        }
        if num_stages > MAX_STAGES {
            return Err(ImsError::InvalidArg(format!(
                "{} decomposition stages requested, at most {} supported",
                num_stages, MAX_STAGES
            )));
        }

        let extra_x = Self::padding_for(width, num_stages);
        let extra_y = Self::padding_for(height, num_stages);
        let mut raster = Self::new(source.is_color(), width, height, extra_x, extra_y);

        for (component, plane) in raster.planes.iter_mut().enumerate() {
            for y in 0..height {
                for x in 0..width {
                    let v = source.sample(component, x, y);
                    if !v.is_finite() {
                        return Err(ImsError::InvalidImage(format!(
                            "non-finite sample {} in component {} at ({}, {})",
                            v, component, x, y
                        )));
                    }
                    *plane.at_mut(x, y) = v;
                }
                let edge = plane.at(width - 1, y);
                plane.row_mut(y)[width..].fill(edge);
            }
            let stride = plane.width;
            for y in height..height + extra_y {
                let (done, rest) = plane.data.split_at_mut(y * stride);
                rest[..stride].copy_from_slice(&done[(height - 1) * stride..height * stride]);
            }
        }

        debug!(
            "Raster {}x{} padded to {}x{} with {} component(s) for {} stage(s)",
            width,
            height,
            raster.padded_width(),
            raster.padded_height(),
            raster.num_components(),
            num_stages
        );
        Ok(raster)
    }

    pub fn size_x(&self) -> usize {
        self.size_x
    }

    pub fn size_y(&self) -> usize {
        self.size_y
    }

    pub fn extra_x(&self) -> usize {
        self.extra_x
    }

    pub fn extra_y(&self) -> usize {
        self.extra_y
    }

    pub fn padded_width(&self) -> usize {
        self.size_x + self.extra_x
    }

    pub fn padded_height(&self) -> usize {
        self.size_y + self.extra_y
    }

    /// Logical sample count per component; the basis of the rate budget.
    pub fn get_size(&self) -> usize {
        self.size_x * self.size_y
    }

    pub fn is_color(&self) -> bool {
        self.planes.len() == 3
    }

    pub fn num_components(&self) -> usize {
        self.planes.len()
    }

    pub fn plane(&self, component: usize) -> &Plane {
        &self.planes[component]
    }

    pub fn planes_mut(&mut self) -> &mut [Plane] {
        &mut self.planes
    }
}
