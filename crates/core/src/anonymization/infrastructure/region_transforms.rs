use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, Pixel, Rgb, Rgba};
use ndarray::{Array3, ArrayView3};

use crate::anonymization::domain::anonymization_method::AnonymizationMethod;
use crate::anonymization::domain::region_transform::RegionTransform;

use super::gaussian::GaussianKernels;

/// Gaussian blur with a fixed nominal kernel size.
///
/// Regions smaller than the kernel are blurred with the largest odd kernel
/// that fits their longer side, so tiny detections never fail.
pub struct BlurTransform {
    kernels: GaussianKernels,
}

impl BlurTransform {
    pub fn new(kernel_size: usize) -> Self {
        Self {
            kernels: GaussianKernels::new(kernel_size),
        }
    }
}

impl RegionTransform for BlurTransform {
    fn apply(&self, region: ArrayView3<'_, u8>) -> Array3<u8> {
        let (h, w, c) = region.dim();
        let mut out = region.as_standard_layout().into_owned();
        let Some(data) = out.as_slice_mut() else {
            return out;
        };

        let effective = effective_kernel_size(self.kernels.size(), w, h);
        if effective == self.kernels.size() {
            self.kernels.blur(data, w, h, c);
        } else {
            GaussianKernels::new(effective).blur(data, w, h, c);
        }
        out
    }
}

/// Largest odd kernel no bigger than `requested` or the region's longer side.
fn effective_kernel_size(requested: usize, width: usize, height: usize) -> usize {
    let fit = requested.min(width.max(height)).max(1);
    if fit % 2 == 0 {
        fit - 1
    } else {
        fit
    }
}

/// Triangle-filter downscale to a `blocks` × `blocks` grid, then a
/// nearest-neighbor upscale back to the region size.
pub struct PixelateTransform {
    blocks: u32,
}

impl PixelateTransform {
    pub fn new(blocks: usize) -> Self {
        Self {
            blocks: u32::try_from(blocks).unwrap_or(u32::MAX).max(1),
        }
    }
}

impl RegionTransform for PixelateTransform {
    fn apply(&self, region: ArrayView3<'_, u8>) -> Array3<u8> {
        let (h, w, c) = region.dim();
        let raw: Vec<u8> = region.iter().copied().collect();
        let pixelated = match c {
            1 => pixelate::<Luma<u8>>(raw, w, h, self.blocks),
            3 => pixelate::<Rgb<u8>>(raw, w, h, self.blocks),
            4 => pixelate::<Rgba<u8>>(raw, w, h, self.blocks),
            _ => None,
        };
        pixelated
            .and_then(|data| Array3::from_shape_vec((h, w, c), data).ok())
            .unwrap_or_else(|| region.to_owned())
    }
}

fn pixelate<P>(raw: Vec<u8>, w: usize, h: usize, blocks: u32) -> Option<Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let (w, h) = (u32::try_from(w).ok()?, u32::try_from(h).ok()?);
    if w == 0 || h == 0 {
        return None;
    }
    let img = ImageBuffer::<P, Vec<u8>>::from_raw(w, h, raw)?;
    let small = imageops::resize(&img, blocks, blocks, FilterType::Triangle);
    Some(imageops::resize(&small, w, h, FilterType::Nearest).into_raw())
}

/// Overwrites every pixel with zero.
pub struct BlackTransform;

impl RegionTransform for BlackTransform {
    fn apply(&self, region: ArrayView3<'_, u8>) -> Array3<u8> {
        Array3::zeros(region.raw_dim())
    }
}

/// Builds the transform for a validated method.
pub fn create_transform(method: &AnonymizationMethod) -> Box<dyn RegionTransform> {
    match *method {
        AnonymizationMethod::Blur { kernel_size } => Box::new(BlurTransform::new(kernel_size)),
        AnonymizationMethod::Pixelate { blocks } => Box::new(PixelateTransform::new(blocks)),
        AnonymizationMethod::Black => Box::new(BlackTransform),
    }
}
