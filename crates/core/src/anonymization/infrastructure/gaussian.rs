//! Separable Gaussian blur over packed interleaved pixel buffers.

/// Kernels above this size are applied on a downscaled copy.
const DOWNSCALE_KERNEL_THRESHOLD: usize = 50;

/// Precomputed kernels for one effective blur strength.
pub struct GaussianKernels {
    kernel: Vec<f32>,
    small_kernel: Vec<f32>,
    scale: usize,
}

impl GaussianKernels {
    /// `kernel_size` must be odd and >= 1.
    pub fn new(kernel_size: usize) -> Self {
        let scale = (kernel_size / DOWNSCALE_KERNEL_THRESHOLD).max(1);
        let small_size = (kernel_size / scale) | 1;
        Self {
            kernel: kernel_1d(kernel_size),
            small_kernel: kernel_1d(small_size),
            scale,
        }
    }

    pub fn size(&self) -> usize {
        self.kernel.len()
    }

    /// Blurs `data` in place, going through a downscaled copy when the
    /// kernel is large and the buffer is big enough to shrink.
    pub fn blur(&self, data: &mut [u8], width: usize, height: usize, channels: usize) {
        let mut temp = Vec::new();
        if self.scale <= 1 || height < self.scale * 2 || width < self.scale * 2 {
            separable_blur(data, width, height, channels, &self.kernel, &mut temp);
        } else {
            let (mut small, sw, sh) = downscale(data, width, height, channels, self.scale);
            separable_blur(&mut small, sw, sh, channels, &self.small_kernel, &mut temp);
            let upscaled = upscale(&small, sw, sh, channels, width, height);
            data.copy_from_slice(&upscaled);
        }
    }
}

/// 1D Gaussian kernel normalized to sum 1.
///
/// Sigma follows OpenCV's rule for an unspecified sigma:
/// `0.3 * ((size - 1) / 2 - 1) + 0.8`.
pub fn kernel_1d(kernel_size: usize) -> Vec<f32> {
    debug_assert!(kernel_size >= 1 && kernel_size % 2 == 1);
    let sigma = 0.3 * ((kernel_size as f64 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (kernel_size / 2) as f64;
    let weights: Vec<f64> = (0..kernel_size)
        .map(|i| {
            let x = i as f64 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.iter().map(|&v| (v / sum) as f32).collect()
}

/// Horizontal then vertical pass with edge replication, reusing `temp`.
fn separable_blur(
    data: &mut [u8],
    width: usize,
    height: usize,
    channels: usize,
    kernel: &[f32],
    temp: &mut Vec<f32>,
) {
    if kernel.len() <= 1 || width == 0 || height == 0 {
        return;
    }
    let half = (kernel.len() / 2) as isize;
    let clamp = |v: isize, len: usize| v.clamp(0, len as isize - 1) as usize;

    temp.resize(width * height * channels, 0.0);

    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let sum: f32 = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, &w)| {
                        let sx = clamp(x as isize + k as isize - half, width);
                        data[(y * width + sx) * channels + c] as f32 * w
                    })
                    .sum();
                temp[(y * width + x) * channels + c] = sum;
            }
        }
    }

    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let sum: f32 = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, &w)| {
                        let sy = clamp(y as isize + k as isize - half, height);
                        temp[(sy * width + x) * channels + c] * w
                    })
                    .sum();
                data[(y * width + x) * channels + c] = sum.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Downscale by an integer factor using area averaging.
fn downscale(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    scale: usize,
) -> (Vec<u8>, usize, usize) {
    let new_w = width / scale;
    let new_h = height / scale;
    let mut out = vec![0u8; new_w * new_h * channels];

    for y in 0..new_h {
        for x in 0..new_w {
            for c in 0..channels {
                let mut sum = 0u32;
                for dy in 0..scale {
                    for dx in 0..scale {
                        let idx = ((y * scale + dy) * width + x * scale + dx) * channels + c;
                        sum += data[idx] as u32;
                    }
                }
                out[(y * new_w + x) * channels + c] = (sum / (scale * scale) as u32) as u8;
            }
        }
    }

    (out, new_w, new_h)
}

/// Bilinear upscale to an arbitrary target size (corner-aligned).
fn upscale(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    target_w: usize,
    target_h: usize,
) -> Vec<u8> {
    let mut out = vec![0u8; target_w * target_h * channels];
    let ratio_x = (width as f32 - 1.0) / (target_w as f32 - 1.0).max(1.0);
    let ratio_y = (height as f32 - 1.0) / (target_h as f32 - 1.0).max(1.0);

    for y in 0..target_h {
        let src_y = y as f32 * ratio_y;
        let y0 = (src_y.floor() as usize).min(height - 1);
        let y1 = (y0 + 1).min(height - 1);
        let fy = src_y - y0 as f32;
        for x in 0..target_w {
            let src_x = x as f32 * ratio_x;
            let x0 = (src_x.floor() as usize).min(width - 1);
            let x1 = (x0 + 1).min(width - 1);
            let fx = src_x - x0 as f32;

            for c in 0..channels {
                let px = |yy: usize, xx: usize| data[(yy * width + xx) * channels + c] as f32;
                let val = px(y0, x0) * (1.0 - fx) * (1.0 - fy)
                    + px(y0, x1) * fx * (1.0 - fy)
                    + px(y1, x0) * (1.0 - fx) * fy
                    + px(y1, x1) * fx * fy;
                out[(y * target_w + x) * channels + c] = val.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kernel_sums_to_one() {
        let sum: f32 = kernel_1d(7).iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_kernel_is_symmetric_and_peaks_at_center() {
        let k = kernel_1d(9);
        for i in 0..k.len() / 2 {
            assert_relative_eq!(k[i], k[k.len() - 1 - i], epsilon = 1e-6);
            assert!(k[i] < k[4]);
        }
    }

    #[test]
    fn test_size_one_kernel_is_identity() {
        let kernels = GaussianKernels::new(1);
        let mut data: Vec<u8> = (0..5 * 5 * 3).map(|v| v as u8).collect();
        let original = data.clone();
        kernels.blur(&mut data, 5, 5, 3);
        assert_eq!(data, original);
    }

    #[test]
    fn test_uniform_buffer_unchanged() {
        let kernels = GaussianKernels::new(5);
        let mut data = vec![128u8; 10 * 10 * 3];
        kernels.blur(&mut data, 10, 10, 3);
        assert!(data.iter().all(|&v| (v as i32 - 128).abs() <= 1));
    }

    #[test]
    fn test_bright_pixel_spreads() {
        let kernels = GaussianKernels::new(5);
        let mut data = vec![0u8; 10 * 10 * 3];
        let center = (5 * 10 + 5) * 3;
        data[center] = 255;

        kernels.blur(&mut data, 10, 10, 3);

        assert!(data[center] < 255);
        assert!(data[(5 * 10 + 6) * 3] > 0);
    }

    #[test]
    fn test_large_kernel_uses_downscaled_path() {
        let kernels = GaussianKernels::new(99);
        assert_eq!(kernels.scale, 1);
        let kernels = GaussianKernels::new(151);
        assert_eq!(kernels.scale, 3);
        assert_eq!(kernels.small_kernel.len(), 51);

        let mut data = vec![100u8; 30 * 30 * 3];
        kernels.blur(&mut data, 30, 30, 3);
        assert!(data.iter().all(|&v| (v as i32 - 100).abs() <= 1));
    }

    #[test]
    fn test_downscale_then_upscale_uniform() {
        let data = vec![100u8; 8 * 8 * 3];
        let (small, sw, sh) = downscale(&data, 8, 8, 3, 2);
        assert_eq!((sw, sh), (4, 4));
        let big = upscale(&small, sw, sh, 3, 8, 8);
        assert!(big.iter().all(|&v| (v as i32 - 100).abs() <= 1));
    }
}
