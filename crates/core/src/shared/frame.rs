use ndarray::{s, Array3, ArrayView3, ArrayViewMut3};

use super::bounding_box::BoundingBox;

/// A single decoded video frame: contiguous RGB bytes in row-major order.
///
/// Color conversion happens at I/O and detector boundaries only; the
/// anonymization layer treats pixel data as opaque channels.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels under `bbox` into an owned `(height, width, channels)` array.
    ///
    /// `bbox` must be non-empty and lie inside the frame.
    pub fn crop(&self, bbox: &BoundingBox) -> Array3<u8> {
        let (rows, cols) = Self::ranges(bbox);
        self.as_ndarray().slice(s![rows, cols, ..]).to_owned()
    }

    /// Overwrites the pixels under `bbox` with `region`, which must have the
    /// same shape as the box.
    pub fn paste(&mut self, bbox: &BoundingBox, region: ArrayView3<'_, u8>) {
        let (rows, cols) = Self::ranges(bbox);
        self.as_ndarray_mut()
            .slice_mut(s![rows, cols, ..])
            .assign(&region);
    }

    fn ranges(bbox: &BoundingBox) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let x = bbox.x as usize;
        let y = bbox.y as usize;
        (y..y + bbox.height as usize, x..x + bbox.width as usize)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
