use ndarray::{Array3, ArrayView3};

/// Domain interface for rewriting one rectangular pixel region.
///
/// The region is `(height, width, channels)` and never empty; the returned
/// array has the same shape and replaces the region verbatim.
pub trait RegionTransform: Send {
    fn apply(&self, region: ArrayView3<'_, u8>) -> Array3<u8>;
}
