use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Domain interface for face detection backends.
///
/// Boxes are in absolute pixel coordinates of the given frame and already
/// filtered by the backend's confidence threshold. Backends may keep per-call
/// scratch state, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>>;

    /// Frees model and runtime handles. `detect` must not be called afterwards.
    fn release(&mut self) {}
}
