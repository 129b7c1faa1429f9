use crate::anonymization::domain::anonymization_method::AnonymizationMethod;
use crate::anonymization::domain::region_transform::RegionTransform;
use crate::anonymization::infrastructure::region_transforms::create_transform;
use crate::detection::domain::box_padding::padded_region;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::Frame;

/// Anonymizes single frames: detect → pad → transform → paste back.
///
/// Owns the detector and releases it exactly once, either through
/// [`release`](Self::release) or on drop.
pub struct FrameAnonymizer {
    detector: Box<dyn FaceDetector>,
    transform: Box<dyn RegionTransform>,
    padding: f64,
    last_face_count: usize,
    released: bool,
}

impl FrameAnonymizer {
    pub fn new(detector: Box<dyn FaceDetector>, method: &AnonymizationMethod, padding: f64) -> Self {
        Self::with_transform(detector, create_transform(method), padding)
    }

    pub fn with_transform(
        detector: Box<dyn FaceDetector>,
        transform: Box<dyn RegionTransform>,
        padding: f64,
    ) -> Self {
        Self {
            detector,
            transform,
            padding,
            last_face_count: 0,
            released: false,
        }
    }

    /// Rewrites every detected face region of `frame` in place and returns
    /// the same frame for chaining.
    ///
    /// Detections that collapse to nothing after padding and clamping are
    /// skipped; pixels outside padded boxes are never touched.
    pub fn process<'a>(
        &mut self,
        frame: &'a mut Frame,
    ) -> Result<&'a mut Frame, Box<dyn std::error::Error>> {
        if self.released {
            return Err("face detector already released".into());
        }

        let detections = self.detector.detect(frame)?;
        let (frame_w, frame_h) = (frame.width(), frame.height());
        let mut anonymized = 0;

        for bbox in &detections {
            let Some(region) = padded_region(bbox, self.padding, frame_w, frame_h) else {
                log::debug!("Frame {}: skipping out-of-frame box {bbox:?}", frame.index());
                continue;
            };
            let replacement = self.transform.apply(frame.crop(&region).view());
            frame.paste(&region, replacement.view());
            anonymized += 1;
        }

        self.last_face_count = anonymized;
        Ok(frame)
    }

    /// Regions rewritten by the most recent successful `process` call.
    pub fn last_face_count(&self) -> usize {
        self.last_face_count
    }

    /// Frees the detector. Later calls are no-ops.
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.detector.release();
        }
    }
}

impl Drop for FrameAnonymizer {
    fn drop(&mut self) {
        self.release();
    }
}
