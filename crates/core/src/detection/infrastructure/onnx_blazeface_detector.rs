/// BlazeFace (MediaPipe face detection) using ONNX Runtime via `ort`.
///
/// Tuned for close-range faces such as webcam or interview footage. The model
/// predicts anchor-relative boxes in normalized coordinates which are decoded
/// and scaled to the frame's pixel grid here.
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::{BLAZEFACE_FULL_RANGE_MODEL_NAME, BLAZEFACE_SHORT_RANGE_MODEL_NAME};
use crate::shared::frame::Frame;

use super::math::{nms, ScoredBox};
use super::onnx_session::load_session;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.3;

/// Values per anchor in the regressor output (4 box + 6 keypoints × 2).
const REGRESSOR_STRIDE: usize = 16;

/// Which BlazeFace network the model file contains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlazefaceRange {
    /// Faces within ~2 m of the camera; 128×128 input.
    Short,
    /// Faces up to ~5 m; 192×192 input.
    Full,
}

impl BlazefaceRange {
    pub fn input_size(self) -> u32 {
        match self {
            BlazefaceRange::Short => 128,
            BlazefaceRange::Full => 192,
        }
    }

    pub fn model_name(self) -> &'static str {
        match self {
            BlazefaceRange::Short => BLAZEFACE_SHORT_RANGE_MODEL_NAME,
            BlazefaceRange::Full => BLAZEFACE_FULL_RANGE_MODEL_NAME,
        }
    }

    /// Feature map layout as `(stride, anchors_per_cell)`.
    fn anchor_layout(self) -> &'static [(usize, usize)] {
        match self {
            BlazefaceRange::Short => &[(8, 2), (16, 6)],
            BlazefaceRange::Full => &[(4, 1)],
        }
    }
}

/// BlazeFace face detector backed by an ONNX Runtime session.
pub struct OnnxBlazefaceDetector {
    session: Option<ort::session::Session>,
    range: BlazefaceRange,
    confidence: f64,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    /// Load a BlazeFace ONNX model of the given range.
    pub fn new(
        model_path: &Path,
        range: BlazefaceRange,
        confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        Ok(Self {
            session: Some(session),
            range,
            confidence,
            anchors: generate_anchors(range),
        })
    }
}

impl FaceDetector for OnnxBlazefaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        let session = self
            .session
            .as_mut()
            .ok_or("BlazeFace detector used after release")?;
        let input_size = self.range.input_size();

        let input_tensor = preprocess(frame, input_size);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = session.run(ort::inputs![input_value])?;

        // regressors: [1, anchors, 16], classificators: [1, anchors, 1]
        if outputs.len() < 2 {
            return Err(
                format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }
        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        let candidates = decode(
            reg_data,
            score_data,
            &self.anchors,
            input_size as f32,
            self.confidence,
        );
        let kept = nms(candidates, NMS_IOU_THRESH);
        Ok(to_pixel_boxes(&kept, frame.width(), frame.height()))
    }

    fn release(&mut self) {
        self.session = None;
    }
}

/// Decode anchor-relative regressions into candidates above `confidence`,
/// with corners normalized to `[0, 1]` of the frame.
fn decode(
    reg_data: &[f32],
    score_data: &[f32],
    anchors: &[[f32; 2]],
    input_size: f32,
    confidence: f64,
) -> Vec<ScoredBox> {
    let mut candidates = Vec::new();

    for (i, (&raw_score, anchor)) in score_data.iter().zip(anchors).enumerate() {
        let score = sigmoid(raw_score) as f64;
        if score < confidence {
            continue;
        }
        let offset = i * REGRESSOR_STRIDE;
        if offset + 4 > reg_data.len() {
            break;
        }

        let cx = (anchor[0] + reg_data[offset] / input_size) as f64;
        let cy = (anchor[1] + reg_data[offset + 1] / input_size) as f64;
        let w = (reg_data[offset + 2] / input_size) as f64;
        let h = (reg_data[offset + 3] / input_size) as f64;

        let xmin = cx - w / 2.0;
        let ymin = cy - h / 2.0;
        candidates.push(ScoredBox::new(xmin, ymin, xmin + w, ymin + h, score));
    }
    candidates
}

/// Scales normalized candidates to the frame, truncating each coordinate,
/// and drops boxes without area.
fn to_pixel_boxes(dets: &[ScoredBox], frame_w: u32, frame_h: u32) -> Vec<BoundingBox> {
    dets.iter()
        .map(|d| {
            let [x1, y1, x2, y2] = d.corners;
            BoundingBox::from_relative(x1, y1, x2 - x1, y2 - y1, frame_w, frame_h)
        })
        .filter(|b| !b.is_empty())
        .collect()
}

/// Resize frame to `size × size` and normalize to [0,1] NCHW float32.
fn preprocess(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));
    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }
    tensor
}

/// Anchor centers in normalized coordinates, one per predicted box.
fn generate_anchors(range: BlazefaceRange) -> Vec<[f32; 2]> {
    let input_size = range.input_size() as usize;
    let mut anchors = Vec::new();

    for &(stride, per_cell) in range.anchor_layout() {
        let grid_size = input_size / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..per_cell {
                    anchors.push([cx, cy]);
                }
            }
        }
    }
    anchors
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x.clamp(-100.0, 100.0)).exp())
}
