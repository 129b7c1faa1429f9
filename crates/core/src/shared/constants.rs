pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// BlazeFace models have no canonical ONNX download; they must be placed in
/// the model cache or the bundled `models/` directory.
pub const BLAZEFACE_SHORT_RANGE_MODEL_NAME: &str = "blazeface_short_range.onnx";
pub const BLAZEFACE_FULL_RANGE_MODEL_NAME: &str = "blazeface_full_range.onnx";

/// Directory searched for models shipped next to the working directory.
pub const BUNDLED_MODEL_DIR: &str = "models";

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.3;
pub const DEFAULT_PADDING: f64 = 0.3;
pub const DEFAULT_BLUR_KERNEL_SIZE: usize = 99;
pub const DEFAULT_PIXEL_BLOCKS: usize = 10;

/// Progress is reported once per this many processed frames.
pub const PROGRESS_INTERVAL_FRAMES: usize = 30;

/// MPEG-4 Part 2, the `mp4v` encoding.
pub const OUTPUT_CODEC: &str = "mpeg4";
pub const OUTPUT_EXTENSION: &str = "mp4";
