/// Axis-aligned face rectangle in absolute pixel coordinates.
///
/// Origin is the top-left corner of the frame. Detectors may emit boxes that
/// extend past the frame; [`crate::detection::domain::box_padding`] brings
/// them back in bounds before any pixel is touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a box from `[x1, y1, x2, y2]` corners, truncating toward zero
    /// the way integer casts of model output do.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x: x1 as i32,
            y: y1 as i32,
            width: (x2 - x1) as i32,
            height: (y2 - y1) as i32,
        }
    }

    /// Builds a box from coordinates normalized to `[0, 1]` of the frame size.
    pub fn from_relative(
        xmin: f64,
        ymin: f64,
        width: f64,
        height: f64,
        frame_w: u32,
        frame_h: u32,
    ) -> Self {
        let fw = frame_w as f64;
        let fh = frame_h as f64;
        Self {
            x: (xmin * fw) as i32,
            y: (ymin * fh) as i32,
            width: (width * fw) as i32,
            height: (height * fh) as i32,
        }
    }

    /// True when the box covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }
}
