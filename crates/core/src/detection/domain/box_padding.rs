use crate::shared::bounding_box::BoundingBox;

/// Expands `bbox` by `padding` of its own size on every side, then clamps it
/// to a `frame_w` × `frame_h` frame.
///
/// The margin is `floor(size * padding)` per axis. Clamping happens after the
/// expansion and against the already-shifted origin, so a box pushed past the
/// left/top edge keeps its full padded extent measured from 0. The result may
/// be empty (see [`BoundingBox::is_empty`]) when the box lies outside the
/// frame; callers must skip such boxes.
pub fn apply_padding(bbox: &BoundingBox, padding: f64, frame_w: u32, frame_h: u32) -> BoundingBox {
    let (x, width) = pad_axis(bbox.x, bbox.width, padding, frame_w);
    let (y, height) = pad_axis(bbox.y, bbox.height, padding, frame_h);
    BoundingBox {
        x,
        y,
        width,
        height,
    }
}

/// Pads one axis in `i64` so any finite margin clamps to the frame edge
/// instead of overflowing.
fn pad_axis(origin: i32, size: i32, padding: f64, limit: u32) -> (i32, i32) {
    // `as` saturates, and the bound keeps `2 * pad` well inside i64.
    let pad = ((size as f64 * padding).floor() as i64).clamp(0, i64::from(u32::MAX));
    let limit = i64::from(limit);

    let start = (i64::from(origin) - pad).max(0);
    let extent = (i64::from(size) + 2 * pad).min(limit - start);

    // `start` may exceed the frame for boxes lying outside it; the extent is
    // then non-positive and the box is empty.
    let start = start.min(i64::from(i32::MAX)) as i32;
    let extent = extent.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
    (start, extent)
}

/// Pads and clamps `bbox`, returning `None` when nothing drawable remains.
pub fn padded_region(
    bbox: &BoundingBox,
    padding: f64,
    frame_w: u32,
    frame_h: u32,
) -> Option<BoundingBox> {
    let padded = apply_padding(bbox, padding, frame_w, frame_h);
    (!padded.is_empty()).then_some(padded)
}
