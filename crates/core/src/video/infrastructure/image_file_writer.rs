use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Writes frames as image files using the `image` crate.
#[derive(Default)]
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

/// Target size for a frame capped at `max_width`, never below 1×1.
fn scaled_size(width: u32, height: u32, max_width: Option<u32>) -> Option<(u32, u32)> {
    let max_width = max_width?.max(1);
    if width <= max_width {
        return None;
    }
    let h = (height as u64 * max_width as u64 / width as u64).max(1) as u32;
    Some((max_width, h))
}

impl ImageWriter for ImageFileWriter {
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        max_width: Option<u32>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(format!("expected RGB frame, got {} channels", frame.channels()).into());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("frame data does not match its dimensions")?;

        let img = match scaled_size(frame.width(), frame.height(), max_width) {
            Some((w, h)) => {
                image::imageops::resize(&img, w, h, image::imageops::FilterType::Triangle)
            }
            None => img,
        };

        img.save(path)?;
        Ok(())
    }
}
