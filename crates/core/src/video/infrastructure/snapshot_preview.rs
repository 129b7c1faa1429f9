use std::path::PathBuf;

use crate::shared::frame::Frame;
use crate::video::domain::frame_preview::{FramePreview, PreviewAction};
use crate::video::domain::image_writer::ImageWriter;

/// Preview that saves every `every_n`-th anonymized frame as a PNG.
///
/// Files are named `frame_{index:06}.png` inside `dir`. Useful for spot
/// checking a long run without a display.
pub struct SnapshotPreview {
    writer: Box<dyn ImageWriter>,
    dir: PathBuf,
    every_n: usize,
    max_width: Option<u32>,
    written: usize,
}

impl SnapshotPreview {
    pub fn new(writer: Box<dyn ImageWriter>, dir: PathBuf, every_n: usize) -> Self {
        Self {
            writer,
            dir,
            every_n: every_n.max(1),
            max_width: None,
            written: 0,
        }
    }

    /// Downscales snapshots wider than `max_width`.
    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = Some(max_width);
        self
    }

    pub fn snapshots_written(&self) -> usize {
        self.written
    }
}

impl FramePreview for SnapshotPreview {
    fn show(&mut self, frame: &Frame) -> Result<PreviewAction, Box<dyn std::error::Error>> {
        if frame.index() % self.every_n == 0 {
            let path = self.dir.join(format!("frame_{:06}.png", frame.index()));
            self.writer.write(&path, frame, self.max_width)?;
            self.written += 1;
        }
        Ok(PreviewAction::Continue)
    }

    fn close(&mut self) {
        if self.written > 0 {
            log::info!(
                "Saved {} preview snapshots to {}",
                self.written,
                self.dir.display()
            );
        }
    }
}
