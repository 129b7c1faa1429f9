use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Frame source for the anonymization pipeline.
///
/// Implementations handle container and codec details; the pipeline only
/// sees packed RGB `Frame`s and the source's `VideoMetadata`.
pub trait VideoReader: Send {
    /// Opens the source and returns its properties.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Lazily yields frames in decode order. The iterator ending is the end
    /// of the stream; an `Err` item is a decode failure.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases decoder and file handles.
    fn close(&mut self);
}
