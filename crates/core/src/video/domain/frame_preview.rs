use crate::shared::frame::Frame;

/// What the pipeline should do after a preview has shown a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewAction {
    Continue,
    /// The viewer asked to end the run early.
    Stop,
}

/// Optional live view of anonymized frames.
///
/// Receives every frame after it has been anonymized, before it is written.
pub trait FramePreview: Send {
    fn show(&mut self, frame: &Frame) -> Result<PreviewAction, Box<dyn std::error::Error>>;

    fn close(&mut self);
}
