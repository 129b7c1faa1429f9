use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::infrastructure::detector_factory::create_detector;
use crate::detection::infrastructure::model_resolver::ProgressFn;
use crate::shared::constants::OUTPUT_CODEC;
use crate::shared::error::PipelineError;
use crate::video::domain::frame_preview::{FramePreview, PreviewAction};
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::frame_anonymizer::FrameAnonymizer;
use super::output_filename::generate_output_path;
use super::pipeline_logger::{LogPipelineLogger, PipelineLogger};
use super::processing_config::{FrameErrorPolicy, ProcessingConfig};

/// Lifecycle of one [`AnonymizeVideoUseCase`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Created,
    /// Source opened, sink not yet.
    Opened,
    Running,
    Completed,
    /// Stopped early by cancellation or an error.
    Aborted,
    /// Every collaborator released. Terminal.
    Closed,
}

/// Outcome of a successful run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub frames_processed: usize,
    pub frames_skipped: usize,
    pub cancelled: bool,
    pub output_path: PathBuf,
    /// `Completed`, or `Aborted` when the run was cancelled.
    pub outcome: PipelineState,
}

#[derive(Default)]
struct FrameCounts {
    processed: usize,
    skipped: usize,
    cancelled: bool,
}

/// Anonymizes a whole video: source → frame anonymizer → sink.
///
/// Single-use: the source, sink, preview and detector are released exactly
/// once when `execute` returns, whatever the exit path, and a second call
/// fails with [`PipelineError::AlreadyExecuted`].
pub struct AnonymizeVideoUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    anonymizer: FrameAnonymizer,
    preview: Option<Box<dyn FramePreview>>,
    logger: Box<dyn PipelineLogger>,
    config: ProcessingConfig,
    cancelled: Arc<AtomicBool>,
    state: PipelineState,
    source_opened: bool,
    sink_opened: bool,
}

impl AnonymizeVideoUseCase {
    /// Wires the pipeline around an already built `detector`.
    ///
    /// The detector is used as given: `config.detector()` and
    /// `config.detector_options()` are not consulted. Use
    /// [`from_config`](Self::from_config) to build the detector the config
    /// names.
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        detector: Box<dyn FaceDetector>,
        config: ProcessingConfig,
    ) -> Self {
        let anonymizer = FrameAnonymizer::new(detector, config.method(), config.padding());
        Self {
            reader,
            writer,
            anonymizer,
            preview: None,
            logger: Box::new(LogPipelineLogger::new(config.progress_interval())),
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
            state: PipelineState::Created,
            source_opened: false,
            sink_opened: false,
        }
    }

    /// Builds the detector named by `config` and wires the pipeline around
    /// it. `progress` receives model download progress.
    pub fn from_config(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        config: ProcessingConfig,
        progress: Option<ProgressFn>,
    ) -> Result<Self, PipelineError> {
        let detector = create_detector(config.detector(), config.detector_options(), progress)?;
        Ok(Self::new(reader, writer, detector, config))
    }

    pub fn with_preview(mut self, preview: Box<dyn FramePreview>) -> Self {
        self.preview = Some(preview);
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Shares an existing cancellation flag, e.g. one set by a signal handler.
    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Setting the returned flag stops the run before the next frame.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Runs the pipeline. With no `output`, the file name is generated from
    /// the input name, method, padding and the current time.
    pub fn execute(
        &mut self,
        input: &Path,
        output: Option<&Path>,
    ) -> Result<RunSummary, PipelineError> {
        if self.state != PipelineState::Created {
            return Err(PipelineError::AlreadyExecuted);
        }

        let started = Instant::now();
        let result = self.run(input, output);
        if result.is_err() {
            self.state = PipelineState::Aborted;
        }
        let finalized = self.release_all();

        let summary = match (result, finalized) {
            (Err(e), Err(close_err)) => {
                log::warn!("Output not finalized after failure: {close_err}");
                return Err(e);
            }
            (Err(e), Ok(())) => return Err(e),
            (Ok(summary), Err(close_err)) => {
                return Err(PipelineError::SinkWrite {
                    frame_index: summary.frames_processed,
                    reason: format!("finalizing output: {close_err}"),
                });
            }
            (Ok(summary), Ok(())) => summary,
        };

        let verb = if summary.cancelled { "Cancelled after" } else { "Anonymized" };
        self.logger.info(&format!(
            "{verb} {} frames in {:.1}s -> {}",
            summary.frames_processed,
            started.elapsed().as_secs_f64(),
            summary.output_path.display()
        ));
        self.logger.summary();
        Ok(summary)
    }

    fn run(&mut self, input: &Path, output: Option<&Path>) -> Result<RunSummary, PipelineError> {
        self.source_opened = true;
        let metadata = self
            .reader
            .open(input)
            .map_err(|e| PipelineError::SourceOpen {
                path: input.to_path_buf(),
                reason: e.to_string(),
            })?;
        self.state = PipelineState::Opened;

        let output_path = match output {
            Some(path) => path.to_path_buf(),
            None => generate_output_path(
                input,
                self.config.method().name(),
                self.config.padding(),
                self.config.output_dir(),
            ),
        };

        self.sink_opened = true;
        self.writer
            .open(&output_path, &metadata.with_codec(OUTPUT_CODEC))
            .map_err(|e| PipelineError::SinkOpen {
                path: output_path.clone(),
                reason: e.to_string(),
            })?;
        self.state = PipelineState::Running;

        self.logger.info(&format!(
            "Anonymizing {} ({}x{} @ {:.2} fps, {} frames) with {} padding {}",
            input.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames,
            self.config.method(),
            self.config.padding()
        ));

        let counts = self.process_frames(metadata.total_frames)?;
        let outcome = if counts.cancelled {
            PipelineState::Aborted
        } else {
            PipelineState::Completed
        };
        self.state = outcome;

        Ok(RunSummary {
            frames_processed: counts.processed,
            frames_skipped: counts.skipped,
            cancelled: counts.cancelled,
            output_path,
            outcome,
        })
    }

    fn process_frames(&mut self, total: usize) -> Result<FrameCounts, PipelineError> {
        let Self {
            reader,
            writer,
            anonymizer,
            preview,
            logger,
            config,
            cancelled,
            ..
        } = self;
        let policy = config.error_policy();
        let mut preview_enabled = preview.is_some();
        let mut counts = FrameCounts::default();
        let mut frames = reader.frames();

        loop {
            if cancelled.load(Ordering::Relaxed) {
                counts.cancelled = true;
                break;
            }

            let read_start = Instant::now();
            let Some(next) = frames.next() else {
                break;
            };
            let position = counts.processed + counts.skipped;
            let mut frame = next.map_err(|e| PipelineError::SourceRead {
                frame_index: position,
                reason: e.to_string(),
            })?;
            logger.timing("read", elapsed_ms(read_start));

            let anonymize_start = Instant::now();
            let anonymized = anonymizer.process(&mut frame).map(|_| ());
            if let Err(e) = anonymized {
                match policy {
                    FrameErrorPolicy::Abort => {
                        return Err(PipelineError::Processing {
                            frame_index: frame.index(),
                            reason: e.to_string(),
                        });
                    }
                    FrameErrorPolicy::Skip => {
                        log::warn!("Skipping frame {}: {e}", frame.index());
                        counts.skipped += 1;
                        logger.progress(position + 1, total);
                        continue;
                    }
                }
            }
            logger.timing("anonymize", elapsed_ms(anonymize_start));
            logger.metric("faces", anonymizer.last_face_count() as f64);
            log::debug!(
                "Frame {}: {} faces anonymized",
                frame.index(),
                anonymizer.last_face_count()
            );

            let mut stop_requested = false;
            if let Some(view) = preview.as_mut().filter(|_| preview_enabled) {
                match view.show(&frame) {
                    Ok(PreviewAction::Continue) => {}
                    Ok(PreviewAction::Stop) => stop_requested = true,
                    Err(e) => {
                        log::warn!("Preview failed, disabling it: {e}");
                        preview_enabled = false;
                    }
                }
            }

            let write_start = Instant::now();
            writer
                .write(&frame)
                .map_err(|e| PipelineError::SinkWrite {
                    frame_index: frame.index(),
                    reason: e.to_string(),
                })?;
            logger.timing("write", elapsed_ms(write_start));

            counts.processed += 1;
            logger.progress(position + 1, total);

            if stop_requested {
                log::info!("Preview requested stop at frame {}", frame.index());
                counts.cancelled = true;
                break;
            }
        }

        Ok(counts)
    }

    /// Closes whatever was opened and frees the detector. Only the sink's
    /// finalization can fail.
    fn release_all(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.source_opened {
            self.reader.close();
        }
        let finalized = if self.sink_opened {
            self.writer.close()
        } else {
            Ok(())
        };
        if let Some(preview) = self.preview.as_mut() {
            preview.close();
        }
        self.anonymizer.release();
        self.state = PipelineState::Closed;
        finalized
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
