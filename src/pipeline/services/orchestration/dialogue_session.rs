use super::dialogue_assembler::DialogueAssembler;
use crate::common::frame::Frame;
use crate::error::AppError;
use crate::intake::frame::FrameSource;
use crate::pipeline::services::image::analysis::{ScreenLayoutDetector, TextboxClassifier};
use crate::pipeline::types::{ScreenLayout, Transcript};
use image::RgbImage;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

const PROGRESS_INTERVAL: u64 = 1000;

/// One recording processed start to finish. Frames go through strictly in order.
pub struct DialogueSession {
    id: Uuid,
    source: String,
    detector: ScreenLayoutDetector,
    classifier: TextboxClassifier,
    assembler: DialogueAssembler,
    probe_frames: usize,
}

impl DialogueSession {
    pub fn new(source: impl Into<String>, assembler: DialogueAssembler) -> Self {
        let geometry = assembler.profile().geometry.clone();
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            detector: ScreenLayoutDetector::default().with_geometry(geometry.clone()),
            classifier: TextboxClassifier::new(geometry),
            assembler,
            probe_frames: 5,
        }
    }

    pub fn with_detector(mut self, detector: ScreenLayoutDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Number of leading frames inspected to find the screen layout.
    pub fn with_probe_frames(mut self, probe_frames: usize) -> Self {
        self.probe_frames = probe_frames.max(1);
        self
    }

    pub fn run<S: FrameSource>(mut self, mut frames: S) -> Result<Transcript, AppError> {
        let span = info_span!("session", id = %self.id, source = %self.source);
        let _guard = span.enter();
        info!("Starting dialogue extraction");

        let mut probe = Vec::with_capacity(self.probe_frames);
        let mut exhausted = false;
        while probe.len() < self.probe_frames {
            match frames.next() {
                Some(Ok(frame)) => probe.push(frame),
                Some(Err(e)) => {
                    warn!("Frame source failed, ending run: {}", e);
                    exhausted = true;
                    break;
                }
                None => {
                    exhausted = true;
                    break;
                }
            }
        }
        if probe.is_empty() {
            info!("No frames to process");
            return Ok(Transcript::new(self.source.clone()));
        }
        let images: Vec<&RgbImage> = probe.iter().map(Frame::image).collect();
        let layout = self.detector.detect(&images)?;
        info!(
            "Top screen on the {} at ({}, {}), {}x{}, scale {:.3}",
            layout.position,
            layout.origin.0,
            layout.origin.1,
            layout.width,
            layout.height,
            layout.scale
        );

        let mut run = RunState {
            layout,
            last_index: None,
            processed: 0,
            transcript: Transcript::new(self.source.clone()),
        };
        let mut stopped = false;
        for frame in probe {
            if !self.step(&frame, &mut run)? {
                stopped = true;
                break;
            }
        }
        if !stopped && !exhausted {
            for item in frames {
                match item {
                    Ok(frame) => {
                        if !self.step(&frame, &mut run)? {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Frame source failed, ending run: {}", e);
                        break;
                    }
                }
            }
        }

        self.assembler.discard_open_box();
        info!(
            "Processed {} frames, {} entries. {}",
            run.processed,
            run.transcript.len(),
            run.transcript.summary()
        );
        Ok(run.transcript)
    }

    /// Classifies one frame and feeds it to the assembler. Returns false when
    /// the run cannot continue.
    fn step(&mut self, frame: &Frame, run: &mut RunState) -> Result<bool, AppError> {
        if let Some(last) = run.last_index {
            if frame.index() <= last {
                warn!(
                    "Frame {} arrived after frame {}, skipping",
                    frame.index(),
                    last
                );
                return Ok(true);
            }
        }
        run.last_index = Some(frame.index());

        let (width, height) = frame.dimensions();
        if !run.layout.matches_frame(width, height) {
            info!(
                "Frame {}: resolution changed to {}x{}, detecting layout again",
                frame.index(),
                width,
                height
            );
            match self.detector.detect(&[frame.image()]) {
                Ok(layout) => run.layout = layout,
                Err(e) => {
                    warn!("Ending run: {}", e);
                    return Ok(false);
                }
            }
        }

        let classification = self.classifier.classify(frame, &run.layout);
        debug!("Frame {}: {}", frame.index(), classification.state);
        if let Some(entry) = self
            .assembler
            .process(frame, &run.layout, classification.state)?
        {
            info!("{}", entry.lines().collect::<Vec<_>>().join(" / "));
            run.transcript.push(entry);
        }

        run.processed += 1;
        if run.processed % PROGRESS_INTERVAL == 0 {
            info!(
                "Processed {} frames, {} characters so far",
                run.processed,
                run.transcript.total_characters()
            );
        }
        Ok(true)
    }
}

struct RunState {
    layout: ScreenLayout,
    last_index: Option<u64>,
    processed: u64,
    transcript: Transcript,
}
