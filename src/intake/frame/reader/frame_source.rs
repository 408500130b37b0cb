use crate::{common::frame::Frame, error::SourceError};

/// Ordered stream of decoded frames. A session pulls one frame at a time and
/// treats `None` or an `Err` as the end of the recording.
pub trait FrameSource: Iterator<Item = Result<Frame, SourceError>> + Send {}

impl<T> FrameSource for T where T: Iterator<Item = Result<Frame, SourceError>> + Send {}

/// Part of a recording to process, in seconds from its start.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameWindow {
    pub start_seconds: Option<f64>,
    pub end_seconds: Option<f64>,
}

impl FrameWindow {
    pub fn new(start_seconds: Option<f64>, end_seconds: Option<f64>) -> Self {
        Self {
            start_seconds,
            end_seconds,
        }
    }

    /// Index of the first frame inside the window.
    pub fn first_frame(&self, fps: f64) -> usize {
        self.start_seconds
            .map(|s| (s * fps).ceil().max(0.0) as usize)
            .unwrap_or(0)
    }

    /// Index one past the last frame inside the window, capped at `total`.
    pub fn end_frame(&self, fps: f64, total: usize) -> usize {
        self.end_seconds
            .map(|s| ((s * fps).ceil().max(0.0) as usize).min(total))
            .unwrap_or(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_bounds_follow_frame_rate() {
        let window = FrameWindow::new(Some(1.5), Some(3.0));
        assert_eq!(window.first_frame(60.0), 90);
        assert_eq!(window.end_frame(60.0, 1000), 180);
        assert_eq!(window.end_frame(60.0, 100), 100);
        assert_eq!(FrameWindow::default().first_frame(30.0), 0);
        assert_eq!(FrameWindow::default().end_frame(30.0, 42), 42);
    }
}
