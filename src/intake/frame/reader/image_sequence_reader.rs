use super::frame_source::FrameWindow;
use crate::{common::frame::Frame, error::SourceError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const FRAME_EXTENSIONS: [&str; 4] = ["png", "bmp", "jpg", "jpeg"];

/// Reads a directory of extracted video frames in file name order.
pub struct ImageSequenceReader {
    directory: PathBuf,
    paths: Vec<PathBuf>,
    fps: f64,
    position: usize,
    end: usize,
}

impl ImageSequenceReader {
    pub fn open(directory: &Path) -> Result<Self, SourceError> {
        if !directory.is_dir() {
            return Err(SourceError::NotFound(directory.to_path_buf()));
        }
        let mut paths: Vec<PathBuf> = std::fs::read_dir(directory)
            .map_err(|e| SourceError::ReadDirectory(e, directory.to_path_buf()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| {
                        FRAME_EXTENSIONS
                            .iter()
                            .any(|known| ext.eq_ignore_ascii_case(known))
                    })
            })
            .collect();
        if paths.is_empty() {
            return Err(SourceError::Empty(directory.to_path_buf()));
        }
        paths.sort();
        info!("Found {} frames in {}", paths.len(), directory.display());
        let end = paths.len();
        Ok(Self {
            directory: directory.to_path_buf(),
            paths,
            fps: 60.0,
            position: 0,
            end,
        })
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    /// Restricts reading to the frames inside `window`.
    pub fn with_window(mut self, window: FrameWindow) -> Self {
        self.position = window.first_frame(self.fps).min(self.paths.len());
        self.end = window.end_frame(self.fps, self.paths.len());
        debug!(
            "Frame window {}..{} of {}",
            self.position,
            self.end,
            self.paths.len()
        );
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Frames left to read.
    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.position)
    }
}

impl Iterator for ImageSequenceReader {
    type Item = Result<Frame, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.end {
            return None;
        }
        let index = self.position;
        self.position += 1;
        let path = &self.paths[index];
        let decoded = image::open(path)
            .map(|img| img.to_rgb8())
            .map_err(|e| SourceError::Decode(e, path.clone()));
        Some(decoded.map(|image| {
            Frame::new(index as u64, image)
                .with_timestamp(Duration::from_secs_f64(index as f64 / self.fps))
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_frames(dir: &Path, count: u8) {
        for i in 0..count {
            RgbImage::from_pixel(8, 6, Rgb([i, i, i]))
                .save(dir.join(format!("frame_{:04}.png", i)))
                .unwrap();
        }
    }

    #[test]
    fn frames_are_read_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 5);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let frames: Vec<Frame> = ImageSequenceReader::open(dir.path())
            .unwrap()
            .with_fps(2.0)
            .map(Result::unwrap)
            .collect();
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[3].index(), 3);
        assert_eq!(frames[3].image().get_pixel(0, 0).0, [3, 3, 3]);
        assert_eq!(frames[3].timestamp(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn window_limits_frames() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 10);
        let reader = ImageSequenceReader::open(dir.path())
            .unwrap()
            .with_fps(2.0)
            .with_window(FrameWindow::new(Some(1.0), Some(3.0)));
        assert_eq!(reader.remaining(), 4);
        let indices: Vec<u64> = reader.map(|f| f.unwrap().index()).collect();
        assert_eq!(indices, vec![2, 3, 4, 5]);
    }

    #[test]
    fn undecodable_frame_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("frame_0000.png"), b"not a png").unwrap();
        let mut reader = ImageSequenceReader::open(dir.path()).unwrap();
        assert!(matches!(reader.next(), Some(Err(SourceError::Decode(..)))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn missing_or_empty_directory_fails() {
        assert!(matches!(
            ImageSequenceReader::open(Path::new("/nonexistent/frames")),
            Err(SourceError::NotFound(_))
        ));
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ImageSequenceReader::open(dir.path()),
            Err(SourceError::Empty(_))
        ));
    }
}
