use image::RgbImage;
use std::sync::Arc;
use std::time::Duration;

/// A decoded video frame, shared cheaply between the session and its consumers.
#[derive(Clone, Debug)]
pub struct Frame {
    index: u64,
    timestamp: Option<Duration>,
    image: Arc<RgbImage>,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self {
            index,
            timestamp: None,
            image: Arc::new(image),
        }
    }

    pub fn with_timestamp(mut self, timestamp: Duration) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> Option<Duration> {
        self.timestamp
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
