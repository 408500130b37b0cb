pub mod reader;

pub use reader::{FrameSource, FrameWindow, ImageSequenceReader};
