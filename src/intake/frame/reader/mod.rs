pub mod frame_source;
pub mod image_sequence_reader;

pub use frame_source::{FrameSource, FrameWindow};
pub use image_sequence_reader::ImageSequenceReader;
