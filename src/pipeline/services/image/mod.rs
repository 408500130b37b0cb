pub mod analysis; // Screen layout, textbox strips and text region capture

pub use analysis::{GameProfile, ScreenLayoutDetector, TextCapture, TextboxClassifier};
