pub mod config;
pub mod core;
pub mod screen_layout_detector;
pub mod text_capture;
pub mod textbox_classifier;

pub use config::{ClassifierThresholds, GameProfile, TextboxGeometry};
pub use self::core::{is_region_white, mean_luma, ImageRegion, WhitenessCheck};
pub use screen_layout_detector::ScreenLayoutDetector;
pub use text_capture::{text_line, TextCapture};
pub use textbox_classifier::{
    decide, Classification, StripAnomaly, StripReadings, TextboxClassifier,
};
