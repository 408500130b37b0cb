pub mod font;
pub mod legacy;
pub mod template_recognizer;
pub mod templates;
pub mod text_filter;

pub use legacy::{EngineRecognizer, OcrEngine, TesseractCli};
pub use template_recognizer::{LineRecognizer, RecognizerSettings, TemplateRecognizer};
pub use templates::{CharacterTemplate, GlyphScale, TemplateEntry, TemplateLibrary};
pub use text_filter::is_garbage_text;
