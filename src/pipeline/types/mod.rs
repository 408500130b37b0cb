mod dialogue_entry;
mod recognized_line;
mod screen_layout;
mod textbox_state;
mod transcript;

pub use dialogue_entry::DialogueEntry;
pub use recognized_line::{RecognizedGlyph, RecognizedLine, UNKNOWN_GLYPH};
pub use screen_layout::{ScreenLayout, ScreenPosition, DS_HEIGHT, DS_WIDTH};
pub use textbox_state::TextboxState;
pub use transcript::{Transcript, CHARACTERS_PER_SECOND};
