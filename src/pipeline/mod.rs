pub mod services;
pub mod types;

pub use services::{DialogueAssembler, DialogueSession};
pub use types::{DialogueEntry, ScreenLayout, TextboxState, Transcript};
